use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use axum_macros::debug_handler;

use crate::{
    actions,
    error::Error,
    model::{AppState, Session},
};

#[debug_handler]
pub async fn follow(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode, Error> {
    let database = state.database.lock().await;
    actions::follow(&database, session.user_id, &name)?;
    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler]
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<StatusCode, Error> {
    let database = state.database.lock().await;
    actions::unfollow(&database, session.user_id, &name)?;
    Ok(StatusCode::NO_CONTENT)
}
