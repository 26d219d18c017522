use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Json,
};
use axum_macros::debug_handler;
use log::debug;

use super::sessions::logged_in;
use crate::{
    actions,
    error::Result,
    model::{user::PartialUser, AppState, Database, Session},
};

/// Create an account and log straight into it.
#[debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(user): Json<PartialUser>,
) -> Result<Response> {
    debug!("Got register request for user: {}", user.name);

    let database = state.database.lock().await;
    let session = register_with_session(&database, &user, state.config.max_iterations)?;

    Ok(logged_in(StatusCode::CREATED, session.user_id, session.token))
}

/// Register `user` and start their first session. If the session can't be
/// started the account isn't kept either.
pub(crate) fn register_with_session(
    database: &Database,
    user: &PartialUser,
    max_iterations: u32,
) -> Result<Session> {
    database.atomically(|database| {
        let id = actions::register(database, &user.name, &user.password, max_iterations)?;
        database.start_session(id)
    })
}
