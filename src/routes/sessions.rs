use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use axum_macros::debug_handler;
use log::debug;

use super::auth::TOKEN_COOKIE;
use crate::{
    actions,
    error::Error,
    model::{session::Token, user, user::PartialUser, AppState, Session},
};

#[debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(user): Json<PartialUser>,
) -> Result<Response, Error> {
    debug!("Got login request for user: {}", user.name);

    let database = state.database.lock().await;
    let id = actions::login(
        &database,
        &user.name,
        &user.password,
        state.config.max_iterations,
    )?;
    let session = database.start_session(id)?;

    debug!("Logged in user {} with session {}", id, session.id);
    Ok(logged_in(StatusCode::OK, id, session.token))
}

#[debug_handler]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Response, Error> {
    debug!("Logging out session: {}", session.id);

    let database = state.database.lock().await;
    database.delete_session(session.id)?;

    Ok((StatusCode::RESET_CONTENT, [(header::SET_COOKIE, expired_cookie())]).into_response())
}

/// The response to a successful register or login: the user id in the
/// body and the session token in a cookie.
pub(super) fn logged_in(status: StatusCode, id: user::Id, token: Token) -> Response {
    (status, [(header::SET_COOKIE, make_cookie(token))], id.to_string()).into_response()
}

pub(crate) fn make_cookie(token: Token) -> String {
    format!(
        // In production, the secure flag should be present
        "{}={}; HttpOnly; SameSite=Lax; Path=/;",
        TOKEN_COOKIE, token,
    )
}

/// Tells the browser to forget the session token.
pub(crate) fn expired_cookie() -> String {
    format!("{}=; Max-Age=0; HttpOnly; SameSite=Lax; Path=/;", TOKEN_COOKIE)
}
