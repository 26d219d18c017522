use std::sync::Arc;

use axum::{
    extract::{State, TypedHeader},
    headers::Cookie,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::trace;

use crate::{
    auth::{self, token},
    model::{AppState, Session},
};

/// Name of the cookie that carries the session token.
pub const TOKEN_COOKIE: &str = "token";

/// Reject requests without a valid session cookie. On success the
/// [`Session`] is available to handlers as an `Extension`.
pub async fn authenticate<B>(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<Cookie>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Response {
    let session = match session_from_cookies(&state, cookies.as_ref()).await {
        Ok(Some(session)) => session,
        Ok(None) => return StatusCode::UNAUTHORIZED.into_response(),
        Err(status_code) => return status_code.into_response(),
    };

    trace!("Request authenticated as session {}", session.id);
    request.extensions_mut().insert(session);

    // Continue
    next.run(request).await
}

/// Resolve the session named by the request's cookies, if any.
pub async fn session_from_cookies(
    state: &AppState,
    cookies: Option<&TypedHeader<Cookie>>,
) -> Result<Option<Session>, StatusCode> {
    // Get token out of cookies
    let Some(TypedHeader(cookies)) = cookies else {
        trace!("No cookie header found");
        return Ok(None);
    };
    let Some(token) = cookies.get(TOKEN_COOKIE).and_then(token::parse_token) else {
        trace!("No valid token cookie found");
        return Ok(None);
    };

    let database = state.database.lock().await;
    match auth::verify_session(token, &database) {
        Ok(session) => Ok(Some(session)),
        Err(auth::Error::SessionNotFound) => Ok(None),
        Err(auth::Error::DatabaseError) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
