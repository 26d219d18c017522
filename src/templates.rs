use std::sync::Arc;

use axum::{
    extract::TypedHeader,
    headers::Cookie,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::error;
use tera::{Context, Tera};
use tower_http::services::ServeDir;

use crate::{
    error::Error,
    model::{AppState, Session, User},
    routes::auth::session_from_cookies,
};

mod forms;
mod pages;

pub fn load(pattern: &str) -> tera::Result<Tera> {
    Tera::new(pattern)
}

pub fn router(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(pages::index))
        .route("/login", get(pages::login).post(forms::login))
        .route("/register", get(pages::register).post(forms::register))
        .route("/signout", post(forms::signout))
        .route("/post", get(pages::compose).post(forms::create_post))
        .route("/post/:id", get(pages::thread))
        .route("/post/:id/like", post(forms::like))
        .route("/user/:name", get(pages::user_page))
        .route("/user/:name/likes", get(pages::user_likes))
        .route("/user/:name/follow", post(forms::follow))
        .route("/user/:name/unfollow", post(forms::unfollow))
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
}

/// The logged in user looking at a page.
struct Viewer {
    session: Session,
    user: User,
}

async fn viewer(
    state: &AppState,
    cookies: Option<&TypedHeader<Cookie>>,
) -> Result<Option<Viewer>, StatusCode> {
    let Some(session) = session_from_cookies(state, cookies).await? else {
        return Ok(None);
    };

    let database = state.database.lock().await;
    match database.find_user_by_id(session.user_id) {
        Ok(user) => Ok(Some(Viewer { session, user })),
        Err(Error::NotFound) => Ok(None),
        Err(err) => Err(status_of(err)),
    }
}

/// A context with the values every page uses.
fn context(heading: &str, viewer: Option<&Viewer>) -> Context {
    let mut context = Context::new();
    context.insert("heading", heading);
    context.insert("viewer", &viewer.map(|viewer| &viewer.user.name));
    context
}

fn status_of(err: Error) -> StatusCode {
    if let Error::Database(ref err) = err {
        error!("Database error while rendering page: {}", err);
    }
    err.status()
}

fn render(templates: &Tera, name: &str, context: &Context) -> Result<Html<String>, StatusCode> {
    templates.render(name, context).map(Html).map_err(|err| {
        error!("Failed to render template {}: {}", name, err);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Render `name` with `status`, falling back to the bare status if the
/// template fails.
fn render_with_status(
    templates: &Tera,
    name: &str,
    context: &Context,
    status: StatusCode,
) -> Response {
    match render(templates, name, context) {
        Ok(html) => (status, html).into_response(),
        Err(failed) => failed.into_response(),
    }
}

/// A page explaining why a request failed.
fn error_page(templates: &Tera, viewer: Option<&Viewer>, err: Error) -> Response {
    let status = err.status();
    let mut context = context(status.canonical_reason().unwrap_or("Error"), viewer);
    context.insert("error", &err.public_message());

    render_with_status(templates, "message.html", &context, status)
}
