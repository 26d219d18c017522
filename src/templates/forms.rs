use std::sync::Arc;

use axum::{
    extract::{Path, State, TypedHeader},
    headers::Cookie,
    http::header,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_macros::debug_handler;
use chrono::Utc;
use log::debug;

use super::{context, error_page, render_with_status, status_of, viewer};
use crate::{
    actions,
    error::Error,
    model::{post, user::PartialUser, AppState, Session},
    routes::{
        register::register_with_session,
        sessions::{expired_cookie, make_cookie},
    },
};

#[derive(Debug, serde::Deserialize)]
pub struct PostForm {
    pub body: String,
    /// Set when replying.
    pub parent: Option<post::Id>,
}

#[debug_handler]
pub async fn login(State(state): State<Arc<AppState>>, Form(user): Form<PartialUser>) -> Response {
    debug!("Got login form for user: {}", user.name);

    let database = state.database.lock().await;
    let result = actions::login(
        &database,
        &user.name,
        &user.password,
        state.config.max_iterations,
    )
    .and_then(|id| database.start_session(id));
    drop(database);

    match result {
        Ok(session) => logged_in(session),
        Err(err) => account_error(&state, "Log in", "/login", &user, err),
    }
}

#[debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(user): Form<PartialUser>,
) -> Response {
    debug!("Got register form for user: {}", user.name);

    let database = state.database.lock().await;
    let result = register_with_session(&database, &user, state.config.max_iterations);
    drop(database);

    match result {
        Ok(session) => logged_in(session),
        Err(err) => account_error(&state, "Register", "/register", &user, err),
    }
}

fn logged_in(session: Session) -> Response {
    (
        [(header::SET_COOKIE, make_cookie(session.token))],
        Redirect::to("/"),
    )
        .into_response()
}

/// Show the account form again with what went wrong. The name is kept,
/// the password is not.
fn account_error(
    state: &AppState,
    heading: &str,
    action: &str,
    user: &PartialUser,
    err: Error,
) -> Response {
    let mut context = context(heading, None);
    context.insert("action", action);
    context.insert("name", &user.name);
    context.insert("error", &err.public_message());

    render_with_status(&state.templates, "account.html", &context, err.status())
}

#[debug_handler]
pub async fn signout(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Response {
    let forget = [(header::SET_COOKIE, expired_cookie())];

    match viewer(&state, cookies.as_ref()).await {
        Ok(Some(viewer)) => {
            let database = state.database.lock().await;
            if let Err(err) = database.delete_session(viewer.session.id) {
                return (forget, status_of(err)).into_response();
            }
        }
        Ok(None) => {}
        Err(status) => return (forget, status).into_response(),
    }

    (forget, Redirect::to("/")).into_response()
}

#[debug_handler]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<Cookie>>,
    Form(form): Form<PostForm>,
) -> Response {
    let viewer = match viewer(&state, cookies.as_ref()).await {
        Ok(Some(viewer)) => viewer,
        Ok(None) => return Redirect::to("/login").into_response(),
        Err(status) => return status.into_response(),
    };

    let database = state.database.lock().await;
    let result = match form.parent {
        Some(parent) => actions::reply(&database, viewer.user.id, parent, &form.body, Utc::now()),
        None => actions::post(&database, viewer.user.id, &form.body, Utc::now()),
    };
    drop(database);

    match (result, form.parent) {
        (Ok(_), Some(parent)) => Redirect::to(&format!("/post/{}", parent)).into_response(),
        (Ok(_), None) => Redirect::to("/").into_response(),
        (Err(err), _) => {
            let mut context = context("New post", Some(&viewer));
            context.insert("body", &form.body);
            context.insert("parent", &form.parent);
            context.insert("error", &err.public_message());

            render_with_status(&state.templates, "compose.html", &context, err.status())
        }
    }
}

#[debug_handler]
pub async fn like(
    State(state): State<Arc<AppState>>,
    Path(id): Path<post::Id>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Response {
    let viewer = match viewer(&state, cookies.as_ref()).await {
        Ok(Some(viewer)) => viewer,
        Ok(None) => return Redirect::to("/login").into_response(),
        Err(status) => return status.into_response(),
    };

    let database = state.database.lock().await;
    let result = actions::toggle_like(&database, viewer.user.id, id);
    drop(database);

    match result {
        Ok(_) => Redirect::to(&format!("/post/{}", id)).into_response(),
        Err(err) => error_page(&state.templates, Some(&viewer), err),
    }
}

#[debug_handler]
pub async fn follow(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Response {
    change_follow(&state, &name, cookies.as_ref(), true).await
}

#[debug_handler]
pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Response {
    change_follow(&state, &name, cookies.as_ref(), false).await
}

async fn change_follow(
    state: &AppState,
    name: &str,
    cookies: Option<&TypedHeader<Cookie>>,
    follow: bool,
) -> Response {
    let viewer = match viewer(state, cookies).await {
        Ok(Some(viewer)) => viewer,
        Ok(None) => return Redirect::to("/login").into_response(),
        Err(status) => return status.into_response(),
    };

    let database = state.database.lock().await;
    let result = if follow {
        actions::follow(&database, viewer.user.id, name)
    } else {
        actions::unfollow(&database, viewer.user.id, name)
    };
    drop(database);

    match result {
        Ok(()) => Redirect::to(&format!("/user/{}", name)).into_response(),
        Err(err) => error_page(&state.templates, Some(&viewer), err),
    }
}
