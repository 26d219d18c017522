use std::sync::Arc;

use axum::{
    extract::{Path, State, TypedHeader},
    headers::Cookie,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_macros::debug_handler;
use chrono::Utc;

use super::{context, render, status_of, viewer};
use crate::{
    feed,
    model::{post, user::FollowCounts, AppState},
};

/// Header of a user's page.
#[derive(serde::Serialize)]
struct Profile {
    name: String,
    counts: FollowCounts,
    /// Whether the viewer follows this user.
    followed: bool,
}

#[debug_handler]
pub async fn index(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Html<String>, StatusCode> {
    let viewer = viewer(&state, cookies.as_ref()).await?;

    let database = state.database.lock().await;
    let posts = feed::get_posts(&database, state.config.feed_limit, Utc::now())
        .map_err(status_of)?;
    drop(database);

    let mut context = context("Recent posts", viewer.as_ref());
    context.insert("posts", &posts);
    context.insert("compose", &viewer.is_some());
    render(&state.templates, "feed.html", &context)
}

#[debug_handler]
pub async fn user_page(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Html<String>, StatusCode> {
    let viewer = viewer(&state, cookies.as_ref()).await?;

    let database = state.database.lock().await;
    let user = database.find_user_by_name(&name).map_err(status_of)?;
    let counts = database.count_follows(user.id).map_err(status_of)?;
    let followed = match &viewer {
        Some(viewer) => database
            .is_following(viewer.user.id, user.id)
            .map_err(status_of)?,
        None => false,
    };
    let posts = feed::get_user_posts(&database, &user.name, state.config.feed_limit, Utc::now())
        .map_err(status_of)?;
    drop(database);

    let mut context = context(&format!("@{}", user.name), viewer.as_ref());
    context.insert(
        "profile",
        &Profile {
            name: user.name,
            counts,
            followed,
        },
    );
    context.insert("posts", &posts);
    render(&state.templates, "feed.html", &context)
}

#[debug_handler]
pub async fn user_likes(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Html<String>, StatusCode> {
    let viewer = viewer(&state, cookies.as_ref()).await?;

    let database = state.database.lock().await;
    let posts = feed::get_liked_posts(&database, &name, state.config.feed_limit, Utc::now())
        .map_err(status_of)?;
    drop(database);

    let mut context = context(&format!("Liked by @{}", name), viewer.as_ref());
    context.insert("posts", &posts);
    render(&state.templates, "feed.html", &context)
}

#[debug_handler]
pub async fn thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<post::Id>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Html<String>, StatusCode> {
    let viewer = viewer(&state, cookies.as_ref()).await?;

    let database = state.database.lock().await;
    let thread = feed::get_thread(&database, id, Utc::now()).map_err(status_of)?;
    drop(database);

    let heading = format!("Post by @{}", thread.post.username);
    let mut context = context(&heading, viewer.as_ref());
    context.insert("thread", &thread);
    render(&state.templates, "thread.html", &context)
}

#[debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Response, StatusCode> {
    account_page(&state, cookies.as_ref(), "Log in", "/login").await
}

#[debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Response, StatusCode> {
    account_page(&state, cookies.as_ref(), "Register", "/register").await
}

/// The login or register form. Logged in users go back to the feed.
async fn account_page(
    state: &AppState,
    cookies: Option<&TypedHeader<Cookie>>,
    heading: &str,
    action: &str,
) -> Result<Response, StatusCode> {
    if viewer(state, cookies).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut context = context(heading, None);
    context.insert("action", action);
    Ok(render(&state.templates, "account.html", &context)?.into_response())
}

#[debug_handler]
pub async fn compose(
    State(state): State<Arc<AppState>>,
    cookies: Option<TypedHeader<Cookie>>,
) -> Result<Response, StatusCode> {
    let Some(viewer) = viewer(&state, cookies.as_ref()).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let context = context("New post", Some(&viewer));
    Ok(render(&state.templates, "compose.html", &context)?.into_response())
}
