use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use axum_macros::debug_handler;
use chrono::Utc;
use log::debug;

use crate::{
    actions,
    error::Error,
    feed::{self, FeedEntry, Thread},
    model::{post, post::SendPost, AppState, Session},
};

#[derive(Debug, serde::Deserialize)]
pub struct FeedQuery {
    /// Defaults to every post.
    pub limit: Option<i64>,
}

#[debug_handler]
pub async fn get_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<FeedEntry>>, Error> {
    let database = state.database.lock().await;
    let posts = feed::get_posts(&database, query.limit.unwrap_or(-1), Utc::now())?;
    Ok(Json(posts))
}

#[debug_handler]
pub async fn get_user_posts(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<FeedEntry>>, Error> {
    let database = state.database.lock().await;
    let posts = feed::get_user_posts(&database, &name, query.limit.unwrap_or(-1), Utc::now())?;
    Ok(Json(posts))
}

#[debug_handler]
pub async fn get_liked_posts(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<FeedEntry>>, Error> {
    let database = state.database.lock().await;
    let posts = feed::get_liked_posts(&database, &name, query.limit.unwrap_or(-1), Utc::now())?;
    Ok(Json(posts))
}

#[debug_handler]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(id): Path<post::Id>,
) -> Result<Json<Thread>, Error> {
    let database = state.database.lock().await;
    let thread = feed::get_thread(&database, id, Utc::now())?;
    Ok(Json(thread))
}

#[debug_handler]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(post): Json<SendPost>,
) -> Result<(StatusCode, String), Error> {
    let database = state.database.lock().await;
    let id = actions::post(&database, session.user_id, &post.body, Utc::now())?;

    debug!("User {} created post {}", session.user_id, id);
    Ok((StatusCode::CREATED, id.to_string()))
}

#[debug_handler]
pub async fn create_reply(
    State(state): State<Arc<AppState>>,
    Path(parent): Path<post::Id>,
    Extension(session): Extension<Session>,
    Json(post): Json<SendPost>,
) -> Result<(StatusCode, String), Error> {
    let database = state.database.lock().await;
    let id = actions::reply(&database, session.user_id, parent, &post.body, Utc::now())?;

    debug!("User {} replied to post {} with {}", session.user_id, parent, id);
    Ok((StatusCode::CREATED, id.to_string()))
}

/// Like the post, or take an earlier like back.
#[debug_handler]
pub async fn like_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<post::Id>,
    Extension(session): Extension<Session>,
) -> Result<Json<serde_json::Value>, Error> {
    let database = state.database.lock().await;
    let liked = actions::toggle_like(&database, session.user_id, id)?;
    Ok(Json(serde_json::json!({ "liked": liked })))
}
