use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{model::AppState, templates};

pub mod auth;
mod posts;
pub(crate) mod register;
pub(crate) mod sessions;
mod users;

pub fn router(state: Arc<AppState>) -> Router {
    let authenticated = middleware::from_fn_with_state(state.clone(), auth::authenticate);

    let api = Router::new()
        .route("/api/register", post(register::register))
        .route("/api/login", post(sessions::login))
        .route(
            "/api/logout",
            post(sessions::logout).route_layer(authenticated.clone()),
        )
        .route(
            "/api/posts",
            get(posts::get_posts)
                .merge(post(posts::create_post).route_layer(authenticated.clone())),
        )
        .route("/api/posts/:id", get(posts::get_thread))
        .route(
            "/api/posts/:id/replies",
            post(posts::create_reply).route_layer(authenticated.clone()),
        )
        .route(
            "/api/posts/:id/like",
            post(posts::like_post).route_layer(authenticated.clone()),
        )
        .route("/api/users/:name/posts", get(posts::get_user_posts))
        .route("/api/users/:name/likes", get(posts::get_liked_posts))
        .route(
            "/api/users/:name/follow",
            post(users::follow)
                .delete(users::unfollow)
                .route_layer(authenticated),
        );

    api.merge(templates::router(&state)).with_state(state)
}
