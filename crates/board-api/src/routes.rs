use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::state::{AppState, run_db};
use crate::{auth, comments, posts};

/// Every endpoint under `/api`, plus `/health`. Cross-cutting layers (CORS,
/// tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/users", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{post_id}", get(posts::get_post))
        .route("/posts/{post_id}/comments", get(comments::list_comments));

    let protected_routes = Router::new()
        .route("/posts", post(posts::create_post))
        .route("/posts/{post_id}", put(posts::update_post).delete(posts::delete_post))
        .route("/posts/{post_id}/comments", post(comments::create_comment))
        .route(
            "/posts/{post_id}/comments/{comment_id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    run_db(&state, |db| db.ping()).await?;
    Ok(Json(json!({ "status": "ok" })))
}
