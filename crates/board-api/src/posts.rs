use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use board_types::api::{CreatePostRequest, DataResponse, PostMutationResponse, UpdatePostRequest};
use board_types::models::{Post, PostSummary};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::ownership::{Resource, ensure_applied, ensure_owner, not_found};
use crate::rows;
use crate::state::{AppState, run_db};
use crate::validation::require_text;

/// POST /api/posts — the author is always the authenticated caller.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_text(&req.title, "title")?;
    require_text(&req.content, "content")?;

    let user_id = user.id;
    let post_id = run_db(&state, move |db| db.create_post(user_id, &req.title, &req.content)).await?;

    info!("Post {} created by {}", post_id, user.nickname);

    Ok((
        StatusCode::CREATED,
        Json(PostMutationResponse {
            message: "post created".into(),
            post_id,
        }),
    ))
}

/// GET /api/posts — newest first.
pub async fn list_posts(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Vec<PostSummary>>>, ApiError> {
    let found = run_db(&state, |db| db.list_posts()).await?;

    Ok(Json(DataResponse {
        data: found.into_iter().map(rows::post_summary).collect(),
    }))
}

/// GET /api/posts/{post_id}
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> Result<Json<DataResponse<Post>>, ApiError> {
    let row = run_db(&state, move |db| db.get_post(post_id))
        .await?
        .ok_or_else(|| not_found(Resource::Post))?;

    Ok(Json(DataResponse {
        data: rows::post(row),
    }))
}

/// PUT /api/posts/{post_id} — owner only.
pub async fn update_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(post_id): ApiPath<i64>,
    body: Result<ApiJson<UpdatePostRequest>, ApiError>,
) -> Result<Json<PostMutationResponse>, ApiError> {
    let owner = run_db(&state, move |db| db.post_owner(post_id)).await?;
    ensure_owner(owner, user.id, Resource::Post).inspect_err(|_| {
        warn!("User {} may not update post {}", user.id, post_id);
    })?;

    // Body problems only matter once the caller is known to own the post.
    let ApiJson(req) = body?;
    require_text(&req.title, "title")?;
    require_text(&req.content, "content")?;

    let user_id = user.id;
    let outcome =
        run_db(&state, move |db| db.update_post(post_id, user_id, &req.title, &req.content)).await?;
    ensure_applied(outcome, Resource::Post)?;

    info!("Post {} updated by {}", post_id, user.nickname);

    Ok(Json(PostMutationResponse {
        message: "post updated".into(),
        post_id,
    }))
}

/// DELETE /api/posts/{post_id} — owner only; comments go with it.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(post_id): ApiPath<i64>,
) -> Result<Json<PostMutationResponse>, ApiError> {
    let owner = run_db(&state, move |db| db.post_owner(post_id)).await?;
    ensure_owner(owner, user.id, Resource::Post).inspect_err(|_| {
        warn!("User {} may not delete post {}", user.id, post_id);
    })?;

    let user_id = user.id;
    let outcome = run_db(&state, move |db| db.delete_post(post_id, user_id)).await?;
    ensure_applied(outcome, Resource::Post)?;

    info!("Post {} deleted by {}", post_id, user.nickname);

    Ok(Json(PostMutationResponse {
        message: "post deleted".into(),
        post_id,
    }))
}
