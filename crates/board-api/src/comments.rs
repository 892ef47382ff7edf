use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use board_types::api::{
    CommentMutationResponse, CreateCommentRequest, DataResponse, UpdateCommentRequest,
};
use board_types::models::Comment;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::ownership::{Resource, ensure_applied, ensure_owner, not_found};
use crate::rows;
use crate::state::{AppState, run_db};
use crate::validation::require_text;

/// GET /api/posts/{post_id}/comments — newest first.
pub async fn list_comments(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
) -> Result<Json<DataResponse<Vec<Comment>>>, ApiError> {
    let found = run_db(&state, move |db| db.list_comments(post_id))
        .await?
        .ok_or_else(|| not_found(Resource::Post))?;

    Ok(Json(DataResponse {
        data: found.into_iter().map(rows::comment).collect(),
    }))
}

/// POST /api/posts/{post_id}/comments
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(post_id): ApiPath<i64>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_text(&req.comment, "comment")?;

    let user_id = user.id;
    let comment_id = run_db(&state, move |db| db.create_comment(post_id, user_id, &req.comment))
        .await?
        .ok_or_else(|| not_found(Resource::Post))?;

    info!("Comment {} on post {} created by {}", comment_id, post_id, user.nickname);

    Ok((
        StatusCode::CREATED,
        Json(CommentMutationResponse {
            message: "comment created".into(),
            post_id,
            comment_id,
        }),
    ))
}

/// PUT /api/posts/{post_id}/comments/{comment_id} — owner only.
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((post_id, comment_id)): ApiPath<(i64, i64)>,
    body: Result<ApiJson<UpdateCommentRequest>, ApiError>,
) -> Result<Json<CommentMutationResponse>, ApiError> {
    let owner = run_db(&state, move |db| db.comment_owner(post_id, comment_id)).await?;
    ensure_owner(owner, user.id, Resource::Comment).inspect_err(|_| {
        warn!("User {} may not update comment {}", user.id, comment_id);
    })?;

    let ApiJson(req) = body?;
    require_text(&req.comment, "comment")?;

    let user_id = user.id;
    let outcome = run_db(&state, move |db| {
        db.update_comment(post_id, comment_id, user_id, &req.comment)
    })
    .await?;
    ensure_applied(outcome, Resource::Comment)?;

    info!("Comment {} updated by {}", comment_id, user.nickname);

    Ok(Json(CommentMutationResponse {
        message: "comment updated".into(),
        post_id,
        comment_id,
    }))
}

/// DELETE /api/posts/{post_id}/comments/{comment_id} — owner only.
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath((post_id, comment_id)): ApiPath<(i64, i64)>,
) -> Result<Json<CommentMutationResponse>, ApiError> {
    let owner = run_db(&state, move |db| db.comment_owner(post_id, comment_id)).await?;
    ensure_owner(owner, user.id, Resource::Comment).inspect_err(|_| {
        warn!("User {} may not delete comment {}", user.id, comment_id);
    })?;

    let user_id = user.id;
    let outcome = run_db(&state, move |db| db.delete_comment(post_id, comment_id, user_id)).await?;
    ensure_applied(outcome, Resource::Comment)?;

    info!("Comment {} deleted by {}", comment_id, user.nickname);

    Ok(Json(CommentMutationResponse {
        message: "comment deleted".into(),
        post_id,
        comment_id,
    }))
}
