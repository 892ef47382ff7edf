use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::token::AUTH_COOKIE;

/// Identity resolved from the session cookie, read by protected handlers.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub nickname: String,
}

/// Extract and validate the session token from the `authorization` cookie.
/// Rejects with 401 before the handler runs; never touches the store.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie = jar
        .get(AUTH_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("login required".into()))?;

    let token = bearer_token(cookie.value())
        .ok_or_else(|| ApiError::Unauthorized("malformed authorization cookie".into()))?;

    let claims = state.tokens.verify(token).map_err(|e| {
        warn!("Rejected session token: {}", e);
        ApiError::Unauthorized("invalid or expired session".into())
    })?;

    debug!("Authenticated user {} ({})", claims.nickname, claims.sub);
    req.extensions_mut().insert(AuthUser {
        id: claims.sub,
        nickname: claims.nickname,
    });
    Ok(next.run(req).await)
}

/// `Bearer <token>`; tolerates a percent-encoded space from clients that
/// store the cookie without decoding it.
fn bearer_token(value: &str) -> Option<&str> {
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Bearer%20"))?
        .trim();
    (!token.is_empty()).then_some(token)
}
