use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use tracing::{error, info, warn};

use board_types::api::{
    LoginRequest, LoginResponse, MessageResponse, RegisterRequest, RegisterResponse,
};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::password::{hash_password, verify_password};
use crate::state::{AppState, run_db};
use crate::token::AUTH_COOKIE;
use crate::validation::{RegistrationError, validate_registration};

/// POST /api/users
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&req.nickname, &req.password, &req.confirm_password)?;

    let nickname = req.nickname.clone();
    let password = req.password;
    let user_id = run_db(&state, move |db| {
        // Cheap pre-check; the UNIQUE constraint covers concurrent sign-ups.
        if db.get_user_by_nickname(&nickname)?.is_some() {
            return Ok(None);
        }
        let password_hash = hash_password(&password)?;
        db.create_user(&nickname, &password_hash)
    })
    .await?
    .ok_or(RegistrationError::DuplicateNickname)?;

    info!("Registered user {} ({})", req.nickname, user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "registration complete".into(),
            user_id,
        }),
    ))
}

/// POST /api/login — sets `authorization=Bearer <token>` on success.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let nickname = req.nickname.clone();
    let password = req.password;
    let user = run_db(&state, move |db| {
        let user = db.get_user_by_nickname(&nickname)?;
        Ok(user.filter(|u| verify_password(&password, &u.password)))
    })
    .await?
    .ok_or_else(|| {
        warn!("Failed login for nickname {:?}", req.nickname);
        ApiError::BadCredentials
    })?;

    let token = state.tokens.issue(user.id, &user.nickname).map_err(|e| {
        error!("{}", e);
        ApiError::Internal
    })?;

    let cookie = Cookie::build((AUTH_COOKIE, format!("Bearer {}", token)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    info!("User {} ({}) logged in", user.nickname, user.id);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "login successful".into(),
            user_id: user.id,
            nickname: user.nickname,
        }),
    ))
}

/// POST /api/logout — drops the session cookie. Tokens are stateless, so a
/// copied token stays valid until it expires.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");

    (jar.remove(cookie), Json(MessageResponse::new("logged out")))
}
