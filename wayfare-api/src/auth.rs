use axum::{extract::State, http::StatusCode, routing::{get, post}, Extension, Router};
use serde::{Deserialize, Serialize};
use wayfare_core::identity::{Role, User, UserProfile};
use wayfare_core::CoreError;

use crate::extract::Json;
use crate::{
    error::AppError,
    middleware::{issue_token, Claims},
    password::{hash_password, verify_password},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: UserProfile,
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(me))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("name is required").into());
    }
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(CoreError::validation("a valid email is required").into());
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }

    let user = User::new(name.to_string(), email, hash_password(&req.password)?, Role::User);
    state.repos.users.create_user(&user).await?;
    let token = issue_token(&state.auth, &user)?;

    tracing::info!("User {} registered", user.id);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.profile(),
        }),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .repos
        .users
        .find_by_email(&req.email)
        .await?
        .filter(|user| verify_password(&req.password, user.password_hash.expose()))
        .ok_or_else(|| CoreError::Unauthorized("Invalid email or password".to_string()))?;

    let token = issue_token(&state.auth, &user)?;
    tracing::info!("User {} logged in", user.id);
    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}

/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserProfile>, AppError> {
    let user = state
        .repos
        .users
        .get_user(claims.user_id())
        .await?
        .ok_or_else(|| CoreError::not_found("User not found"))?;
    Ok(Json(user.profile()))
}
