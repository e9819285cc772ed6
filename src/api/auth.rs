//! Account and session endpoints.

use axum::{extract::State, Extension, Json};

use super::{require, success, ApiResult};
use crate::auth::{self, SessionToken, MIN_PASSWORD_LEN};
use crate::errors::AppError;
use crate::models::{LoginRequest, RegisterRequest, SessionResponse, User};
use crate::AppState;

/// POST /api/auth/register - Create an account and sign in.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<SessionResponse> {
    require(&request.display_name, "Display name")?;
    if !request.email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password = request.password.clone();
    let password_hash = auth::blocking(move || auth::hash_password(&password)).await?;

    let user = state.repo.create_user(&request, &password_hash).await?;
    tracing::info!("Registered user {}", user.uid);

    issue_session(&state, user).await
}

/// POST /api/auth/login - Exchange credentials for a session.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<SessionResponse> {
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let (user, password_hash) = state
        .repo
        .find_credentials(&request.email)
        .await?
        .ok_or_else(invalid)?;

    let password = request.password;
    let valid = auth::blocking(move || auth::verify_password(&password, &password_hash)).await?;
    if !valid {
        return Err(invalid());
    }

    issue_session(&state, user).await
}

/// POST /api/auth/logout - Revoke the current session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> ApiResult<()> {
    state.repo.delete_session(&token.0).await?;
    success(())
}

/// GET /api/auth/me - The signed-in user.
pub async fn me(Extension(user): Extension<User>) -> ApiResult<User> {
    success(user)
}

async fn issue_session(state: &AppState, user: User) -> ApiResult<SessionResponse> {
    let (token, expires_at) = state
        .repo
        .create_session(&user.uid, state.config.session_ttl_hours)
        .await?;

    success(SessionResponse {
        token,
        expires_at,
        user,
    })
}
