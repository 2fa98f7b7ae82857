//! Auth routes for registration, login, logout and the current user

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::auth::models::{AuthUser, LoginRequest, MessageResponse, RegisterRequest, TokenResponse};
use crate::auth::password::PasswordService;
use crate::database::models::{NewUser, User};
use crate::error::{AppError, JsonBody};
use crate::server::AppState;

/// Validate a registration payload and hash its password.
pub(crate) fn new_user_from(
    request: RegisterRequest,
    passwords: &PasswordService,
) -> Result<NewUser, AppError> {
    let name = request.name.trim().to_string();
    let email = request.email.trim().to_lowercase();
    let username = request.username.trim().to_string();

    if name.is_empty() || username.is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest("invalid input".to_string()));
    }
    if !is_plausible_email(&email) {
        return Err(AppError::BadRequest("invalid email".to_string()));
    }

    let password_hash = passwords.hash(&request.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        AppError::Internal("failed to hash password".to_string())
    })?;

    Ok(NewUser {
        name,
        email,
        status: request.status,
        username,
        password_hash,
    })
}

pub(crate) fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    }
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if state
        .users
        .find_by_username(payload.username.trim())
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("username already exists".to_string()));
    }

    let new_user = new_user_from(payload, &state.passwords)?;
    let user = state.users.create(new_user).await?;

    tracing::info!("User registered: id={}, username={}", user.id, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest("invalid input".to_string()));
    }

    let user = state
        .users
        .find_by_username(username)
        .await?
        .filter(|user| state.passwords.verify(&payload.password, &user.password_hash));

    let Some(user) = user else {
        tracing::warn!("Failed login attempt for username={}", username);
        return Err(AppError::Unauthorized(
            "invalid username or password".to_string(),
        ));
    };

    let token = state.jwt_service.issue(&user.username).map_err(|e| {
        tracing::error!("Failed to issue token: {}", e);
        AppError::Internal("failed to generate token".to_string())
    })?;

    tracing::info!("User logged in: username={}", user.username);
    Ok(Json(TokenResponse { token }))
}

/// Revoke the token this request was authenticated with.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .revocations
        .revoke(auth_user.session.into_revocation())
        .await
        .map_err(|e| {
            tracing::error!("Failed to revoke token for {}: {}", auth_user.username, e);
            AppError::Internal("failed to logout".to_string())
        })?;

    tracing::info!("User logged out: username={}", auth_user.username);
    Ok(Json(MessageResponse::new("logged out successfully")))
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    state
        .users
        .find_by_username(&auth_user.username)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))
}
