//! User management endpoints (all behind the auth gate).

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::auth::models::RegisterRequest;
use crate::database::models::User;
use crate::error::{AppError, JsonBody, PathParam};
use crate::routes::auth::{is_plausible_email, new_user_from};
use crate::server::AppState;

/// Partial update; omitted or blank fields keep their stored value. The
/// username is accepted only when it matches the stored one.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn user_not_found() -> AppError {
    AppError::NotFound("user not found".to_string())
}

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = state.users.list().await?;
    tracing::info!("Users retrieved: count={}", users.len());
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<User>, AppError> {
    state
        .users
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(user_not_found)
}

pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let new_user = new_user_from(payload, &state.passwords)?;
    let user = state.users.create(new_user).await?;

    tracing::info!("User created: id={}, username={}", user.id, user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(user_not_found)?;

    if let Some(name) = provided(payload.name) {
        user.name = name;
    }
    if let Some(email) = provided(payload.email) {
        let email = email.to_lowercase();
        if !is_plausible_email(&email) {
            return Err(AppError::BadRequest("invalid email".to_string()));
        }
        user.email = email;
    }
    if let Some(status) = provided(payload.status) {
        user.status = Some(status);
    }
    // Tokens carry the username as their subject; it never changes.
    if provided(payload.username).is_some_and(|username| username != user.username) {
        return Err(AppError::BadRequest("username cannot be changed".to_string()));
    }
    if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
        user.password_hash = state.passwords.hash(&password).map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            AppError::Internal("failed to hash password".to_string())
        })?;
    }

    let updated = state
        .users
        .update(user)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!("User updated: id={}, username={}", updated.id, updated.username);
    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<i32>,
) -> Result<Json<User>, AppError> {
    let deleted = state.users.delete(id).await?.ok_or_else(user_not_found)?;

    tracing::info!("User deleted: id={}, username={}", deleted.id, deleted.username);
    Ok(Json(deleted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_not_provided() {
        assert_eq!(provided(None), None);
        assert_eq!(provided(Some("   ".to_string())), None);
        assert_eq!(provided(Some(" Bob ".to_string())), Some("Bob".to_string()));
    }

    #[test]
    fn update_payload_fields_are_optional() {
        let payload: UpdateUserRequest = serde_json::from_str(r#"{"name":"Bob"}"#).unwrap();
        assert_eq!(payload.name.as_deref(), Some("Bob"));
        assert!(payload.email.is_none());
        assert!(payload.password.is_none());
    }
}
