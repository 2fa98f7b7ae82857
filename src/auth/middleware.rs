//! Authentication Middleware
//!
//! Gate for protected routes. Every rejection produces the same 401 body; the
//! specific reason only goes to the log.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::auth::authenticator::{AuthError, Authenticator};

/// Body of every authentication rejection.
pub const UNAUTHORIZED_MESSAGE: &str = "invalid or expired jwt";

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": UNAUTHORIZED_MESSAGE })),
        )
            .into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}

pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Verify the bearer token and inject [`crate::auth::models::AuthUser`]
    /// into the request extensions.
    pub async fn validate_token(
        State(authenticator): State<Arc<Authenticator>>,
        mut req: Request,
        next: Next,
    ) -> Result<Response, AuthError> {
        let header_value = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let auth_user = match authenticator.authenticate(header_value).await {
            Ok(user) => user,
            Err(e) => {
                match &e {
                    AuthError::StoreUnavailable(source) => tracing::error!(
                        kind = e.kind(),
                        "[AuthMiddleware] Rejecting {} {}: {}",
                        req.method(),
                        req.uri().path(),
                        source
                    ),
                    _ => tracing::warn!(
                        kind = e.kind(),
                        "[AuthMiddleware] Rejecting {} {}",
                        req.method(),
                        req.uri().path()
                    ),
                }
                return Err(e);
            }
        };

        tracing::debug!("[AuthMiddleware] Authenticated user={}", auth_user.username);
        req.extensions_mut().insert(auth_user);

        Ok(next.run(req).await)
    }
}
