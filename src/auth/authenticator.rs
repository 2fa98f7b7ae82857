//! Turns a raw `Authorization` header into an authenticated user.
//!
//! Order of checks: header shape, token verification, then revocation. A
//! revocation-store failure rejects the request.

use std::sync::Arc;

use thiserror::Error;

use crate::auth::jwt::{JwtService, TokenError};
use crate::auth::models::{AuthUser, SessionToken};
use crate::auth::revocation::RevocationStore;
use crate::database::error::StoreError;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed bearer credential")]
    MissingCredential,
    #[error("token is malformed")]
    MalformedToken,
    #[error("token signature or algorithm does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token has been revoked")]
    Revoked,
    #[error("revocation check failed: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl AuthError {
    /// Stable name of the failed check, for logs only.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedToken => "malformed_token",
            AuthError::BadSignature => "bad_signature",
            AuthError::Expired => "expired",
            AuthError::Revoked => "revoked",
            AuthError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::Expired,
            TokenError::BadSignature => AuthError::BadSignature,
            TokenError::Malformed | TokenError::Signing(_) => AuthError::MalformedToken,
        }
    }
}

/// Extract the token from a `Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix(BEARER_PREFIX)?.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

pub struct Authenticator {
    jwt_service: Arc<JwtService>,
    revocations: Arc<dyn RevocationStore>,
}

impl Authenticator {
    pub fn new(jwt_service: Arc<JwtService>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self {
            jwt_service,
            revocations,
        }
    }

    pub async fn authenticate(&self, header: Option<&str>) -> Result<AuthUser, AuthError> {
        let token = header
            .and_then(bearer_token)
            .ok_or(AuthError::MissingCredential)?;

        let claims = self.jwt_service.verify(token)?;
        let expires_at = claims.expires_at().ok_or(AuthError::MalformedToken)?;

        let revoked = self
            .revocations
            .is_revoked(token)
            .await
            .map_err(AuthError::StoreUnavailable)?;
        if revoked {
            return Err(AuthError::Revoked);
        }

        Ok(AuthUser {
            username: claims.sub,
            session: SessionToken {
                raw: token.to_string(),
                expires_at,
            },
        })
    }
}
