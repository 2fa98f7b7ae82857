//! Authentication Models
//!
//! Request identity context plus the request and response bodies of the
//! session endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::RevocationEntry;

/// The bearer token a request was authenticated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub raw: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn into_revocation(self) -> RevocationEntry {
        RevocationEntry {
            token: self.raw,
            expires_at: self.expires_at,
        }
    }
}

/// Authenticated caller, inserted into request extensions by the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub session: SessionToken,
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration payload; also used to create users through `/v1/users`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub status: Option<String>,
    pub username: String,
    pub password: String,
}

/// Token response after successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
