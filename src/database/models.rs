// Database Models
//
// Row types for the `users` and `token_blacklist` tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Trait for converting database rows to structs
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error>
    where
        Self: Sized;
}

/// User account information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub status: Option<String>,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl FromRow for User {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            status: row.try_get("status")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

/// A user that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub status: Option<String>,
    pub username: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn with_id(self, id: i32) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            status: self.status,
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

/// One revoked token, kept until its original expiry passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationEntry {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
