//! # Database Module
//!
//! PostgreSQL integration via tokio-postgres and a deadpool connection pool:
//! connection management, migrations, row models and the repositories behind
//! the user and revocation traits.

pub mod connection;
pub mod error;
pub mod migrations;
pub mod models;
pub mod revocations;
pub mod users;

#[cfg(test)]
pub mod memory;

pub use connection::DatabaseConnection;
