//! Storage errors shared by the Postgres repositories.

use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No connection could be obtained from the pool.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// A unique constraint rejected the write.
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            return StoreError::Conflict(err.to_string());
        }
        if err.is_closed() {
            return StoreError::Unavailable(err.to_string());
        }
        StoreError::Query(err.to_string())
    }
}
