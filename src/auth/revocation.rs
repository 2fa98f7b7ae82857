//! Token revocation ("blacklist").
//!
//! Logged-out tokens are stored with their original expiry and checked on every
//! authenticated request. There is no caching: every check goes to the store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::database::error::StoreError;
use crate::database::models::RevocationEntry;

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record a revoked token. Re-revoking the same token is harmless.
    async fn revoke(&self, entry: RevocationEntry) -> Result<(), StoreError>;

    /// Whether `token` has been revoked. Errors must not be read as "not revoked".
    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError>;

    /// Drop entries whose expiry is before `now`; returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Periodically purge expired revocation entries.
///
/// Removing an entry can never re-enable its token: by then the token's own
/// `exp` has passed and verification rejects it as expired.
pub fn spawn_sweeper(store: Arc<dyn RevocationStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("Revocation sweeper running every {:?}", every);

        loop {
            ticker.tick().await;
            match store.purge_expired(Utc::now()).await {
                Ok(0) => debug!("Revocation sweep found nothing to purge"),
                Ok(purged) => info!("Purged {} expired revocation entries", purged),
                Err(e) => error!("Revocation sweep failed: {}", e),
            }
        }
    })
}
