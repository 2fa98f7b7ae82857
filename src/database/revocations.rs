// Postgres-backed revocation store (`token_blacklist` table).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;

use crate::auth::revocation::RevocationStore;
use crate::database::error::StoreError;
use crate::database::models::RevocationEntry;

#[derive(Clone)]
pub struct PgRevocationStore {
    pool: Pool,
}

impl PgRevocationStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationStore for PgRevocationStore {
    async fn revoke(&self, entry: RevocationEntry) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO token_blacklist (token, expiry) VALUES ($1, $2)",
                &[&entry.token, &entry.expires_at],
            )
            .await?;
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM token_blacklist WHERE token = $1)",
                &[&token],
            )
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let client = self.pool.get().await?;
        let purged = client
            .execute("DELETE FROM token_blacklist WHERE expiry < $1", &[&now])
            .await?;
        Ok(purged)
    }
}
