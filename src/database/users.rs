// User repository
//
// Persisted user rows. Handlers only see the `UserRepository` trait; the
// Postgres implementation lives here and an in-memory one backs the tests.

use async_trait::async_trait;
use deadpool_postgres::Pool;

use crate::database::error::StoreError;
use crate::database::models::{FromRow, NewUser, User};

const USER_COLUMNS: &str = "id, name, email, status, username, password_hash";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Overwrite every column of the row with `user.id`; `None` if it is gone.
    async fn update(&self, user: User) -> Result<Option<User>, StoreError>;

    /// Remove the row and return what it held; `None` if it did not exist.
    async fn delete(&self, id: i32) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool,
}

impl PgUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"),
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| User::from_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"),
                &[&id],
            )
            .await?;
        row.map(|r| User::from_row(&r)).transpose().map_err(StoreError::from)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"),
                &[&username],
            )
            .await?;
        row.map(|r| User::from_row(&r)).transpose().map_err(StoreError::from)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "INSERT INTO users (name, email, status, username, password_hash) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
                &[
                    &user.name,
                    &user.email,
                    &user.status,
                    &user.username,
                    &user.password_hash,
                ],
            )
            .await?;
        let id: i32 = row.try_get("id")?;
        Ok(user.with_id(id))
    }

    async fn update(&self, user: User) -> Result<Option<User>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!(
                    "UPDATE users SET name = $2, email = $3, status = $4, username = $5, \
                     password_hash = $6 WHERE id = $1 RETURNING {USER_COLUMNS}"
                ),
                &[
                    &user.id,
                    &user.name,
                    &user.email,
                    &user.status,
                    &user.username,
                    &user.password_hash,
                ],
            )
            .await?;
        row.map(|r| User::from_row(&r)).transpose().map_err(StoreError::from)
    }

    async fn delete(&self, id: i32) -> Result<Option<User>, StoreError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"),
                &[&id],
            )
            .await?;
        row.map(|r| User::from_row(&r)).transpose().map_err(StoreError::from)
    }
}
