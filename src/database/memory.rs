// In-memory stores used by the test suite.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::auth::revocation::RevocationStore;
use crate::database::error::StoreError;
use crate::database::models::{NewUser, RevocationEntry, User};
use crate::database::users::UserRepository;

#[derive(Default)]
pub struct MemoryRevocationStore {
    entries: RwLock<Vec<RevocationEntry>>,
    unavailable: AtomicBool,
    reject_writes: AtomicBool,
}

impl MemoryRevocationStore {
    /// Make every call fail as if the database were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail only `revoke`, leaving lookups working.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, entry: RevocationEntry) -> Result<(), StoreError> {
        self.check()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Query("insert rejected".to_string()));
        }
        self.entries.write().push(entry);
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.entries.read().iter().any(|e| e.token == token))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.check()?;
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.expires_at >= now);
        Ok((before - entries.len()) as u64)
    }
}

/// Mirrors the UNIQUE constraints on `users.username` and `users.email`.
fn ensure_unique(
    users: &[User],
    except_id: Option<i32>,
    username: &str,
    email: &str,
) -> Result<(), StoreError> {
    let clash = users
        .iter()
        .filter(|u| Some(u.id) != except_id)
        .any(|u| u.username == username || u.email == email);
    if clash {
        return Err(StoreError::Conflict(format!("user {username} already exists")));
    }
    Ok(())
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().clone())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write();
        ensure_unique(&users, None, &user.username, &user.email)?;
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let created = user.with_id(id);
        users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, user: User) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write();
        ensure_unique(&users, Some(user.id), &user.username, &user.email)?;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i32) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write();
        let position = users.iter().position(|u| u.id == id);
        Ok(position.map(|i| users.remove(i)))
    }
}
