//! Session store contract.
//!
//! The store plays two roles at once: a fast path for resolving the account
//! behind an access credential, and the liveness authority for refresh
//! credentials. Losing an entry (logout, TTL expiry, or eviction under memory
//! pressure) revokes the session even though its refresh token still verifies.

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use elearn_core::AccountId;

use crate::Account;

/// One live session per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Account snapshot (no password hash).
    pub account: Account,
    /// `jti` of the only refresh credential allowed to rotate this session.
    pub refresh_id: Uuid,
}

impl SessionRecord {
    pub fn new(account: &Account, refresh_id: Uuid) -> Self {
        Self {
            account: account.snapshot(),
            refresh_id,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account.id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("session record could not be decoded: {0}")]
    Corrupt(String),
}

/// Keyed by account id. Every write carries a TTL; there is no way to create
/// an entry that never expires.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Unconditionally replace the account's session.
    async fn put(&self, record: SessionRecord, ttl: Duration) -> Result<(), SessionStoreError>;

    async fn get(&self, account_id: AccountId) -> Result<Option<SessionRecord>, SessionStoreError>;

    /// Compare-and-swap on `refresh_id`: write `record` with a fresh `ttl` only
    /// if the live entry still belongs to `expected_refresh_id`.
    ///
    /// Returns `false` when the entry is gone or was already rotated.
    async fn rotate(
        &self,
        account_id: AccountId,
        expected_refresh_id: Uuid,
        record: SessionRecord,
        ttl: Duration,
    ) -> Result<bool, SessionStoreError>;

    /// Replace the snapshot of a live entry, keeping its TTL and rotation id.
    ///
    /// Returns `false` when there is no live entry (nothing is created).
    async fn update_snapshot(&self, account: &Account) -> Result<bool, SessionStoreError>;

    async fn delete(&self, account_id: AccountId) -> Result<(), SessionStoreError>;
}
