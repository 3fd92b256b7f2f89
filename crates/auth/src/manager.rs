//! Session lifecycle: start (login / social auth), authenticate, refresh
//! rotation and end (logout).
//!
//! The manager is the only writer of session entries and keeps the three
//! lifetimes aligned: every entry it writes expires together with the refresh
//! credential minted alongside it.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use elearn_core::AccountId;

use crate::claims::CredentialKind;
use crate::codec::CredentialCodec;
use crate::session::{SessionRecord, SessionStore};
use crate::{Account, AccountRepository, AuthError};

/// Lifetimes and the per-operation budget for store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub store_timeout: std::time::Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(5),
            refresh_ttl: Duration::days(7),
            store_timeout: std::time::Duration::from_secs(2),
        }
    }
}

/// A freshly minted credential pair and the account it is bound to.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub account: Account,
    pub access_token: String,
    pub refresh_token: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

pub struct SessionManager {
    codec: Arc<CredentialCodec>,
    store: Arc<dyn SessionStore>,
    accounts: Arc<dyn AccountRepository>,
    policy: SessionPolicy,
}

impl SessionManager {
    pub fn new(
        codec: Arc<CredentialCodec>,
        store: Arc<dyn SessionStore>,
        accounts: Arc<dyn AccountRepository>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            codec,
            store,
            accounts,
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn codec(&self) -> &Arc<CredentialCodec> {
        &self.codec
    }

    /// Issue a pair for an account that just proved its identity and prime
    /// the session store. Any previous session for the account is replaced.
    pub async fn start(&self, account: Account) -> Result<IssuedSession, AuthError> {
        let refresh_id = Uuid::now_v7();
        let issued = self.mint(account, refresh_id)?;

        let record = SessionRecord::new(&issued.account, refresh_id);
        self.bounded(self.store.put(record, self.policy.refresh_ttl))
            .await
            .map_err(AuthError::Store)?;

        tracing::info!(account_id = %issued.account.id, "session started");
        Ok(issued)
    }

    /// Resolve the account behind an access credential.
    ///
    /// The token only yields an id; the account itself always comes from the
    /// session store. A missing entry means the session was revoked.
    pub async fn authenticate(&self, access_token: &str) -> Result<Account, AuthError> {
        let account_id = self
            .codec
            .verify_access(access_token)
            .map_err(|e| e.into_auth(CredentialKind::Access))?;

        let record = self.bounded(self.store.get(account_id)).await.map_err(|error| {
            tracing::warn!(%account_id, %error, "session lookup failed during authentication");
            AuthError::NotAuthenticated
        })?;

        match record {
            Some(record) => Ok(record.account),
            None => Err(AuthError::RevokedSession),
        }
    }

    /// Rotate a refresh credential into a new pair.
    ///
    /// The presented token must verify, its session must be live, and the
    /// session must still belong to this exact token. The entry is re-primed
    /// with the current account (re-read from the repository) through a
    /// compare-and-swap, so concurrent refreshes with one token yield a single
    /// winner.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedSession, AuthError> {
        let subject = self
            .codec
            .verify_refresh(refresh_token)
            .map_err(|e| e.into_auth(CredentialKind::Refresh))?;
        let account_id = subject.account_id;

        let record = self
            .bounded(self.store.get(account_id))
            .await
            .map_err(|error| self.refresh_store_failure(account_id, error))?
            .ok_or(AuthError::RevokedSession)?;

        if record.refresh_id != subject.jti {
            tracing::info!(%account_id, "superseded refresh credential presented");
            return Err(AuthError::RevokedSession);
        }

        let account = match self.bounded(self.accounts.find_by_id(account_id)).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::info!(%account_id, "refresh for deleted account, dropping session");
                if let Err(error) = self.bounded(self.store.delete(account_id)).await {
                    tracing::warn!(%account_id, %error, "failed to drop session of deleted account");
                }
                return Err(AuthError::RevokedSession);
            }
            Err(error) => return Err(self.refresh_store_failure(account_id, error)),
        };

        let refresh_id = Uuid::now_v7();
        let issued = self.mint(account, refresh_id)?;

        let record = SessionRecord::new(&issued.account, refresh_id);
        let rotated = self
            .bounded(self.store.rotate(account_id, subject.jti, record, self.policy.refresh_ttl))
            .await
            .map_err(|error| self.refresh_store_failure(account_id, error))?;

        if !rotated {
            tracing::info!(%account_id, "refresh lost rotation race");
            return Err(AuthError::RevokedSession);
        }

        tracing::info!(%account_id, "session refreshed");
        Ok(issued)
    }

    /// Logout: the session entry is always deleted.
    pub async fn end(&self, account_id: AccountId) -> Result<(), AuthError> {
        self.bounded(self.store.delete(account_id))
            .await
            .map_err(AuthError::Store)?;
        tracing::info!(%account_id, "session ended");
        Ok(())
    }

    /// Push a changed account into its live session, if there is one.
    pub async fn sync_snapshot(&self, account: &Account) -> Result<(), AuthError> {
        let updated = self
            .bounded(self.store.update_snapshot(account))
            .await
            .map_err(AuthError::Store)?;
        if !updated {
            tracing::debug!(account_id = %account.id, "no live session to update");
        }
        Ok(())
    }

    fn mint(&self, account: Account, refresh_id: Uuid) -> Result<IssuedSession, AuthError> {
        let access_token = self
            .codec
            .issue_access(account.id, self.policy.access_ttl)
            .map_err(|e| AuthError::Store(format!("access credential: {e}")))?;
        let refresh_token = self
            .codec
            .issue_refresh(account.id, refresh_id, self.policy.refresh_ttl)
            .map_err(|e| AuthError::Store(format!("refresh credential: {e}")))?;

        Ok(IssuedSession {
            account: account.snapshot(),
            access_token,
            refresh_token,
            access_ttl: self.policy.access_ttl,
            refresh_ttl: self.policy.refresh_ttl,
        })
    }

    fn refresh_store_failure(&self, account_id: AccountId, error: String) -> AuthError {
        tracing::warn!(%account_id, %error, "store failure during refresh");
        AuthError::RevokedSession
    }

    /// Run a store/repository call under the configured budget.
    async fn bounded<T, E>(&self, op: impl Future<Output = Result<T, E>>) -> Result<T, String>
    where
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.policy.store_timeout, op).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.policy.store_timeout)),
        }
    }
}
