//! Integration tests for the session lifecycle.
//!
//! Tests: SessionManager → CredentialCodec → SessionStore → AccountRepository
//!
//! Verifies:
//! - Refresh liveness is governed by the store, not the token alone
//! - Rotation supersedes the previous refresh credential
//! - Concurrent refreshes with one credential produce a single winner
//! - Store calls are bounded by the configured timeout

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Duration;
    use uuid::Uuid;

    use elearn_auth::{
        Account, AccountRepository, AuthError, Clock, CredentialCodec, CredentialKind, ManualClock, Role, SessionManager,
        SessionPolicy, SessionRecord, SessionStore, SessionStoreError,
    };
    use elearn_core::AccountId;

    use crate::accounts::InMemoryAccountRepository;
    use crate::session_store::InMemorySessionStore;

    struct Harness {
        clock: Arc<ManualClock>,
        store: Arc<InMemorySessionStore>,
        accounts: Arc<InMemoryAccountRepository>,
        sessions: SessionManager,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = Arc::new(CredentialCodec::new(b"activation", b"session", clock.clone()));
        let store = Arc::new(InMemorySessionStore::new(clock.clone()));
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let sessions = SessionManager::new(codec, store.clone(), accounts.clone(), SessionPolicy::default());
        Harness {
            clock,
            store,
            accounts,
            sessions,
        }
    }

    async fn registered(h: &Harness) -> Account {
        h.accounts
            .create(Account::registered("Ada", "ada@example.com", "hash".into(), h.clock.now()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn login_primes_store_and_authenticates() {
        let h = harness();
        let account = registered(&h).await;

        let issued = h.sessions.start(account.clone()).await.unwrap();
        assert_eq!(issued.account.password_hash, None);

        let resolved = h.sessions.authenticate(&issued.access_token).await.unwrap();
        assert_eq!(resolved.id, account.id);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn expired_access_is_distinct_from_malformed() {
        let h = harness();
        let issued = h.sessions.start(registered(&h).await).await.unwrap();

        h.clock.advance(Duration::minutes(5));
        assert_eq!(
            h.sessions.authenticate(&issued.access_token).await.unwrap_err(),
            AuthError::Expired(CredentialKind::Access)
        );
        assert_eq!(
            h.sessions.authenticate("garbage").await.unwrap_err(),
            AuthError::Malformed
        );
    }

    #[tokio::test]
    async fn access_without_session_is_rejected() {
        let h = harness();
        let account = registered(&h).await;
        let issued = h.sessions.start(account.clone()).await.unwrap();

        h.store.delete(account.id).await.unwrap();
        assert_eq!(
            h.sessions.authenticate(&issued.access_token).await.unwrap_err(),
            AuthError::RevokedSession
        );
    }

    #[tokio::test]
    async fn logout_revokes_a_cryptographically_valid_refresh() {
        let h = harness();
        let account = registered(&h).await;
        let issued = h.sessions.start(account.clone()).await.unwrap();

        h.sessions.end(account.id).await.unwrap();

        // Token itself still verifies.
        assert!(h.sessions.codec().verify_refresh(&issued.refresh_token).is_ok());
        assert_eq!(
            h.sessions.refresh(&issued.refresh_token).await.unwrap_err(),
            AuthError::RevokedSession
        );
    }

    #[tokio::test]
    async fn sequential_refreshes_each_yield_a_usable_pair() {
        let h = harness();
        let first = h.sessions.start(registered(&h).await).await.unwrap();

        h.clock.advance(Duration::minutes(6));
        let second = h.sessions.refresh(&first.refresh_token).await.unwrap();
        assert!(h.sessions.authenticate(&second.access_token).await.is_ok());

        h.clock.advance(Duration::minutes(6));
        let third = h.sessions.refresh(&second.refresh_token).await.unwrap();
        assert!(h.sessions.authenticate(&third.access_token).await.is_ok());

        // Superseded credentials no longer rotate the session.
        assert_eq!(
            h.sessions.refresh(&first.refresh_token).await.unwrap_err(),
            AuthError::RevokedSession
        );
        assert_eq!(
            h.sessions.refresh(&second.refresh_token).await.unwrap_err(),
            AuthError::RevokedSession
        );
    }

    #[tokio::test]
    async fn refresh_slides_the_session_window() {
        let h = harness();
        let mut current = h.sessions.start(registered(&h).await).await.unwrap();

        // Three 6-day hops outlive the original 7-day window.
        for _ in 0..3 {
            h.clock.advance(Duration::days(6));
            current = h.sessions.refresh(&current.refresh_token).await.unwrap();
        }
        assert!(h.sessions.authenticate(&current.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn idle_session_expires_with_refresh_ttl() {
        let h = harness();
        let issued = h.sessions.start(registered(&h).await).await.unwrap();

        h.clock.advance(Duration::days(7));
        assert_eq!(
            h.sessions.refresh(&issued.refresh_token).await.unwrap_err(),
            AuthError::Expired(CredentialKind::Refresh)
        );
    }

    #[tokio::test]
    async fn refresh_reprimes_with_current_account() {
        let h = harness();
        let account = registered(&h).await;
        let issued = h.sessions.start(account.clone()).await.unwrap();

        let promoted = h.accounts.save(account.clone().with_role(Role::Admin)).await.unwrap();
        let refreshed = h.sessions.refresh(&issued.refresh_token).await.unwrap();
        assert_eq!(refreshed.account.role, Role::Admin);

        let resolved = h.sessions.authenticate(&refreshed.access_token).await.unwrap();
        assert_eq!(resolved.role, promoted.role);
    }

    #[tokio::test]
    async fn refresh_for_deleted_account_drops_session() {
        let h = harness();
        let account = registered(&h).await;
        let issued = h.sessions.start(account.clone()).await.unwrap();

        h.accounts.delete(account.id).await.unwrap();
        assert_eq!(
            h.sessions.refresh(&issued.refresh_token).await.unwrap_err(),
            AuthError::RevokedSession
        );
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn concurrent_refreshes_have_one_winner() {
        let h = harness();
        let issued = h.sessions.start(registered(&h).await).await.unwrap();

        let (a, b) = tokio::join!(
            h.sessions.refresh(&issued.refresh_token),
            h.sessions.refresh(&issued.refresh_token)
        );
        let outcomes = [a.is_ok(), b.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);

        let winner = a.or(b).unwrap();
        assert!(h.sessions.refresh(&winner.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn snapshot_sync_reaches_live_session() {
        let h = harness();
        let mut account = registered(&h).await;
        let issued = h.sessions.start(account.clone()).await.unwrap();

        account.name = "Ada Lovelace".into();
        h.sessions.sync_snapshot(&account).await.unwrap();

        let resolved = h.sessions.authenticate(&issued.access_token).await.unwrap();
        assert_eq!(resolved.name, "Ada Lovelace");
    }

    /// Store that never answers.
    struct StalledStore;

    #[async_trait]
    impl SessionStore for StalledStore {
        async fn put(&self, _: SessionRecord, _: Duration) -> Result<(), SessionStoreError> {
            std::future::pending().await
        }
        async fn get(&self, _: AccountId) -> Result<Option<SessionRecord>, SessionStoreError> {
            std::future::pending().await
        }
        async fn rotate(&self, _: AccountId, _: Uuid, _: SessionRecord, _: Duration) -> Result<bool, SessionStoreError> {
            std::future::pending().await
        }
        async fn update_snapshot(&self, _: &Account) -> Result<bool, SessionStoreError> {
            std::future::pending().await
        }
        async fn delete(&self, _: AccountId) -> Result<(), SessionStoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn stalled_store_is_bounded_by_timeout() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = Arc::new(CredentialCodec::new(b"activation", b"session", clock));
        let policy = SessionPolicy {
            store_timeout: std::time::Duration::from_millis(50),
            ..SessionPolicy::default()
        };
        let sessions = SessionManager::new(
            codec.clone(),
            Arc::new(StalledStore),
            Arc::new(InMemoryAccountRepository::new()),
            policy,
        );

        let id = AccountId::new();
        let access = codec.issue_access(id, Duration::minutes(5)).unwrap();
        let refresh = codec.issue_refresh(id, Uuid::now_v7(), Duration::days(7)).unwrap();

        assert_eq!(sessions.authenticate(&access).await.unwrap_err(), AuthError::NotAuthenticated);
        assert_eq!(sessions.refresh(&refresh).await.unwrap_err(), AuthError::RevokedSession);
        assert!(matches!(sessions.end(id).await.unwrap_err(), AuthError::Store(_)));
    }

    /// In-memory store whose deletes always fail.
    struct UndeletableStore(InMemorySessionStore);

    #[async_trait]
    impl SessionStore for UndeletableStore {
        async fn put(&self, record: SessionRecord, ttl: Duration) -> Result<(), SessionStoreError> {
            self.0.put(record, ttl).await
        }
        async fn get(&self, account_id: AccountId) -> Result<Option<SessionRecord>, SessionStoreError> {
            self.0.get(account_id).await
        }
        async fn rotate(
            &self,
            account_id: AccountId,
            expected: Uuid,
            record: SessionRecord,
            ttl: Duration,
        ) -> Result<bool, SessionStoreError> {
            self.0.rotate(account_id, expected, record, ttl).await
        }
        async fn update_snapshot(&self, account: &Account) -> Result<bool, SessionStoreError> {
            self.0.update_snapshot(account).await
        }
        async fn delete(&self, _: AccountId) -> Result<(), SessionStoreError> {
            Err(SessionStoreError::Unavailable("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn refresh_for_deleted_account_is_revoked_even_if_drop_fails() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = Arc::new(CredentialCodec::new(b"activation", b"session", clock.clone()));
        let store = Arc::new(UndeletableStore(InMemorySessionStore::new(clock.clone())));
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let sessions = SessionManager::new(codec, store.clone(), accounts.clone(), SessionPolicy::default());

        let account = accounts
            .create(Account::registered("Ada", "ada@example.com", "hash".into(), clock.now()))
            .await
            .unwrap();
        let issued = sessions.start(account.clone()).await.unwrap();
        accounts.delete(account.id).await.unwrap();

        assert_eq!(
            sessions.refresh(&issued.refresh_token).await.unwrap_err(),
            AuthError::RevokedSession
        );
        // Entry survives the failed drop but cannot be refreshed again.
        assert_eq!(store.0.len(), 1);
        assert_eq!(
            sessions.refresh(&issued.refresh_token).await.unwrap_err(),
            AuthError::RevokedSession
        );
    }
}
