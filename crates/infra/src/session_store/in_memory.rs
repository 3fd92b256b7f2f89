//! In-memory session store for tests/dev.
//!
//! Expiry is evaluated lazily against the injected clock; expired entries are
//! invisible to readers and swept on the next write.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use elearn_auth::{Account, Clock, SessionRecord, SessionStore, SessionStoreError};
use elearn_core::AccountId;

#[derive(Debug, Clone)]
struct Entry {
    record: SessionRecord,
    expires_at: DateTime<Utc>,
}

pub struct InMemorySessionStore {
    inner: RwLock<HashMap<AccountId, Entry>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        match self.inner.read() {
            Ok(map) => map.values().filter(|e| e.expires_at > now).count(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<AccountId, Entry>>, SessionStoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| SessionStoreError::Unavailable("lock poisoned".into()))?;
        let now = self.clock.now();
        map.retain(|_, entry| entry.expires_at > now);
        Ok(map)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, record: SessionRecord, ttl: Duration) -> Result<(), SessionStoreError> {
        let expires_at = self.clock.now() + ttl;
        let mut map = self.write()?;
        map.insert(record.account_id(), Entry { record, expires_at });
        Ok(())
    }

    async fn get(&self, account_id: AccountId) -> Result<Option<SessionRecord>, SessionStoreError> {
        let now = self.clock.now();
        let map = self
            .inner
            .read()
            .map_err(|_| SessionStoreError::Unavailable("lock poisoned".into()))?;
        Ok(map
            .get(&account_id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.record.clone()))
    }

    async fn rotate(
        &self,
        account_id: AccountId,
        expected_refresh_id: Uuid,
        record: SessionRecord,
        ttl: Duration,
    ) -> Result<bool, SessionStoreError> {
        let expires_at = self.clock.now() + ttl;
        let mut map = self.write()?;
        match map.get_mut(&account_id) {
            Some(entry) if entry.record.refresh_id == expected_refresh_id => {
                *entry = Entry { record, expires_at };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_snapshot(&self, account: &Account) -> Result<bool, SessionStoreError> {
        let mut map = self.write()?;
        match map.get_mut(&account.id) {
            Some(entry) => {
                entry.record.account = account.snapshot();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, account_id: AccountId) -> Result<(), SessionStoreError> {
        let mut map = self.write()?;
        map.remove(&account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elearn_auth::ManualClock;

    fn store() -> (Arc<ManualClock>, InMemorySessionStore) {
        let clock = Arc::new(ManualClock::starting_now());
        (clock.clone(), InMemorySessionStore::new(clock))
    }

    fn record() -> SessionRecord {
        let account = Account::registered("Ada", "ada@example.com", "hash".into(), Utc::now());
        SessionRecord::new(&account, Uuid::now_v7())
    }

    #[tokio::test]
    async fn entries_expire_with_ttl() {
        let (clock, store) = store();
        let rec = record();
        let id = rec.account_id();

        store.put(rec.clone(), Duration::days(7)).await.unwrap();
        clock.advance(Duration::days(7) - Duration::seconds(1));
        assert_eq!(store.get(id).await.unwrap(), Some(rec));

        clock.advance(Duration::seconds(1));
        assert_eq!(store.get(id).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn snapshot_never_holds_password_hash() {
        let (_, store) = store();
        let rec = record();
        store.put(rec.clone(), Duration::days(1)).await.unwrap();
        let stored = store.get(rec.account_id()).await.unwrap().unwrap();
        assert_eq!(stored.account.password_hash, None);
    }

    #[tokio::test]
    async fn rotate_requires_matching_refresh_id() {
        let (_, store) = store();
        let rec = record();
        let id = rec.account_id();
        let original = rec.refresh_id;
        store.put(rec.clone(), Duration::days(7)).await.unwrap();

        let next = SessionRecord { refresh_id: Uuid::now_v7(), ..rec.clone() };
        assert!(!store.rotate(id, Uuid::now_v7(), next.clone(), Duration::days(7)).await.unwrap());
        assert!(store.rotate(id, original, next.clone(), Duration::days(7)).await.unwrap());
        // Second attempt with the same expectation loses.
        assert!(!store.rotate(id, original, rec, Duration::days(7)).await.unwrap());
        assert_eq!(store.get(id).await.unwrap(), Some(next));
    }

    #[tokio::test]
    async fn rotate_extends_the_window() {
        let (clock, store) = store();
        let rec = record();
        let id = rec.account_id();
        store.put(rec.clone(), Duration::days(7)).await.unwrap();

        clock.advance(Duration::days(6));
        let next = SessionRecord { refresh_id: Uuid::now_v7(), ..rec.clone() };
        assert!(store.rotate(id, rec.refresh_id, next, Duration::days(7)).await.unwrap());

        clock.advance(Duration::days(6));
        assert!(store.get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rotate_on_missing_entry_does_not_create_one() {
        let (_, store) = store();
        let rec = record();
        assert!(!store.rotate(rec.account_id(), rec.refresh_id, rec.clone(), Duration::days(7)).await.unwrap());
        assert_eq!(store.get(rec.account_id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_snapshot_keeps_ttl_and_rotation() {
        let (clock, store) = store();
        let rec = record();
        let id = rec.account_id();
        store.put(rec.clone(), Duration::hours(1)).await.unwrap();

        let mut renamed = rec.account.clone();
        renamed.name = "Ada L.".into();
        clock.advance(Duration::minutes(30));
        assert!(store.update_snapshot(&renamed).await.unwrap());

        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.account.name, "Ada L.");
        assert_eq!(stored.refresh_id, rec.refresh_id);

        clock.advance(Duration::minutes(30));
        assert_eq!(store.get(id).await.unwrap(), None);
        assert!(!store.update_snapshot(&renamed).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let (_, store) = store();
        let rec = record();
        store.put(rec.clone(), Duration::days(7)).await.unwrap();
        store.delete(rec.account_id()).await.unwrap();
        assert_eq!(store.get(rec.account_id()).await.unwrap(), None);
    }
}
