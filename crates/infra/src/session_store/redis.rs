//! Redis-backed session store.
//!
//! Each session is a hash `session:{account_id}` with two fields, `account`
//! (JSON snapshot) and `refresh_id`, plus a key-level expiry. Every write sets
//! the expiry in the same atomic unit as the data, so an entry can never be
//! left without a TTL.
//!
//! Note: Redis may evict keys under memory pressure (depending on
//! `maxmemory-policy`). An evicted entry is indistinguishable from a logout:
//! the session is revoked and the user must log in again.

use async_trait::async_trait;
use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use uuid::Uuid;

use elearn_auth::{Account, SessionRecord, SessionStore, SessionStoreError};
use elearn_core::AccountId;

const ACCOUNT_FIELD: &str = "account";
const REFRESH_FIELD: &str = "refresh_id";

/// KEYS[1] = session key; ARGV = expected refresh id, account json, new refresh id, ttl secs.
const ROTATE_SCRIPT: &str = r"
if redis.call('HGET', KEYS[1], 'refresh_id') == ARGV[1] then
  redis.call('HSET', KEYS[1], 'account', ARGV[2], 'refresh_id', ARGV[3])
  redis.call('EXPIRE', KEYS[1], ARGV[4])
  return 1
end
return 0
";

/// KEYS[1] = session key; ARGV[1] = account json. HSET leaves the key TTL intact.
const UPDATE_SNAPSHOT_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
  redis.call('HSET', KEYS[1], 'account', ARGV[1])
  return 1
end
return 0
";

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionStore {
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(unavailable)?;
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;
        Ok(Self {
            conn,
            prefix: "session".to_string(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, account_id: AccountId) -> String {
        format!("{}:{}", self.prefix, account_id)
    }
}

fn unavailable(e: redis::RedisError) -> SessionStoreError {
    SessionStoreError::Unavailable(e.to_string())
}

fn encode_account(account: &Account) -> Result<String, SessionStoreError> {
    serde_json::to_string(&account.snapshot()).map_err(|e| SessionStoreError::Corrupt(e.to_string()))
}

fn ttl_secs(ttl: Duration) -> i64 {
    ttl.num_seconds().max(1)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, record: SessionRecord, ttl: Duration) -> Result<(), SessionStoreError> {
        let key = self.key(record.account_id());
        let account = encode_account(&record.account)?;
        let mut conn = self.conn.clone();

        let _: () = redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset_multiple(
                &key,
                &[(ACCOUNT_FIELD, account), (REFRESH_FIELD, record.refresh_id.to_string())],
            )
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(ttl_secs(ttl))
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn get(&self, account_id: AccountId) -> Result<Option<SessionRecord>, SessionStoreError> {
        let mut conn = self.conn.clone();
        let (account, refresh_id): (Option<String>, Option<String>) = conn
            .hget(self.key(account_id), &[ACCOUNT_FIELD, REFRESH_FIELD])
            .await
            .map_err(unavailable)?;

        let (Some(account), Some(refresh_id)) = (account, refresh_id) else {
            return Ok(None);
        };

        let account: Account =
            serde_json::from_str(&account).map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;
        let refresh_id = Uuid::parse_str(&refresh_id).map_err(|e| SessionStoreError::Corrupt(e.to_string()))?;
        Ok(Some(SessionRecord { account, refresh_id }))
    }

    async fn rotate(
        &self,
        account_id: AccountId,
        expected_refresh_id: Uuid,
        record: SessionRecord,
        ttl: Duration,
    ) -> Result<bool, SessionStoreError> {
        let account = encode_account(&record.account)?;
        let mut conn = self.conn.clone();
        let swapped: i64 = Script::new(ROTATE_SCRIPT)
            .key(self.key(account_id))
            .arg(expected_refresh_id.to_string())
            .arg(account)
            .arg(record.refresh_id.to_string())
            .arg(ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(swapped == 1)
    }

    async fn update_snapshot(&self, account: &Account) -> Result<bool, SessionStoreError> {
        let encoded = encode_account(account)?;
        let mut conn = self.conn.clone();
        let updated: i64 = Script::new(UPDATE_SNAPSHOT_SCRIPT)
            .key(self.key(account.id))
            .arg(encoded)
            .invoke_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(updated == 1)
    }

    async fn delete(&self, account_id: AccountId) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(self.key(account_id)).await.map_err(unavailable)?;
        Ok(())
    }
}
