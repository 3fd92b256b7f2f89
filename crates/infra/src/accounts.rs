//! In-memory account repository for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use elearn_auth::account::normalize_email;
use elearn_auth::{Account, AccountRepository, RepositoryError};
use elearn_core::AccountId;

#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    inner: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Backend("lock poisoned".into())
}

fn email_taken(map: &HashMap<AccountId, Account>, email: &str, except: Option<AccountId>) -> bool {
    map.values()
        .any(|a| a.email == email && Some(a.id) != except)
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let email = normalize_email(email);
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.get(&id).cloned())
    }

    async fn create(&self, mut account: Account) -> Result<Account, RepositoryError> {
        account.email = normalize_email(&account.email);
        let mut map = self.inner.write().map_err(poisoned)?;
        if map.contains_key(&account.id) {
            return Err(RepositoryError::Conflict(format!("account {} exists", account.id)));
        }
        if email_taken(&map, &account.email, None) {
            return Err(RepositoryError::Conflict("email already exists".into()));
        }
        map.insert(account.id, account.clone());
        Ok(account)
    }

    async fn save(&self, mut account: Account) -> Result<Account, RepositoryError> {
        account.email = normalize_email(&account.email);
        let mut map = self.inner.write().map_err(poisoned)?;
        if !map.contains_key(&account.id) {
            return Err(RepositoryError::NotFound);
        }
        if email_taken(&map, &account.email, Some(account.id)) {
            return Err(RepositoryError::Conflict("email already exists".into()));
        }
        map.insert(account.id, account.clone());
        Ok(account)
    }

    async fn list(&self) -> Result<Vec<Account>, RepositoryError> {
        let map = self.inner.read().map_err(poisoned)?;
        let mut accounts: Vec<Account> = map.values().cloned().collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(accounts)
    }

    async fn delete(&self, id: AccountId) -> Result<(), RepositoryError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        map.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}
