use elearn_auth::{Account, Role};
use elearn_core::AccountId;

/// Authenticated account for a request.
///
/// Inserted by the auth middleware after the session store resolved the
/// access credential; handlers never rebuild identity from token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    account: Account,
}

impl AccountContext {
    pub fn new(account: Account) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn account_id(&self) -> AccountId {
        self.account.id
    }

    pub fn role(&self) -> Role {
        self.account.role
    }

    pub fn into_account(self) -> Account {
        self.account
    }
}
