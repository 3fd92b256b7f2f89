//! Account identity and the repository contract used to persist it.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use elearn_core::{AccountId, CourseId};

use crate::Role;

/// Account identity as seen by the session subsystem.
///
/// `password_hash` is absent for social-auth accounts and is never serialized:
/// session snapshots and API responses carry everything except the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub courses: BTreeSet<CourseId>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// New regular account created through registration + activation.
    ///
    /// `created_at` comes from the caller's clock so listing order follows it.
    pub fn registered(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            email: normalize_email(&email.into()),
            role: Role::Regular,
            password_hash: Some(password_hash),
            avatar: None,
            courses: BTreeSet::new(),
            created_at,
        }
    }

    /// New regular account created on first social login (no password).
    pub fn social(
        name: impl Into<String>,
        email: impl Into<String>,
        avatar: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            email: normalize_email(&email.into()),
            role: Role::Regular,
            password_hash: None,
            avatar,
            courses: BTreeSet::new(),
            created_at,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn owns_course(&self, course_id: &CourseId) -> bool {
        self.courses.contains(course_id)
    }

    /// Copy suitable for the session store (secret stripped).
    pub fn snapshot(&self) -> Self {
        Self {
            password_hash: None,
            ..self.clone()
        }
    }
}

/// Lowercase + trim; emails are unique case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("account not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("repository backend error: {0}")]
    Backend(String),
}

/// Account persistence collaborator.
///
/// `create` and `save` enforce email uniqueness and fail with `Conflict`.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError>;
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;
    async fn create(&self, account: Account) -> Result<Account, RepositoryError>;
    async fn save(&self, account: Account) -> Result<Account, RepositoryError>;
    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<Account>, RepositoryError>;
    async fn delete(&self, id: AccountId) -> Result<(), RepositoryError>;
}
