//! Outbound mail collaborator.
//!
//! Template rendering and delivery are external; the session subsystem only
//! needs to hand off an activation code.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation(&self, email: &str, name: &str, code: &str) -> Result<(), MailError>;
}

/// Logs instead of sending. The code itself is not logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_activation(&self, email: &str, name: &str, _code: &str) -> Result<(), MailError> {
        tracing::info!(%email, %name, "activation mail queued");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentActivation {
    pub email: String,
    pub name: String,
    pub code: String,
}

/// Keeps every activation mail in memory (tests/dev).
#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<SentActivation>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentActivation> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Most recent code mailed to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.email.eq_ignore_ascii_case(email))
            .map(|m| m.code)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send_activation(&self, email: &str, name: &str, code: &str) -> Result<(), MailError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailError::Delivery("outbox poisoned".into()))?;
        sent.push(SentActivation {
            email: email.to_string(),
            name: name.to_string(),
            code: code.to_string(),
        });
        Ok(())
    }
}
