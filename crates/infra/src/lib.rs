//! Infrastructure layer: configuration, session stores, collaborator adapters.

pub mod accounts;
pub mod config;
pub mod courses;
pub mod mail;
pub mod session_store;

mod integration_tests;

pub use accounts::InMemoryAccountRepository;
pub use config::{AppConfig, ConfigError};
pub use courses::{CourseCatalog, InMemoryCourseCatalog};
pub use mail::{LogMailer, MailError, Mailer, OutboxMailer, SentActivation};
pub use session_store::InMemorySessionStore;
#[cfg(feature = "redis")]
pub use session_store::RedisSessionStore;
