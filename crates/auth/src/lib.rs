//! `elearn-auth` — session and credential boundary.
//!
//! Token issuance/verification, the session-store contract and the session
//! lifecycle (login, refresh rotation, logout) live here. This crate is
//! decoupled from HTTP; storage is reached only through the traits in
//! [`account`] and [`session`].

pub mod account;
pub mod activation;
pub mod claims;
pub mod clock;
pub mod codec;
pub mod error;
pub mod gate;
pub mod manager;
pub mod password;
pub mod roles;
pub mod session;

pub use account::{Account, AccountRepository, RepositoryError};
pub use activation::{IssuedActivation, PendingRegistration, confirm_activation, create_activation};
pub use claims::{CredentialKind, WindowError, validate_window};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CredentialCodec, CredentialError, RefreshSubject};
pub use error::AuthError;
pub use gate::{authorize_course_access, require_role};
pub use manager::{IssuedSession, SessionManager, SessionPolicy};
pub use password::{PasswordError, hash_password, verify_password};
pub use roles::Role;
pub use session::{SessionRecord, SessionStore, SessionStoreError};
