//! Error taxonomy for the session subsystem.

use thiserror::Error;

use crate::claims::CredentialKind;

/// Every variant is terminal for the current request.
///
/// `NotAuthenticated`, `Malformed`, `Expired` and `RevokedSession` form the
/// authentication family (401); `Forbidden` is an authorization failure (403).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("credential is malformed")]
    Malformed,

    #[error("{0} credential has expired")]
    Expired(CredentialKind),

    #[error("session has been revoked, please login again")]
    RevokedSession,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid activation code")]
    InvalidActivationCode,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session store error: {0}")]
    Store(String),
}

impl AuthError {
    /// Stable, machine-readable reason string.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::Malformed => "malformed_credential",
            AuthError::Expired(CredentialKind::Access) => "access_token_expired",
            AuthError::Expired(CredentialKind::Refresh) => "refresh_token_expired",
            AuthError::Expired(CredentialKind::Activation) => "activation_expired",
            AuthError::RevokedSession => "session_revoked",
            AuthError::Forbidden => "forbidden",
            AuthError::InvalidActivationCode => "invalid_activation_code",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Store(_) => "internal_error",
        }
    }

    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            AuthError::NotAuthenticated
                | AuthError::Malformed
                | AuthError::Expired(CredentialKind::Access | CredentialKind::Refresh)
                | AuthError::RevokedSession
        )
    }

    /// Failures worth flagging as potentially adversarial.
    pub fn is_suspicious(&self) -> bool {
        matches!(self, AuthError::Malformed | AuthError::Forbidden)
    }
}
