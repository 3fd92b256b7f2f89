use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use elearn_core::AccountId;

use crate::activation::PendingRegistration;

/// Which class of credential a token belongs to.
///
/// Access and refresh tokens share a signing secret; the `kind` claim keeps
/// one from being accepted in place of the other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Activation,
    Access,
    Refresh,
}

impl core::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            CredentialKind::Activation => "activation",
            CredentialKind::Access => "access",
            CredentialKind::Refresh => "refresh",
        })
    }
}

/// Envelope written into every token: the kind-specific body plus the
/// validity window (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Envelope<B> {
    #[serde(flatten)]
    pub body: B,
    pub kind: CredentialKind,
    pub iat: i64,
    pub exp: i64,
}

/// Body of an access credential: the account id and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AccessClaims {
    pub sub: AccountId,
}

/// Body of a refresh credential. `jti` identifies this rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RefreshClaims {
    pub sub: AccountId,
    pub jti: Uuid,
}

/// Body of an activation ticket.
///
/// The confirmation code itself is not embedded; only a keyed digest of it,
/// so holding the ticket does not reveal the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ActivationClaims {
    pub user: PendingRegistration,
    pub code_digest: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate a token's validity window against `now`.
///
/// A token is expired at the exact second its TTL elapses.
pub fn validate_window(issued_at: i64, expires_at: i64, now: DateTime<Utc>) -> Result<(), WindowError> {
    let now = now.timestamp();
    if expires_at <= issued_at {
        return Err(WindowError::InvalidTimeWindow);
    }
    if now < issued_at {
        return Err(WindowError::NotYetValid);
    }
    if now >= expires_at {
        return Err(WindowError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn rejects_inverted_window() {
        assert_eq!(validate_window(100, 100, at(100)), Err(WindowError::InvalidTimeWindow));
    }

    #[test]
    fn rejects_future_issue() {
        assert_eq!(validate_window(200, 300, at(199)), Err(WindowError::NotYetValid));
    }

    proptest! {
        #[test]
        fn valid_strictly_inside_window(iat in 0i64..1_000_000, ttl in 1i64..100_000, offset in 0i64..100_000) {
            let exp = iat + ttl;
            let now = at(iat + offset);
            let result = validate_window(iat, exp, now);
            if offset < ttl {
                prop_assert_eq!(result, Ok(()));
            } else {
                prop_assert_eq!(result, Err(WindowError::Expired));
            }
        }
    }
}
