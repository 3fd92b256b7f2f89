//! Activation tickets: a pending registration plus a short confirmation code.
//!
//! Tickets are never persisted; validity is signature + expiry only.

use chrono::Duration;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::account::normalize_email;
use crate::claims::{ActivationClaims, CredentialKind};
use crate::codec::CredentialCodec;
use crate::error::AuthError;

/// Registration data waiting for the confirmation code.
///
/// The password is hashed before it is embedded in the ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRegistration {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A freshly issued ticket and the code that must be mailed to the user.
#[derive(Debug, Clone)]
pub struct IssuedActivation {
    pub token: String,
    pub code: String,
}

/// Four digit code in `1000..=9999`.
fn generate_code() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

pub fn create_activation(
    codec: &CredentialCodec,
    mut pending: PendingRegistration,
    ttl: Duration,
) -> Result<IssuedActivation, AuthError> {
    pending.email = normalize_email(&pending.email);
    let code = generate_code();
    let code_digest = codec
        .activation_code_digest(&pending.email, &code)
        .map_err(|e| e.into_auth(CredentialKind::Activation))?;

    let token = codec
        .issue_activation(ActivationClaims { user: pending, code_digest }, ttl)
        .map_err(|e| e.into_auth(CredentialKind::Activation))?;

    Ok(IssuedActivation { token, code })
}

/// Verify the ticket, then the code. A well-formed, unexpired ticket with the
/// wrong code fails `InvalidActivationCode`.
pub fn confirm_activation(codec: &CredentialCodec, token: &str, code: &str) -> Result<PendingRegistration, AuthError> {
    let claims = codec
        .verify_activation(token)
        .map_err(|e| e.into_auth(CredentialKind::Activation))?;

    if !codec.activation_code_matches(&claims.user.email, code.trim(), &claims.code_digest) {
        return Err(AuthError::InvalidActivationCode);
    }

    Ok(claims.user)
}
