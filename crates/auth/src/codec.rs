//! Credential codec: HS256-signed, time-limited tokens.
//!
//! Two independent secrets are held: one for activation tickets and one shared
//! by access and refresh credentials. Expiry is evaluated against the injected
//! [`Clock`], not the library's wall clock, so `Expired` is reported distinctly
//! from a bad signature or a garbled token.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use elearn_core::AccountId;

use crate::claims::{
    AccessClaims, ActivationClaims, CredentialKind, Envelope, RefreshClaims, WindowError, validate_window,
};
use crate::clock::Clock;
use crate::error::AuthError;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("token cannot be parsed")]
    Malformed,

    #[error("token signature does not verify")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,
}

impl CredentialError {
    /// Lift into the auth taxonomy; signature failures are reported as malformed.
    pub fn into_auth(self, kind: CredentialKind) -> AuthError {
        match self {
            CredentialError::Expired => AuthError::Expired(kind),
            CredentialError::Malformed | CredentialError::InvalidSignature => AuthError::Malformed,
        }
    }
}

/// What a verified refresh credential proves: an account id and the rotation
/// it was minted for. Never a full account.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RefreshSubject {
    pub account_id: AccountId,
    pub jti: Uuid,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub struct CredentialCodec {
    activation: KeyPair,
    session: KeyPair,
    clock: Arc<dyn Clock>,
}

impl CredentialCodec {
    pub fn new(activation_secret: &[u8], session_secret: &[u8], clock: Arc<dyn Clock>) -> Self {
        Self {
            activation: KeyPair::from_secret(activation_secret),
            session: KeyPair::from_secret(session_secret),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn keys(&self, kind: CredentialKind) -> &KeyPair {
        match kind {
            CredentialKind::Activation => &self.activation,
            CredentialKind::Access | CredentialKind::Refresh => &self.session,
        }
    }

    /// Sign `body` as a `kind` credential valid for `ttl` from now.
    pub fn issue<B: Serialize>(&self, kind: CredentialKind, body: B, ttl: Duration) -> Result<String, CredentialError> {
        let iat = self.clock.now().timestamp();
        let envelope = Envelope {
            body,
            kind,
            iat,
            exp: iat + ttl.num_seconds(),
        };
        jsonwebtoken::encode(&Header::new(ALGORITHM), &envelope, &self.keys(kind).encoding)
            .map_err(|_| CredentialError::Malformed)
    }

    /// Verify signature, kind and validity window; return the body.
    pub fn verify<B: DeserializeOwned>(&self, kind: CredentialKind, token: &str) -> Result<B, CredentialError> {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked below against the injected clock.
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<Envelope<B>>(token, &self.keys(kind).decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => CredentialError::InvalidSignature,
                _ => CredentialError::Malformed,
            })?;
        let envelope = data.claims;

        if envelope.kind != kind {
            return Err(CredentialError::Malformed);
        }

        match validate_window(envelope.iat, envelope.exp, self.clock.now()) {
            Ok(()) => Ok(envelope.body),
            Err(WindowError::Expired) => Err(CredentialError::Expired),
            Err(WindowError::NotYetValid | WindowError::InvalidTimeWindow) => Err(CredentialError::Malformed),
        }
    }

    pub fn issue_access(&self, account_id: AccountId, ttl: Duration) -> Result<String, CredentialError> {
        self.issue(CredentialKind::Access, AccessClaims { sub: account_id }, ttl)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccountId, CredentialError> {
        self.verify::<AccessClaims>(CredentialKind::Access, token)
            .map(|claims| claims.sub)
    }

    pub fn issue_refresh(&self, account_id: AccountId, jti: Uuid, ttl: Duration) -> Result<String, CredentialError> {
        self.issue(CredentialKind::Refresh, RefreshClaims { sub: account_id, jti }, ttl)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshSubject, CredentialError> {
        self.verify::<RefreshClaims>(CredentialKind::Refresh, token)
            .map(|claims| RefreshSubject {
                account_id: claims.sub,
                jti: claims.jti,
            })
    }

    pub(crate) fn issue_activation(&self, claims: ActivationClaims, ttl: Duration) -> Result<String, CredentialError> {
        self.issue(CredentialKind::Activation, claims, ttl)
    }

    pub(crate) fn verify_activation(&self, token: &str) -> Result<ActivationClaims, CredentialError> {
        self.verify(CredentialKind::Activation, token)
    }

    /// Keyed digest of an activation code, bound to the registering email.
    pub(crate) fn activation_code_digest(&self, email: &str, code: &str) -> Result<String, CredentialError> {
        jsonwebtoken::crypto::sign(digest_input(email, code).as_bytes(), &self.activation.encoding, ALGORITHM)
            .map_err(|_| CredentialError::Malformed)
    }

    pub(crate) fn activation_code_matches(&self, email: &str, code: &str, digest: &str) -> bool {
        jsonwebtoken::crypto::verify(digest, digest_input(email, code).as_bytes(), &self.activation.decoding, ALGORITHM)
            .unwrap_or(false)
    }
}

fn digest_input(email: &str, code: &str) -> String {
    format!("{email}:{code}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;

    fn codec_with(clock: Arc<ManualClock>) -> CredentialCodec {
        CredentialCodec::new(b"activation-secret", b"session-secret", clock)
    }

    #[test]
    fn access_round_trip_before_ttl() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(clock.clone());
        let id = AccountId::new();

        let token = codec.issue_access(id, Duration::minutes(5)).unwrap();
        clock.advance(Duration::minutes(4));

        assert_eq!(codec.verify_access(&token), Ok(id));
    }

    #[test]
    fn access_expires_at_ttl() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(clock.clone());

        let token = codec.issue_access(AccountId::new(), Duration::minutes(5)).unwrap();
        clock.advance(Duration::minutes(5));

        assert_eq!(codec.verify_access(&token), Err(CredentialError::Expired));
    }

    #[test]
    fn foreign_secret_never_verifies() {
        let clock = Arc::new(ManualClock::starting_now());
        let ours = codec_with(clock.clone());
        let theirs = CredentialCodec::new(b"activation-secret", b"some-other-secret", clock);

        let token = theirs.issue_access(AccountId::new(), Duration::minutes(5)).unwrap();
        assert_eq!(ours.verify_access(&token), Err(CredentialError::InvalidSignature));
    }

    #[test]
    fn expired_foreign_token_is_not_reported_as_expired() {
        let clock = Arc::new(ManualClock::starting_now());
        let ours = codec_with(clock.clone());
        let theirs = CredentialCodec::new(b"activation-secret", b"some-other-secret", clock.clone());

        let token = theirs.issue_access(AccountId::new(), Duration::minutes(5)).unwrap();
        clock.advance(Duration::hours(1));
        assert_eq!(ours.verify_access(&token), Err(CredentialError::InvalidSignature));
    }

    #[test]
    fn access_token_is_not_a_refresh_token() {
        let codec = codec_with(Arc::new(ManualClock::starting_now()));
        let token = codec.issue_access(AccountId::new(), Duration::days(7)).unwrap();
        assert_eq!(codec.verify_refresh(&token), Err(CredentialError::Malformed));
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let codec = codec_with(Arc::new(ManualClock::starting_now()));
        let token = codec.issue_refresh(AccountId::new(), Uuid::now_v7(), Duration::days(7)).unwrap();
        assert_eq!(codec.verify_access(&token), Err(CredentialError::Malformed));
    }

    #[test]
    fn session_token_does_not_verify_under_activation_secret() {
        let codec = codec_with(Arc::new(ManualClock::starting_now()));
        let token = codec.issue_access(AccountId::new(), Duration::minutes(5)).unwrap();
        assert_eq!(
            codec.verify::<AccessClaims>(CredentialKind::Activation, &token),
            Err(CredentialError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec_with(Arc::new(ManualClock::starting_now()));
        assert_eq!(codec.verify_access("not.a.token"), Err(CredentialError::Malformed));
        assert_eq!(codec.verify_access(""), Err(CredentialError::Malformed));
    }

    #[test]
    fn refresh_carries_rotation_id() {
        let codec = codec_with(Arc::new(ManualClock::starting_now()));
        let id = AccountId::new();
        let jti = Uuid::now_v7();
        let token = codec.issue_refresh(id, jti, Duration::days(7)).unwrap();
        assert_eq!(codec.verify_refresh(&token), Ok(RefreshSubject { account_id: id, jti }));
    }

    proptest! {
        #[test]
        fn verify_inverts_issue_until_ttl(raw_id in any::<u128>(), ttl_secs in 1i64..86_400, elapsed in 0i64..172_800) {
            let clock = Arc::new(ManualClock::starting_now());
            let codec = codec_with(clock.clone());
            let id = AccountId::from_uuid(Uuid::from_u128(raw_id));

            let token = codec.issue_access(id, Duration::seconds(ttl_secs)).unwrap();
            clock.advance(Duration::seconds(elapsed));

            let result = codec.verify_access(&token);
            if elapsed < ttl_secs {
                prop_assert_eq!(result, Ok(id));
            } else {
                prop_assert_eq!(result, Err(CredentialError::Expired));
            }
        }
    }
}
