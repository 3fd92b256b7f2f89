//! Argon2 hashing for handlers. The work is CPU-bound, so it runs on the
//! blocking pool instead of a runtime worker.

use elearn_auth::{hash_password, verify_password};

use crate::app::errors::ApiError;

pub async fn hash(password: String) -> Result<String, ApiError> {
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
    Ok(hashed)
}

/// `false` when the account has no password hash (social login).
pub async fn verify(hash: Option<String>, password: String) -> Result<bool, ApiError> {
    let Some(hash) = hash else {
        return Ok(false);
    };
    let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &password)).await?;
    Ok(matches)
}
