use serde::Deserialize;

use elearn_auth::account::normalize_email;

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------
//
// Fields default to empty so a missing field is reported as a
// `validation_error` instead of a body rejection.

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivationRequest {
    #[serde(default)]
    pub activation_token: String,
    #[serde(default)]
    pub activation_code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SocialAuthRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInfoRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

// -------------------------
// Helpers
// -------------------------

/// Trimmed value, or a validation error naming the field.
pub fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Passwords are taken verbatim; only empty input is rejected.
pub fn password<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Normalized email with a minimal shape check.
pub fn email(value: &str) -> Result<String, ApiError> {
    let email = normalize_email(required(value, "email")?);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ApiError::validation("email is not valid")),
    }
}
