use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use elearn_auth::{AuthError, CredentialKind, PasswordError, RepositoryError};
use elearn_infra::MailError;

/// Every failure a handler can surface. Rendered as
/// `{"success": false, "error": <reason>, "message": <text>}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Validation(String),

    #[error("old password is incorrect")]
    InvalidOldPassword,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => auth_status(e),
            ApiError::Validation(_) | ApiError::InvalidOldPassword => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable reason string sent to clients.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.reason(),
            ApiError::Validation(_) => "validation_error",
            ApiError::InvalidOldPassword => "invalid_old_password",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, ApiError::Internal(_) | ApiError::Auth(AuthError::Store(_)))
    }
}

fn auth_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::InvalidActivationCode
        | AuthError::InvalidCredentials
        | AuthError::Expired(CredentialKind::Activation) => StatusCode::BAD_REQUEST,
        AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AuthError::NotAuthenticated
        | AuthError::Malformed
        | AuthError::Expired(_)
        | AuthError::RevokedSession => StatusCode::UNAUTHORIZED,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_internal() {
            // Backend detail stays in the logs.
            tracing::error!(error = %self, "request failed");
            return json_error(status, self.reason(), "internal server error");
        }
        json_error(status, self.reason(), self.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::not_found("account not found"),
            RepositoryError::Conflict(msg) => ApiError::Conflict(msg),
            RepositoryError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
