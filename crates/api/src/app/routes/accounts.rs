//! Registration, activation and self-service account routes.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use elearn_auth::{
    confirm_activation, create_activation, Account, AuthError, PendingRegistration,
};

use crate::app::dto::{self, ActivationRequest, RegistrationRequest, UpdateInfoRequest, UpdatePasswordRequest};
use crate::app::errors::ApiError;
use crate::app::passwords;
use crate::app::services::AppServices;
use crate::context::AccountContext;

// ─────────────────────────────────────────────────────────────────────────────
// Registration
// ─────────────────────────────────────────────────────────────────────────────

/// POST /registration
pub async fn registration(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegistrationRequest>,
) -> Result<Response, ApiError> {
    let name = dto::required(&body.name, "name")?.to_string();
    let email = dto::email(&body.email)?;
    let password = dto::password(&body.password, "password")?.to_string();

    if services.accounts.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("email already exists".into()));
    }

    let pending = PendingRegistration {
        name,
        email,
        password_hash: passwords::hash(password).await?,
    };
    let issued = create_activation(&services.codec, pending.clone(), services.config.activation_ttl)?;

    services
        .mailer
        .send_activation(&pending.email, &pending.name, &issued.code)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("please check your email {} to activate your account", pending.email),
            "activation_token": issued.token,
        })),
    )
        .into_response())
}

/// POST /activate-user
pub async fn activate(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ActivationRequest>,
) -> Result<Response, ApiError> {
    let token = dto::required(&body.activation_token, "activation_token")?;
    let code = dto::required(&body.activation_code, "activation_code")?;

    let pending = confirm_activation(&services.codec, token, code).map_err(|error| match error {
        AuthError::Malformed => ApiError::validation("activation token is invalid"),
        other => ApiError::Auth(other),
    })?;

    if services.accounts.find_by_email(&pending.email).await?.is_some() {
        return Err(ApiError::Conflict("email already exists".into()));
    }

    let account = services
        .accounts
        .create(Account::registered(
            pending.name,
            pending.email,
            pending.password_hash,
            services.now(),
        ))
        .await?;
    tracing::info!(account_id = %account.id, "account activated");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": account,
        })),
    )
        .into_response())
}

// ─────────────────────────────────────────────────────────────────────────────
// Self service
// ─────────────────────────────────────────────────────────────────────────────

/// GET /me
pub async fn me(Extension(ctx): Extension<AccountContext>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "user": ctx.into_account(),
    }))
}

/// PUT /update-user-info
pub async fn update_info(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AccountContext>,
    Json(body): Json<UpdateInfoRequest>,
) -> Result<Response, ApiError> {
    let mut account = current_account(&services, &ctx).await?;

    if let Some(name) = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        account.name = name.to_string();
    }
    if let Some(raw) = body.email.as_deref().filter(|e| !e.trim().is_empty()) {
        let email = dto::email(raw)?;
        if email != account.email && services.accounts.find_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict("email already exists".into()));
        }
        account.email = email;
    }

    let saved = services.accounts.save(account).await?;
    services.sessions.sync_snapshot(&saved).await?;

    Ok(user_response(saved))
}

/// PUT /update-user-password
pub async fn update_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AccountContext>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<Response, ApiError> {
    let old_password = dto::password(&body.old_password, "old_password")?.to_string();
    let new_password = dto::password(&body.new_password, "new_password")?.to_string();

    let mut account = current_account(&services, &ctx).await?;
    if account.password_hash.is_none() {
        return Err(ApiError::validation(
            "password cannot be changed for accounts created through social login",
        ));
    }
    if !passwords::verify(account.password_hash.clone(), old_password).await? {
        return Err(ApiError::InvalidOldPassword);
    }

    account.password_hash = Some(passwords::hash(new_password).await?);
    let saved = services.accounts.save(account).await?;
    services.sessions.sync_snapshot(&saved).await?;
    tracing::info!(account_id = %saved.id, "password changed");

    Ok(user_response(saved))
}

/// The session snapshot never carries the password hash; reload the stored
/// account before mutating it.
async fn current_account(services: &AppServices, ctx: &AccountContext) -> Result<Account, ApiError> {
    services
        .accounts
        .find_by_id(ctx.account_id())
        .await?
        .ok_or_else(|| ApiError::not_found("account not found"))
}

pub(crate) fn user_response(account: Account) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "user": account,
        })),
    )
        .into_response()
}
