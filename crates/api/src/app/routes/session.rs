//! Login, social auth, refresh rotation and logout.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use elearn_auth::{Account, AuthError, IssuedSession};

use crate::app::dto::{self, LoginRequest, SocialAuthRequest};
use crate::app::errors::ApiError;
use crate::app::passwords;
use crate::app::services::AppServices;
use crate::context::AccountContext;
use crate::cookies;
use crate::middleware::log_rejection;

/// POST /login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = body.email.trim();
    if email.is_empty() {
        return Err(ApiError::validation("please enter email and password"));
    }
    let password = dto::password(&body.password, "password")?.to_string();

    let account = services
        .accounts
        .find_by_email(&elearn_auth::account::normalize_email(email))
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    // Social accounts have no password and cannot log in this way.
    if !passwords::verify(account.password_hash.clone(), password).await? {
        tracing::info!(account_id = %account.id, "password login rejected");
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = services.sessions.start(account).await?;
    Ok(session_response(&services, jar, issued))
}

/// POST /socialAuth
///
/// Find-or-create by email; the provider has already verified the identity.
pub async fn social_auth(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
    Json(body): Json<SocialAuthRequest>,
) -> Result<Response, ApiError> {
    let email = dto::email(&body.email)?;
    let name = dto::required(&body.name, "name")?;

    let account = match services.accounts.find_by_email(&email).await? {
        Some(account) => account,
        None => {
            let created = services
                .accounts
                .create(Account::social(name, email, body.avatar, services.now()))
                .await?;
            tracing::info!(account_id = %created.id, "account created through social auth");
            created
        }
    };

    let issued = services.sessions.start(account).await?;
    Ok(session_response(&services, jar, issued))
}

/// GET /refresh
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let Some(token) = cookies::read(&jar, cookies::REFRESH_COOKIE) else {
        let error = AuthError::NotAuthenticated;
        log_rejection(&error, "/refresh");
        return Err(error.into());
    };

    let issued = services.sessions.refresh(&token).await.inspect_err(|error| {
        log_rejection(error, "/refresh");
    })?;

    let jar = services.set_session_cookies(jar, &issued);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "access_token": issued.access_token,
        })),
    )
        .into_response())
}

/// GET /logout
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AccountContext>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    services.sessions.end(ctx.account_id()).await?;

    Ok((
        StatusCode::OK,
        cookies::clear_session_cookies(jar),
        Json(json!({
            "success": true,
            "message": "logged out successfully",
        })),
    )
        .into_response())
}

fn session_response(services: &AppServices, jar: CookieJar, issued: IssuedSession) -> Response {
    let jar = services.set_session_cookies(jar, &issued);
    (
        StatusCode::OK,
        jar,
        Json(json!({
            "success": true,
            "user": issued.account,
            "access_token": issued.access_token,
        })),
    )
        .into_response()
}
