//! Admin-only account management.
//!
//! Mounted behind both the auth middleware and the `admin` role gate.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::json;

use elearn_auth::Role;
use elearn_core::AccountId;

use crate::app::dto::{self, UpdateRoleRequest};
use crate::app::errors::ApiError;
use crate::app::routes::accounts::user_response;
use crate::app::services::AppServices;
use crate::context::AccountContext;

pub fn router() -> Router {
    Router::new()
        .route("/get-all-users", get(list_users))
        .route("/update-user", put(update_role))
        .route("/delete-user/:id", delete(delete_user))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /get-all-users - newest first
pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    let users = services.accounts.list().await?;
    Ok(Json(json!({
        "success": true,
        "users": users,
    }))
    .into_response())
}

/// PUT /update-user - change an account's role
pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AccountContext>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Response, ApiError> {
    let email = dto::email(&body.email)?;
    let role: Role = dto::required(&body.role, "role")?
        .parse()
        .map_err(|_| ApiError::validation("role must be one of: user, admin"))?;

    let account = services
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found("account not found"))?;

    let saved = services.accounts.save(account.with_role(role)).await?;
    services.sessions.sync_snapshot(&saved).await?;
    tracing::info!(actor = %actor.account_id(), account_id = %saved.id, %role, "role updated");

    Ok(user_response(saved))
}

/// DELETE /delete-user/:id - removes the account and its live session
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(actor): Extension<AccountContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let account_id: AccountId = id
        .parse()
        .map_err(|_| ApiError::validation("account id is not valid"))?;

    services.accounts.delete(account_id).await?;
    services.sessions.end(account_id).await?;
    tracing::info!(actor = %actor.account_id(), %account_id, "account deleted");

    Ok(Json(json!({
        "success": true,
        "message": "user deleted successfully",
    }))
    .into_response())
}
