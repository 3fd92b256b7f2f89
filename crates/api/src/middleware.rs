use std::sync::Arc;

use axum::{extract::State, middleware::Next, response::Response};
use axum_extra::extract::CookieJar;

use elearn_auth::{AuthError, Role, SessionManager};

use crate::app::errors::ApiError;
use crate::context::AccountContext;
use crate::cookies;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<SessionManager>,
}

/// Resolve the `access_token` cookie into an [`AccountContext`].
///
/// The token only yields an account id; the account attached to the request
/// is the snapshot held by the session store.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let jar = CookieJar::from_headers(req.headers());
    let Some(token) = cookies::read(&jar, cookies::ACCESS_COOKIE) else {
        let error = AuthError::NotAuthenticated;
        log_rejection(&error, req.uri().path());
        return Err(error.into());
    };

    let account = match state.sessions.authenticate(&token).await {
        Ok(account) => account,
        Err(error) => {
            log_rejection(&error, req.uri().path());
            return Err(error.into());
        }
    };

    req.extensions_mut().insert(AccountContext::new(account));
    Ok(next.run(req).await)
}

/// Role gate; mount with `from_fn_with_state(&[Role::Admin], require_role)`
/// behind [`auth_middleware`].
pub async fn require_role(
    State(allowed): State<&'static [Role]>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(ctx) = req.extensions().get::<AccountContext>() else {
        // Gate mounted without the auth layer in front of it.
        tracing::error!(path = %req.uri().path(), "role gate reached without an authenticated account");
        return Err(AuthError::NotAuthenticated.into());
    };

    if let Err(error) = elearn_auth::require_role(ctx.account(), allowed) {
        tracing::warn!(
            account_id = %ctx.account_id(),
            role = %ctx.role(),
            path = %req.uri().path(),
            reason = error.reason(),
            "role not permitted"
        );
        return Err(error.into());
    }

    Ok(next.run(req).await)
}

/// Log an authentication rejection with its stable reason.
pub(crate) fn log_rejection(error: &AuthError, path: &str) {
    if error.is_suspicious() {
        tracing::warn!(reason = error.reason(), %path, "request rejected");
    } else {
        tracing::info!(reason = error.reason(), %path, "request rejected");
    }
}
