//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: codec, session manager and collaborator wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and input helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Extension, Router};
use tower::ServiceBuilder;

use elearn_auth::Role;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod passwords;
pub mod routes;
pub mod services;

const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests). Everything is served under `/api/v1`.
pub fn build_app(services: Arc<AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        sessions: services.sessions.clone(),
    };

    // Role gate sits inside the auth layer: route_layer wraps outward.
    let admin = routes::admin::router().route_layer(from_fn_with_state(ADMIN_ONLY, middleware::require_role));

    let protected = routes::protected_router()
        .merge(admin)
        .route_layer(from_fn_with_state(auth_state, middleware::auth_middleware));

    let api = routes::public_router()
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)));

    Router::new().nest("/api/v1", api)
}

pub use services::AppServices;
