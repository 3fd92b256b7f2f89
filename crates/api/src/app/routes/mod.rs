use axum::{
    routing::{get, post, put},
    Router,
};

pub mod accounts;
pub mod admin;
pub mod courses;
pub mod session;
pub mod system;

/// Endpoints reachable without an access credential.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/registration", post(accounts::registration))
        .route("/activate-user", post(accounts::activate))
        .route("/login", post(session::login))
        .route("/socialAuth", post(session::social_auth))
        .route("/refresh", get(session::refresh))
}

/// Endpoints behind the auth middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/logout", get(session::logout))
        .route("/me", get(accounts::me))
        .route("/update-user-info", put(accounts::update_info))
        .route("/update-user-password", put(accounts::update_password))
        .route("/get-course-content/:id", get(courses::content))
}
