use axum::{Router, routing::get};

pub mod admin;
pub mod auth;
pub mod loans;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new().nest("/auth", auth::router())
}

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/loans", loans::router())
        .nest("/admin", admin::router())
}
