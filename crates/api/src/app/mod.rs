//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store backend selection and service construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    let auth_state = middleware::AuthState {
        jwt: services.jwt.clone(),
        accounts: services.accounts.clone(),
    };

    // Protected routes: require a bearer token naming a live account.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = routes::public_router().merge(protected);

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .layer(ServiceBuilder::new().layer(Extension(services))))
}
