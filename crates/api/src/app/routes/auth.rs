use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return dto::body_rejection(e),
    };

    match services.accounts.register(body.into()).await {
        Ok(registered) => (StatusCode::CREATED, Json(dto::authenticated_to_json(registered))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return dto::body_rejection(e),
    };

    match services.accounts.login(&body.email, &body.password).await {
        Ok(auth) => (StatusCode::OK, Json(dto::authenticated_to_json(auth))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
