use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::dto;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(dto::principal_to_json(&principal))
}
