use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, put},
    Json, Router,
};

use lendgate_auth::Role;
use lendgate_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/promote/:id", put(promote_user))
        .route("/demote/:id", put(demote_user))
        .route("/:id", delete(delete_user))
}

pub async fn promote_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user_id = match admin_target(&principal, &id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.roles.promote(user_id).await {
        Ok(role) => role_changed("promoted", role),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn demote_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user_id = match admin_target(&principal, &id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.roles.demote(user_id).await {
        Ok(role) => role_changed("demoted", role),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let user_id = match admin_target(&principal, &id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.roles.delete_account(user_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "User deleted successfully." })),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Gate on the admin role, then parse the target account id.
fn admin_target(principal: &PrincipalContext, raw_id: &str) -> Result<UserId, axum::response::Response> {
    authz::require_role(principal, &[Role::Admin]).map_err(errors::authz_error_to_response)?;
    dto::parse_id(raw_id)
}

fn role_changed(verb: &str, role: Role) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": format!("User {verb} to {role} successfully."),
            "role": role.as_str(),
        })),
    )
        .into_response()
}
