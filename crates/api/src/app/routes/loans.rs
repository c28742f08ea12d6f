use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use lendgate_auth::Role;
use lendgate_core::LoanId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_loans).post(apply_for_loan))
        .route("/:id", get(get_loan))
        .route("/:id/status", put(update_loan_status))
}

pub async fn apply_for_loan(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateLoanRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require_role(&principal, &[Role::User]) {
        return errors::authz_error_to_response(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return dto::body_rejection(e),
    };

    match services.loans.create(Some(&principal.principal()), body.into()).await {
        Ok(loan) => (StatusCode::CREATED, Json(loan)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_loans(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require_staff(&principal) {
        return errors::authz_error_to_response(e);
    }

    match services.loans.list().await {
        Ok(loans) => (StatusCode::OK, Json(loans)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_loan(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let loan_id: LoanId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.loans.get(loan_id, Some(&principal.principal())).await {
        Ok(loan) => (StatusCode::OK, Json(loan)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Any authenticated caller may reach this; the privilege check happens after
/// the loan is found, so a missing loan is 404 for everyone.
pub async fn update_loan_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateLoanStatusRequest>, JsonRejection>,
) -> axum::response::Response {
    let loan_id: LoanId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return dto::body_rejection(e),
    };
    let status = match dto::parse_status(&body.status) {
        Ok(s) => s,
        Err(res) => return res,
    };

    match services
        .loans
        .update_status(loan_id, status, &principal.principal())
        .await
    {
        Ok(loan) => (StatusCode::OK, Json(loan)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
