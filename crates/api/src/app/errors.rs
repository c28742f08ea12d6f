use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use lendgate_auth::AuthzError;
use lendgate_core::DomainError;
use lendgate_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::InvalidCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        ),
        ServiceError::Store(e) => internal_error("store_error", &e),
        ServiceError::Password(e) => internal_error("password_error", &e),
        ServiceError::Token(e) => internal_error("token_error", &e),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "unauthorized", "unauthorized"),
        DomainError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        DomainError::InvalidTransition(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_transition", msg)
        }
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn unauthorized(message: impl Into<String>) -> axum::response::Response {
    json_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

// Details stay in the log; the client gets a generic message.
fn internal_error(code: &'static str, err: &dyn std::error::Error) -> axum::response::Response {
    tracing::error!(error = %err, code, "request failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, code, "internal server error")
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
