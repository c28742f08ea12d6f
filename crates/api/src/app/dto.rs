use std::str::FromStr;

use serde::Deserialize;

use lendgate_core::DomainError;
use lendgate_infra::{AuthenticatedUser, RegisterUser};
use lendgate_loans::{LoanStatus, LoanTerms};

use crate::app::errors;
use crate::context::PrincipalContext;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

impl From<RegisterRequest> for RegisterUser {
    fn from(body: RegisterRequest) -> Self {
        RegisterUser {
            name: body.name,
            email: body.email,
            password: body.password,
            role: body.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    pub amount: f64,
    pub interest_rate: f64,
    pub tenure: u32,
}

impl From<CreateLoanRequest> for LoanTerms {
    fn from(body: CreateLoanRequest) -> Self {
        LoanTerms {
            amount: body.amount,
            interest_rate: body.interest_rate,
            tenure: body.tenure,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateLoanStatusRequest {
    pub status: String,
}

// -------------------------
// Response mapping
// -------------------------

pub fn authenticated_to_json(auth: AuthenticatedUser) -> serde_json::Value {
    serde_json::json!({
        "id": auth.user.id.to_string(),
        "name": auth.user.name,
        "email": auth.user.email,
        "role": auth.user.role.as_str(),
        "token": auth.token,
    })
}

pub fn principal_to_json(principal: &PrincipalContext) -> serde_json::Value {
    serde_json::json!({
        "id": principal.principal_id().to_string(),
        "name": principal.name(),
        "email": principal.email(),
        "role": principal.role().as_str(),
    })
}

// -------------------------
// Path/body parsing
// -------------------------

/// Parse a typed id from a path segment, answering 400 `invalid_id` when malformed.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(errors::domain_error_to_response)
}

pub fn parse_status(raw: &str) -> Result<LoanStatus, axum::response::Response> {
    raw.trim()
        .to_lowercase()
        .parse::<LoanStatus>()
        .map_err(errors::domain_error_to_response)
}

/// Map a body extraction failure onto the common error shape.
pub fn body_rejection(rejection: axum::extract::rejection::JsonRejection) -> axum::response::Response {
    errors::domain_error_to_response(DomainError::validation(rejection.body_text()))
}
