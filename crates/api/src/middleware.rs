use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use lendgate_auth::JwtValidator;
use lendgate_infra::AccountService;

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub accounts: AccountService,
}

/// Resolve the bearer token to a live account and attach it to the request.
///
/// The token only names the account; its role is read from the store so that
/// tier changes and deletions apply to tokens already handed out.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())?;

    let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        errors::unauthorized("invalid or expired token")
    })?;

    let user = state
        .accounts
        .find(claims.sub)
        .await
        .map_err(errors::service_error_to_response)?
        .ok_or_else(|| errors::unauthorized("account no longer exists"))?;

    req.extensions_mut().insert(PrincipalContext::from_user(&user));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, Response> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| errors::unauthorized("missing bearer token"))?;

    let header = header
        .to_str()
        .map_err(|_| errors::unauthorized("malformed authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| errors::unauthorized("malformed authorization header"))?
        .trim();

    if token.is_empty() {
        return Err(errors::unauthorized("missing bearer token"));
    }

    Ok(token)
}
