//! Routing-layer role gates.
//!
//! These run in the handler before any service call. Rules that depend on the
//! record being touched (loan ownership, status updates) live in the domain.

use lendgate_auth::{AuthzError, Role, authorize, require_privileged};

use crate::context::PrincipalContext;

/// Admit the caller only if their current role is one of `allowed`.
pub fn require_role(principal: &PrincipalContext, allowed: &[Role]) -> Result<(), AuthzError> {
    authorize(&principal.principal(), allowed)
}

/// Admit admins and verifiers.
pub fn require_staff(principal: &PrincipalContext) -> Result<(), AuthzError> {
    require_privileged(&principal.principal())
}
