use thiserror::Error;

use lendgate_core::DomainError;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{actual}' is not one of {allowed:?}")]
    RoleNotAllowed { actual: Role, allowed: Vec<Role> },

    #[error("forbidden: admin or verifier role required")]
    NotPrivileged,
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::forbidden(value.to_string())
    }
}

/// Check that the principal holds one of the allowed roles.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotAllowed {
            actual: principal.role,
            allowed: allowed.to_vec(),
        })
    }
}

/// Check that the principal is an admin or a verifier.
pub fn require_privileged(principal: &Principal) -> Result<(), AuthzError> {
    if principal.is_privileged() {
        Ok(())
    } else {
        Err(AuthzError::NotPrivileged)
    }
}
