//! Application services: load a record, let the domain decide, persist the result.
//!
//! ```text
//! request → authorization check → state transition → persisted write → response
//! ```
//!
//! A failed decision never reaches the store. Store failures are passed through
//! untouched for the boundary to translate.

use thiserror::Error;

use lendgate_auth::{PasswordError, TokenError};
use lendgate_core::DomainError;

use crate::store::StoreError;

pub mod accounts;
pub mod loans;
pub mod role_transitions;

pub use accounts::{AccountService, AuthenticatedUser, RegisterUser};
pub use loans::LoanService;
pub use role_transitions::RoleTransitionService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenError),

    /// Unknown email or wrong password (deliberately indistinguishable).
    #[error("invalid email or password")]
    InvalidCredentials,
}

impl ServiceError {
    /// The domain error, if this failure is a domain decision.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            _ => None,
        }
    }
}
