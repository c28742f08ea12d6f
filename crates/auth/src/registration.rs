//! Signup role policy.
//!
//! Self-service signup may only claim a privileged tier when the email address
//! carries the matching reserved suffix.

use lendgate_core::{DomainError, DomainResult};

use crate::{Role, normalize_email};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPolicy {
    pub admin_email_suffix: String,
    pub verifier_email_suffix: String,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            admin_email_suffix: "admin@gmail.com".to_string(),
            verifier_email_suffix: "verifier@gmail.com".to_string(),
        }
    }
}

impl RegistrationPolicy {
    pub fn new(admin_email_suffix: impl Into<String>, verifier_email_suffix: impl Into<String>) -> Self {
        Self {
            admin_email_suffix: admin_email_suffix.into(),
            verifier_email_suffix: verifier_email_suffix.into(),
        }
    }

    /// Decide the initial tier for a signup request.
    ///
    /// No requested role (or `"user"`) always yields [`Role::User`]. A privileged
    /// request is honoured only for a matching email suffix; anything else is
    /// refused rather than silently downgraded.
    pub fn assign_role(&self, requested: Option<&str>, email: &str) -> DomainResult<Role> {
        let email = normalize_email(email);

        match requested.map(str::trim) {
            None | Some("") | Some("user") => Ok(Role::User),
            Some("admin") if email.ends_with(&self.admin_email_suffix.to_lowercase()) => Ok(Role::Admin),
            Some("verifier") if email.ends_with(&self.verifier_email_suffix.to_lowercase()) => {
                Ok(Role::Verifier)
            }
            Some(_) => Err(DomainError::forbidden(
                "invalid role or email not authorized for role",
            )),
        }
    }
}
