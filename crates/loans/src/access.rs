//! Who may read a loan and who may move its status.

use lendgate_auth::{Principal, require_privileged};
use lendgate_core::{DomainError, DomainResult};

use crate::{Loan, OwnerRef};

/// Decide whether `principal` may read `loan`.
///
/// Privileged callers may read any loan. Anyone else must be the owner, and
/// ownership is only established against an expanded owner reference: an
/// unresolved owner never grants access.
pub fn authorize_read(loan: &Loan, principal: &Principal) -> DomainResult<()> {
    if principal.is_privileged() {
        return Ok(());
    }

    match &loan.user {
        OwnerRef::Expanded(owner) if owner.id == principal.principal_id => Ok(()),
        OwnerRef::Expanded(_) => Err(DomainError::forbidden("access denied")),
        OwnerRef::Unexpanded(_) => Err(DomainError::forbidden(
            "access denied: loan owner could not be resolved",
        )),
    }
}

/// Decide whether `principal` may overwrite a loan's status.
///
/// Ownership is irrelevant here; only the caller's tier counts.
pub fn authorize_status_update(principal: &Principal) -> DomainResult<()> {
    require_privileged(principal)?;
    Ok(())
}
