use lendgate_core::UserId;

use crate::Role;

/// An authenticated caller, as seen by authorization decisions.
///
/// The role is whatever the account holds at the time of the request, not what
/// it held when the token was minted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub principal_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(principal_id: UserId, role: Role) -> Self {
        Self { principal_id, role }
    }

    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}
