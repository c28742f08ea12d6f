use lendgate_auth::{Principal, Role, User};
use lendgate_core::UserId;

/// Authenticated caller for a request, as loaded from the store.
///
/// Built fresh on every request, so a promotion or deletion takes effect on
/// the caller's next call regardless of when their token was minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: UserId,
    role: Role,
    name: String,
    email: String,
}

impl PrincipalContext {
    pub fn from_user(user: &User) -> Self {
        Self {
            principal_id: user.id,
            role: user.role,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }

    pub fn principal_id(&self) -> UserId {
        self.principal_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.principal_id, self.role)
    }
}
