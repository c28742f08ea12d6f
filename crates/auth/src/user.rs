//! User entity and the role tier machine.
//!
//! A user climbs or descends one tier at a time. Transitions are pure state
//! changes on an already-loaded record; persistence is the caller's concern.

use core::str::FromStr;

use chrono::{DateTime, Utc};

use lendgate_core::{DomainError, DomainResult, Entity, UserId};

use crate::{Principal, Role};

/// A registered account.
///
/// # Invariants
/// - `role` is always one of the three tiers.
/// - `email` is stored trimmed and lowercased.
/// - Role changes happen only through [`User::promote`] and [`User::demote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: &str,
        password_hash: String,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            name: name.into().trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role,
            created_at,
        }
    }

    /// Move one tier up and return the new role.
    ///
    /// Fails without touching `self` when already at the top tier.
    pub fn promote(&mut self) -> DomainResult<Role> {
        let next = self
            .role
            .promoted()
            .ok_or_else(|| DomainError::invalid_transition("user is already an admin"))?;
        self.role = next;
        Ok(next)
    }

    /// Move one tier down and return the new role.
    ///
    /// Fails without touching `self` when already at the bottom tier.
    pub fn demote(&mut self) -> DomainResult<Role> {
        let next = self
            .role
            .demoted()
            .ok_or_else(|| DomainError::invalid_transition("user is already at the lowest role"))?;
        self.role = next;
        Ok(next)
    }

    /// Decide whether this account may be deleted under `policy`.
    pub fn ensure_deletable(&self, policy: DeletionPolicy) -> DomainResult<()> {
        match policy {
            DeletionPolicy::Unrestricted => Ok(()),
            DeletionPolicy::AdminsOnly if self.role == Role::Admin => Ok(()),
            DeletionPolicy::AdminsOnly => Err(DomainError::invariant("user is not an admin")),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Which accounts the delete operation may remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletionPolicy {
    /// Any account may be deleted.
    #[default]
    Unrestricted,
    /// Only accounts currently holding the admin tier may be deleted.
    AdminsOnly,
}

impl FromStr for DeletionPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unrestricted" => Ok(DeletionPolicy::Unrestricted),
            "admins-only" | "admins_only" => Ok(DeletionPolicy::AdminsOnly),
            other => Err(DomainError::validation(format!(
                "unknown deletion policy '{other}' (expected 'unrestricted' or 'admins-only')"
            ))),
        }
    }
}
