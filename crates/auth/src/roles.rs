use core::str::FromStr;

use serde::{Deserialize, Serialize};

use lendgate_core::DomainError;

/// Role tier held by a user.
///
/// Tiers are totally ordered (`User < Verifier < Admin`) and a user moves one tier
/// at a time; see [`Role::promoted`] and [`Role::demoted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Verifier,
    Admin,
}

impl Role {
    /// Every tier, lowest first.
    pub const ALL: [Role; 3] = [Role::User, Role::Verifier, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Verifier => "verifier",
            Role::Admin => "admin",
        }
    }

    /// The next tier up, or `None` at the top.
    pub fn promoted(self) -> Option<Role> {
        match self {
            Role::User => Some(Role::Verifier),
            Role::Verifier => Some(Role::Admin),
            Role::Admin => None,
        }
    }

    /// The next tier down, or `None` at the bottom.
    pub fn demoted(self) -> Option<Role> {
        match self {
            Role::Admin => Some(Role::Verifier),
            Role::Verifier => Some(Role::User),
            Role::User => None,
        }
    }

    /// Privileged callers may review any loan and move its status.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Verifier)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "verifier" => Ok(Role::Verifier),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}
