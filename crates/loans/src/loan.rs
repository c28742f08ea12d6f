use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lendgate_core::{DomainError, Entity, LoanId, UserId};

/// Loan status lifecycle.
///
/// Moves between members are unrestricted: any privileged caller may set any
/// status from any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
        }
    }
}

impl core::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LoanStatus::Pending),
            "approved" => Ok(LoanStatus::Approved),
            "rejected" => Ok(LoanStatus::Rejected),
            other => Err(DomainError::validation(format!("unknown loan status '{other}'"))),
        }
    }
}

/// Owner attributes exposed when a loan is listed or fetched for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerProjection {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Reference from a loan to the account that applied for it.
///
/// Stores hand back `Unexpanded` unless asked to resolve the owner. An owner that
/// cannot be resolved (e.g. the account was deleted) also stays `Unexpanded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OwnerRef {
    Unexpanded(UserId),
    Expanded(OwnerProjection),
}

impl OwnerRef {
    /// The owner's id, whichever form the reference is in.
    pub fn id(&self) -> UserId {
        match self {
            OwnerRef::Unexpanded(id) => *id,
            OwnerRef::Expanded(owner) => owner.id,
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, OwnerRef::Expanded(_))
    }
}

/// Caller-supplied loan terms. Accepted as given and immutable once applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    pub amount: f64,
    pub interest_rate: f64,
    /// Term length in months.
    pub tenure: u32,
}

/// A loan application.
///
/// # Invariants
/// - The owner never changes after the application is created.
/// - Terms never change after the application is created.
/// - Only [`Loan::set_status`] mutates state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: LoanId,
    pub user: OwnerRef,
    #[serde(flatten)]
    pub terms: LoanTerms,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// A fresh application owned by `owner`, in the initial status.
    pub fn apply(owner: UserId, terms: LoanTerms, now: DateTime<Utc>) -> Self {
        Self {
            id: LoanId::new(),
            user: OwnerRef::Unexpanded(owner),
            terms,
            status: LoanStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn owner_id(&self) -> UserId {
        self.user.id()
    }

    /// Overwrite the status. No transition table is consulted.
    pub fn set_status(&mut self, status: LoanStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }

    /// Replace the owner reference with its resolved form.
    ///
    /// Ignored when `owner` belongs to a different account.
    pub fn expand_owner(&mut self, owner: OwnerProjection) {
        if owner.id == self.owner_id() {
            self.user = OwnerRef::Expanded(owner);
        }
    }
}

impl Entity for Loan {
    type Id = LoanId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
