use async_trait::async_trait;

use lendgate_auth::{User, normalize_email};
use lendgate_core::{LoanId, UserId};
use lendgate_loans::{Loan, OwnerProjection, OwnerRef};

use super::{InMemoryTable, LoanStore, StoreError, UserStore};

/// In-memory backend holding both users and loans (tests/dev).
///
/// Loans are kept with a bare owner id; owners are resolved on read against the
/// user table, so a deleted owner reads back as unexpanded.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: InMemoryTable<User>,
    loans: InMemoryTable<Loan>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn expand(&self, mut loan: Loan) -> Result<Loan, StoreError> {
        if let Some(owner) = self.users.get(&loan.owner_id())? {
            loan.expand_owner(OwnerProjection {
                id: owner.id,
                name: owner.name,
                email: owner.email,
            });
        }
        Ok(loan)
    }
}

fn collapse(mut loan: Loan) -> Loan {
    loan.user = OwnerRef::Unexpanded(loan.owner_id());
    loan
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.users.get(&id)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        self.users.find(|u| u.email == email)
    }

    async fn insert(&self, user: User) -> Result<(), StoreError> {
        let email = user.email.clone();
        self.users
            .insert_unique(user, |existing| existing.email == email)
            .map_err(|e| match e {
                StoreError::Duplicate(_) => StoreError::Duplicate(format!("email {email}")),
                other => other,
            })
    }

    async fn save(&self, user: User) -> Result<bool, StoreError> {
        self.users.update(user)
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        self.users.remove(&id)
    }
}

#[async_trait]
impl LoanStore for InMemoryStore {
    async fn insert(&self, loan: Loan) -> Result<(), StoreError> {
        self.loans.insert_unique(collapse(loan), |_| false)
    }

    async fn find_by_id(&self, id: LoanId) -> Result<Option<Loan>, StoreError> {
        self.loans.get(&id)
    }

    async fn find_by_id_expanded(&self, id: LoanId) -> Result<Option<Loan>, StoreError> {
        self.loans.get(&id)?.map(|loan| self.expand(loan)).transpose()
    }

    async fn list_expanded(&self) -> Result<Vec<Loan>, StoreError> {
        let mut loans = self.loans.list()?;
        loans.sort_by_key(|l| (l.created_at, *l.id.as_uuid()));
        loans.into_iter().map(|loan| self.expand(loan)).collect()
    }

    async fn save(&self, loan: Loan) -> Result<bool, StoreError> {
        self.loans.update(collapse(loan))
    }
}
