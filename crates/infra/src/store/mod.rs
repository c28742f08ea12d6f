//! Persistence seams for users and loans.
//!
//! Every operation is a single-record read or write; nothing here spans records
//! or holds a lock between a read and a later write.

use async_trait::async_trait;
use thiserror::Error;

use lendgate_auth::User;
use lendgate_core::{LoanId, UserId};
use lendgate_loans::Loan;

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod table;

pub use in_memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
pub use table::InMemoryTable;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique attribute (e.g. email) is already taken.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Look up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new account; `Duplicate` if the email is taken.
    async fn insert(&self, user: User) -> Result<(), StoreError>;

    /// Overwrite an existing account. Returns `false` (and writes nothing) when
    /// the account no longer exists.
    async fn save(&self, user: User) -> Result<bool, StoreError>;

    /// Remove an account. Returns whether a record was removed.
    async fn delete(&self, id: UserId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn insert(&self, loan: Loan) -> Result<(), StoreError>;

    /// Load a loan with its owner left as a bare id.
    async fn find_by_id(&self, id: LoanId) -> Result<Option<Loan>, StoreError>;

    /// Load a loan with its owner resolved to `{ id, name, email }` when possible.
    async fn find_by_id_expanded(&self, id: LoanId) -> Result<Option<Loan>, StoreError>;

    /// All loans, owners resolved, oldest first.
    async fn list_expanded(&self) -> Result<Vec<Loan>, StoreError>;

    /// Overwrite an existing loan. Returns `false` (and writes nothing) when the
    /// loan no longer exists.
    async fn save(&self, loan: Loan) -> Result<bool, StoreError>;
}
