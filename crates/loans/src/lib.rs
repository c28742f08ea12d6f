//! Loans domain module.
//!
//! Loan applications, the owner reference they carry, and the rules deciding who
//! may read a loan and who may move its status. Pure domain logic (no IO, no HTTP,
//! no storage).

pub mod access;
pub mod loan;

pub use access::{authorize_read, authorize_status_update};
pub use loan::{Loan, LoanStatus, LoanTerms, OwnerProjection, OwnerRef};
