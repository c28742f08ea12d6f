//! Infrastructure layer: persistence backends and the application services that
//! drive the domain state machines against them.

pub mod services;
pub mod store;

pub use services::{
    AccountService, AuthenticatedUser, LoanService, RegisterUser, RoleTransitionService,
    ServiceError,
};
pub use store::{InMemoryStore, LoanStore, StoreError, UserStore};
