use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use lendgate_auth::Principal;
use lendgate_core::{DomainError, LoanId};
use lendgate_loans::{Loan, LoanStatus, LoanTerms, authorize_read, authorize_status_update};

use super::ServiceError;
use crate::store::LoanStore;

/// Loan applications: creation, review reads, and status moves.
#[derive(Clone)]
pub struct LoanService {
    loans: Arc<dyn LoanStore>,
}

impl LoanService {
    pub fn new(loans: Arc<dyn LoanStore>) -> Self {
        Self { loans }
    }

    /// Apply for a loan on behalf of the caller.
    ///
    /// Terms are taken as given; the new loan starts out pending.
    pub async fn create(&self, caller: Option<&Principal>, terms: LoanTerms) -> Result<Loan, ServiceError> {
        let caller = caller.ok_or(DomainError::Unauthorized)?;

        let loan = Loan::apply(caller.principal_id, terms, Utc::now());
        self.loans.insert(loan.clone()).await?;

        info!(loan_id = %loan.id, owner_id = %caller.principal_id, "loan application created");
        Ok(loan)
    }

    /// Every loan with its owner resolved.
    ///
    /// Who may call this is decided by the caller's route, not here.
    pub async fn list(&self) -> Result<Vec<Loan>, ServiceError> {
        Ok(self.loans.list_expanded().await?)
    }

    /// Fetch one loan for the caller, owner resolved.
    pub async fn get(&self, loan_id: LoanId, caller: Option<&Principal>) -> Result<Loan, ServiceError> {
        let loan = self
            .loans
            .find_by_id_expanded(loan_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        let caller = caller.ok_or(DomainError::Unauthorized)?;

        authorize_read(&loan, caller)?;
        Ok(loan)
    }

    /// Overwrite the loan's status. Any status may follow any other.
    pub async fn update_status(
        &self,
        loan_id: LoanId,
        status: LoanStatus,
        caller: &Principal,
    ) -> Result<Loan, ServiceError> {
        let mut loan = self
            .loans
            .find_by_id(loan_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        authorize_status_update(caller)?;

        let previous = loan.status;
        loan.set_status(status, Utc::now());
        if !self.loans.save(loan.clone()).await? {
            return Err(DomainError::NotFound.into());
        }

        info!(
            loan_id = %loan_id,
            actor_id = %caller.principal_id,
            from = %previous,
            to = %status,
            "loan status updated"
        );
        Ok(loan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lendgate_auth::{Role, User};
    use lendgate_core::UserId;
    use lendgate_loans::OwnerRef;

    use crate::store::{InMemoryStore, UserStore};

    fn terms() -> LoanTerms {
        LoanTerms {
            amount: 1000.0,
            interest_rate: 5.0,
            tenure: 12,
        }
    }

    async fn register(store: &InMemoryStore, name: &str, role: Role) -> Principal {
        let user = User::new(name, &format!("{}@example.com", name.to_lowercase()), "hash".to_string(), role, Utc::now());
        let principal = user.principal();
        UserStore::insert(store, user).await.unwrap();
        principal
    }

    async fn setup() -> (Arc<InMemoryStore>, LoanService) {
        let store = Arc::new(InMemoryStore::new());
        let service = LoanService::new(store.clone());
        (store, service)
    }

    fn domain(err: ServiceError) -> DomainError {
        match err {
            ServiceError::Domain(e) => e,
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_requires_a_caller() {
        let (_store, service) = setup().await;
        let err = service.create(None, terms()).await.unwrap_err();
        assert_eq!(domain(err), DomainError::Unauthorized);
    }

    #[tokio::test]
    async fn owner_reads_unrelated_user_is_forbidden_verifier_reads() {
        let (store, service) = setup().await;
        let u1 = register(&store, "U1", Role::User).await;
        let u2 = register(&store, "U2", Role::User).await;
        let u3 = register(&store, "U3", Role::Verifier).await;

        let loan = service.create(Some(&u1), terms()).await.unwrap();
        assert_eq!(loan.user, OwnerRef::Unexpanded(u1.principal_id));

        let read = service.get(loan.id, Some(&u1)).await.unwrap();
        assert!(read.user.is_expanded());
        assert_eq!(read.terms, terms());

        let err = service.get(loan.id, Some(&u2)).await.unwrap_err();
        assert!(matches!(domain(err), DomainError::Forbidden(_)));

        assert!(service.get(loan.id, Some(&u3)).await.is_ok());
    }

    #[tokio::test]
    async fn get_checks_existence_before_identity() {
        let (store, service) = setup().await;
        let u1 = register(&store, "U1", Role::User).await;
        let loan = service.create(Some(&u1), terms()).await.unwrap();

        let err = service.get(LoanId::new(), None).await.unwrap_err();
        assert_eq!(domain(err), DomainError::NotFound);

        let err = service.get(loan.id, None).await.unwrap_err();
        assert_eq!(domain(err), DomainError::Unauthorized);
    }

    #[tokio::test]
    async fn deleted_owner_loses_ownership_access() {
        let (store, service) = setup().await;
        let u1 = register(&store, "U1", Role::User).await;
        let admin = register(&store, "Root", Role::Admin).await;
        let loan = service.create(Some(&u1), terms()).await.unwrap();

        UserStore::delete(store.as_ref(), u1.principal_id).await.unwrap();

        let err = service.get(loan.id, Some(&u1)).await.unwrap_err();
        assert!(matches!(domain(err), DomainError::Forbidden(_)));
        assert!(service.get(loan.id, Some(&admin)).await.is_ok());
    }

    #[tokio::test]
    async fn user_tier_can_never_update_status_even_as_owner() {
        let (store, service) = setup().await;
        let owner = register(&store, "Owner", Role::User).await;
        let loan = service.create(Some(&owner), terms()).await.unwrap();

        let err = service
            .update_status(loan.id, LoanStatus::Approved, &owner)
            .await
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::Forbidden(_)));

        let stored = service.get(loan.id, Some(&owner)).await.unwrap();
        assert_eq!(stored.status, LoanStatus::Pending);
    }

    #[tokio::test]
    async fn admin_overwrites_status_unconditionally() {
        let (store, service) = setup().await;
        let owner = register(&store, "Owner", Role::User).await;
        let admin = register(&store, "Admin", Role::Admin).await;
        let loan = service.create(Some(&owner), terms()).await.unwrap();

        for status in [LoanStatus::Approved, LoanStatus::Approved, LoanStatus::Rejected, LoanStatus::Approved] {
            let updated = service.update_status(loan.id, status, &admin).await.unwrap();
            assert_eq!(updated.status, status);
        }

        let stored = service.get(loan.id, Some(&admin)).await.unwrap();
        assert_eq!(stored.status, LoanStatus::Approved);
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test]
    async fn update_on_missing_loan_is_not_found_even_for_user_tier() {
        let (_store, service) = setup().await;
        let nobody = Principal::new(UserId::new(), Role::User);

        let err = service
            .update_status(LoanId::new(), LoanStatus::Rejected, &nobody)
            .await
            .unwrap_err();
        assert_eq!(domain(err), DomainError::NotFound);
    }

    #[tokio::test]
    async fn list_resolves_every_owner() {
        let (store, service) = setup().await;
        let a = register(&store, "A", Role::User).await;
        let b = register(&store, "B", Role::User).await;
        service.create(Some(&a), terms()).await.unwrap();
        service.create(Some(&b), terms()).await.unwrap();

        let loans = service.list().await.unwrap();
        assert_eq!(loans.len(), 2);
        for loan in loans {
            match loan.user {
                OwnerRef::Expanded(owner) => assert!(owner.email.ends_with("@example.com")),
                OwnerRef::Unexpanded(id) => panic!("owner {id} was not expanded"),
            }
        }
    }

    /// Serves one loan on reads but holds nothing to write to.
    struct VanishedLoanStore {
        loan: Loan,
    }

    #[async_trait::async_trait]
    impl LoanStore for VanishedLoanStore {
        async fn insert(&self, _loan: Loan) -> Result<(), crate::store::StoreError> {
            Ok(())
        }
        async fn find_by_id(&self, _id: LoanId) -> Result<Option<Loan>, crate::store::StoreError> {
            Ok(Some(self.loan.clone()))
        }
        async fn find_by_id_expanded(&self, _id: LoanId) -> Result<Option<Loan>, crate::store::StoreError> {
            Ok(Some(self.loan.clone()))
        }
        async fn list_expanded(&self) -> Result<Vec<Loan>, crate::store::StoreError> {
            Ok(Vec::new())
        }
        async fn save(&self, _loan: Loan) -> Result<bool, crate::store::StoreError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn status_update_on_vanished_loan_is_not_found() {
        let loan = Loan::apply(UserId::new(), terms(), Utc::now());
        let loan_id = loan.id;
        let service = LoanService::new(Arc::new(VanishedLoanStore { loan }));
        let admin = Principal::new(UserId::new(), Role::Admin);

        let err = service
            .update_status(loan_id, LoanStatus::Approved, &admin)
            .await
            .unwrap_err();
        assert_eq!(domain(err), DomainError::NotFound);
    }
}
