use std::sync::Arc;

use tracing::info;

use lendgate_auth::{DeletionPolicy, Role, User};
use lendgate_core::{DomainError, DomainResult, UserId};

use super::ServiceError;
use crate::store::UserStore;

/// Tier promotion/demotion and account deletion.
///
/// Each transition is one read and at most one write. There is no version check
/// between them: two concurrent transitions on the same account may both read
/// the same starting tier, and the later write wins.
#[derive(Clone)]
pub struct RoleTransitionService {
    users: Arc<dyn UserStore>,
    deletion_policy: DeletionPolicy,
}

impl RoleTransitionService {
    pub fn new(users: Arc<dyn UserStore>, deletion_policy: DeletionPolicy) -> Self {
        Self {
            users,
            deletion_policy,
        }
    }

    pub fn deletion_policy(&self) -> DeletionPolicy {
        self.deletion_policy
    }

    /// Move the account one tier up and return the new tier.
    pub async fn promote(&self, user_id: UserId) -> Result<Role, ServiceError> {
        let role = self.transition(user_id, User::promote).await?;
        info!(user_id = %user_id, role = %role, "user promoted");
        Ok(role)
    }

    /// Move the account one tier down and return the new tier.
    pub async fn demote(&self, user_id: UserId) -> Result<Role, ServiceError> {
        let role = self.transition(user_id, User::demote).await?;
        info!(user_id = %user_id, role = %role, "user demoted");
        Ok(role)
    }

    /// Remove the account, subject to the configured [`DeletionPolicy`].
    pub async fn delete_account(&self, user_id: UserId) -> Result<(), ServiceError> {
        let user = self.load(user_id).await?;
        user.ensure_deletable(self.deletion_policy)?;

        if !self.users.delete(user_id).await? {
            return Err(DomainError::NotFound.into());
        }

        info!(user_id = %user_id, role = %user.role, "account deleted");
        Ok(())
    }

    async fn transition(
        &self,
        user_id: UserId,
        step: fn(&mut User) -> DomainResult<Role>,
    ) -> Result<Role, ServiceError> {
        let mut user = self.load(user_id).await?;
        let role = step(&mut user)?;
        // The account may have been deleted since it was loaded.
        if !self.users.save(user).await? {
            return Err(DomainError::NotFound.into());
        }
        Ok(role)
    }

    async fn load(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::store::{InMemoryStore, StoreError};

    /// Wraps the in-memory store and counts writes.
    ///
    /// With `delete_before_save` set, the account is removed just ahead of each
    /// write, as if a concurrent delete won the race.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryStore,
        saves: AtomicUsize,
        delete_before_save: AtomicBool,
    }

    #[async_trait]
    impl UserStore for CountingStore {
        async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
            UserStore::find_by_id(&self.inner, id).await
        }
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_email(email).await
        }
        async fn insert(&self, user: User) -> Result<(), StoreError> {
            UserStore::insert(&self.inner, user).await
        }
        async fn save(&self, user: User) -> Result<bool, StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.delete_before_save.load(Ordering::SeqCst) {
                self.inner.delete(user.id).await?;
            }
            UserStore::save(&self.inner, user).await
        }
        async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
            self.inner.delete(id).await
        }
    }

    async fn seeded(role: Role, policy: DeletionPolicy) -> (Arc<CountingStore>, RoleTransitionService, UserId) {
        let store = Arc::new(CountingStore::default());
        let user = User::new("Dana", "dana@example.com", "hash".to_string(), role, Utc::now());
        let id = user.id;
        store.insert(user).await.unwrap();
        let service = RoleTransitionService::new(store.clone(), policy);
        (store, service, id)
    }

    async fn role_of(store: &CountingStore, id: UserId) -> Role {
        store.find_by_id(id).await.unwrap().unwrap().role
    }

    #[tokio::test]
    async fn promote_three_times_from_user() {
        let (store, service, id) = seeded(Role::User, DeletionPolicy::Unrestricted).await;

        assert_eq!(service.promote(id).await.unwrap(), Role::Verifier);
        assert_eq!(service.promote(id).await.unwrap(), Role::Admin);

        let err = service.promote(id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidTransition(_))));
        assert_eq!(role_of(&store, id).await, Role::Admin);
        assert_eq!(store.saves.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn demote_at_bottom_fails_without_writing() {
        let (store, service, id) = seeded(Role::User, DeletionPolicy::Unrestricted).await;

        let err = service.demote(id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvalidTransition(_))));
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
        assert_eq!(role_of(&store, id).await, Role::User);
    }

    #[tokio::test]
    async fn promote_then_demote_restores_original_tier() {
        let (store, service, id) = seeded(Role::Verifier, DeletionPolicy::Unrestricted).await;

        service.promote(id).await.unwrap();
        service.demote(id).await.unwrap();
        assert_eq!(role_of(&store, id).await, Role::Verifier);

        service.demote(id).await.unwrap();
        service.promote(id).await.unwrap();
        assert_eq!(role_of(&store, id).await, Role::Verifier);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let (_store, service, _id) = seeded(Role::User, DeletionPolicy::Unrestricted).await;
        let missing = UserId::new();

        for result in [
            service.promote(missing).await.map(|_| ()),
            service.demote(missing).await.map(|_| ()),
            service.delete_account(missing).await,
        ] {
            assert!(matches!(result.unwrap_err().as_domain(), Some(DomainError::NotFound)));
        }
    }

    #[tokio::test]
    async fn unrestricted_policy_deletes_any_tier() {
        let (store, service, id) = seeded(Role::User, DeletionPolicy::Unrestricted).await;

        service.delete_account(id).await.unwrap();
        assert_eq!(store.find_by_id(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn admins_only_policy_keeps_non_admins() {
        let (store, service, id) = seeded(Role::Verifier, DeletionPolicy::AdminsOnly).await;

        let err = service.delete_account(id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::InvariantViolation(_))));
        assert!(store.find_by_id(id).await.unwrap().is_some());

        service.promote(id).await.unwrap();
        service.delete_account(id).await.unwrap();
        assert!(store.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transition_racing_a_delete_does_not_recreate_the_account() {
        let (store, service, id) = seeded(Role::User, DeletionPolicy::Unrestricted).await;
        store.delete_before_save.store(true, Ordering::SeqCst);

        let err = service.promote(id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(DomainError::NotFound)));
        assert_eq!(store.find_by_id(id).await.unwrap(), None);
    }
}
