use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use lendgate_auth::{
    PasswordError, RegistrationPolicy, TokenIssuer, User, hash_password, normalize_email, verify_password,
};
use lendgate_core::{DomainError, UserId};

use super::ServiceError;
use crate::store::{StoreError, UserStore};

/// Self-service signup request.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Requested tier; `None` means the default `user` tier.
    pub role: Option<String>,
}

/// An account together with a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

/// Signup, login and account lookup.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenIssuer>,
    policy: RegistrationPolicy,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenIssuer>, policy: RegistrationPolicy) -> Self {
        Self { users, tokens, policy }
    }

    pub async fn register(&self, request: RegisterUser) -> Result<AuthenticatedUser, ServiceError> {
        let email = normalize_email(&request.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::conflict("user already exists").into());
        }

        let role = self.policy.assign_role(request.role.as_deref(), &email)?;
        let password_hash = hash_blocking(request.password).await?;
        let user = User::new(request.name, &email, password_hash, role, Utc::now());

        // The email may have been claimed between the lookup and the insert.
        match self.users.insert(user.clone()).await {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(DomainError::conflict("user already exists").into());
            }
            Err(e) => return Err(e.into()),
        }

        let token = self.tokens.issue(user.id, Utc::now())?;
        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(AuthenticatedUser { user, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, ServiceError> {
        let Some(user) = self.users.find_by_email(&normalize_email(email)).await? else {
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, Utc::now())?;
        info!(user_id = %user.id, "user logged in");
        Ok(AuthenticatedUser { user, token })
    }

    /// Current state of an account, if it still exists.
    pub async fn find(&self, user_id: UserId) -> Result<Option<User>, ServiceError> {
        Ok(self.users.find_by_id(user_id).await?)
    }
}

// Argon2 blocks the calling thread; run it on the blocking pool.
async fn hash_blocking(plain: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| PasswordError::Hash(e.to_string()))?
}

async fn verify_blocking(plain: String, stored: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &stored))
        .await
        .map_err(|e| PasswordError::Hash(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use lendgate_auth::{Hs256Jwt, JwtValidator, Role};

    use crate::store::InMemoryStore;

    fn service() -> (AccountService, Arc<Hs256Jwt>) {
        let jwt = Arc::new(Hs256Jwt::new(b"test-secret", Duration::hours(1)));
        let service = AccountService::new(
            Arc::new(InMemoryStore::new()),
            jwt.clone(),
            RegistrationPolicy::default(),
        );
        (service, jwt)
    }

    fn request(email: &str, role: Option<&str>) -> RegisterUser {
        RegisterUser {
            name: "  Ada Lovelace ".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            role: role.map(str::to_string),
        }
    }

    fn domain(err: ServiceError) -> DomainError {
        match err {
            ServiceError::Domain(e) => e,
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_issues_token_for_new_account() {
        let (service, jwt) = service();

        let registered = service.register(request(" Ada@Example.com ", None)).await.unwrap();
        assert_eq!(registered.user.email, "ada@example.com");
        assert_eq!(registered.user.name, "Ada Lovelace");
        assert_eq!(registered.user.role, Role::User);
        assert_ne!(registered.user.password_hash, "correct horse");

        let claims = jwt.validate(&registered.token, Utc::now()).unwrap();
        assert_eq!(claims.sub, registered.user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let (service, _) = service();
        service.register(request("ada@example.com", None)).await.unwrap();

        let err = service.register(request("ADA@example.com", None)).await.unwrap_err();
        assert!(matches!(domain(err), DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn privileged_signup_needs_matching_suffix() {
        let (service, _) = service();

        let err = service.register(request("ada@example.com", Some("admin"))).await.unwrap_err();
        assert!(matches!(domain(err), DomainError::Forbidden(_)));

        let admin = service.register(request("ops.admin@gmail.com", Some("admin"))).await.unwrap();
        assert_eq!(admin.user.role, Role::Admin);

        let verifier = service
            .register(request("desk.verifier@gmail.com", Some("verifier")))
            .await
            .unwrap();
        assert_eq!(verifier.user.role, Role::Verifier);
    }

    #[tokio::test]
    async fn login_accepts_right_password_only() {
        let (service, _) = service();
        let registered = service.register(request("ada@example.com", None)).await.unwrap();

        let logged_in = service.login("ADA@example.com", "correct horse").await.unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let err = service.login("ada@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));

        let err = service.login("nobody@example.com", "correct horse").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn find_reflects_current_state() {
        let (service, _) = service();
        let registered = service.register(request("ada@example.com", None)).await.unwrap();

        let found = service.find(registered.user.id).await.unwrap().unwrap();
        assert_eq!(found, registered.user);
        assert!(service.find(UserId::new()).await.unwrap().is_none());
    }
}
