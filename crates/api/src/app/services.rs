use std::sync::Arc;

use lendgate_auth::Hs256Jwt;
use lendgate_infra::{AccountService, InMemoryStore, LoanService, LoanStore, RoleTransitionService, UserStore};

use crate::config::ApiConfig;

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: AccountService,
    pub loans: LoanService,
    pub roles: RoleTransitionService,
    pub jwt: Arc<Hs256Jwt>,
}

pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    if config.use_persistent_stores {
        #[cfg(feature = "postgres")]
        {
            return build_persistent_services(config).await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory"
            );
        }
    }

    Ok(build_in_memory_services(config))
}

fn build_in_memory_services(config: &ApiConfig) -> AppServices {
    let store = Arc::new(InMemoryStore::new());
    wire(config, store.clone(), store)
}

#[cfg(feature = "postgres")]
async fn build_persistent_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    use anyhow::Context;
    use lendgate_infra::store::PostgresStore;

    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;

    let store = PostgresStore::connect(url)
        .await
        .context("failed to connect to postgres")?;
    store.migrate().await.context("failed to apply schema")?;
    tracing::info!("using postgres stores");

    let store = Arc::new(store);
    Ok(wire(config, store.clone(), store))
}

fn wire(config: &ApiConfig, users: Arc<dyn UserStore>, loans: Arc<dyn LoanStore>) -> AppServices {
    let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes(), config.jwt_ttl));

    AppServices {
        accounts: AccountService::new(users.clone(), jwt.clone(), config.registration.clone()),
        loans: LoanService::new(loans),
        roles: RoleTransitionService::new(users, config.deletion_policy),
        jwt,
    }
}
