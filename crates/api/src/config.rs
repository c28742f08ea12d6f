//! Process configuration read from environment variables.

use std::net::SocketAddr;

use anyhow::{Context, bail};
use chrono::Duration;

use lendgate_auth::{DeletionPolicy, RegistrationPolicy};

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    /// Select the PostgreSQL backend (requires the `postgres` feature).
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub deletion_policy: DeletionPolicy,
    pub registration: RegistrationPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_ttl: Duration::hours(720),
            use_persistent_stores: false,
            database_url: None,
            deletion_policy: DeletionPolicy::default(),
            registration: RegistrationPolicy::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("BIND_ADDR is not a socket address: {addr}"))?;
        }

        match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        if let Some(hours) = lookup("JWT_TTL_HOURS") {
            let hours: i64 = hours
                .parse()
                .with_context(|| format!("JWT_TTL_HOURS is not an integer: {hours}"))?;
            if hours <= 0 {
                bail!("JWT_TTL_HOURS must be positive, got {hours}");
            }
            config.jwt_ttl = Duration::hours(hours);
        }

        if let Some(flag) = lookup("USE_PERSISTENT_STORES") {
            config.use_persistent_stores = flag
                .parse()
                .with_context(|| format!("USE_PERSISTENT_STORES must be true or false: {flag}"))?;
        }
        config.database_url = lookup("DATABASE_URL");
        if config.use_persistent_stores && config.database_url.is_none() {
            bail!("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        }

        if let Some(policy) = lookup("ACCOUNT_DELETION_POLICY") {
            config.deletion_policy = policy
                .parse()
                .context("ACCOUNT_DELETION_POLICY is invalid")?;
        }

        if let Some(suffix) = lookup("ADMIN_EMAIL_SUFFIX") {
            config.registration.admin_email_suffix = suffix;
        }
        if let Some(suffix) = lookup("VERIFIER_EMAIL_SUFFIX") {
            config.registration.verifier_email_suffix = suffix;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<ApiConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.jwt_secret, "dev-secret");
        assert_eq!(config.jwt_ttl, Duration::days(30));
        assert!(!config.use_persistent_stores);
        assert_eq!(config.deletion_policy, DeletionPolicy::Unrestricted);
        assert_eq!(config.registration, RegistrationPolicy::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = from_pairs(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_HOURS", "2"),
            ("ACCOUNT_DELETION_POLICY", "admins-only"),
            ("ADMIN_EMAIL_SUFFIX", "@ops.example.com"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.jwt_ttl, Duration::hours(2));
        assert_eq!(config.deletion_policy, DeletionPolicy::AdminsOnly);
        assert_eq!(config.registration.admin_email_suffix, "@ops.example.com");
        assert_eq!(config.registration.verifier_email_suffix, "verifier@gmail.com");
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = from_pairs(&[("JWT_TTL_HOURS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("JWT_TTL_HOURS"));

        let err = from_pairs(&[("ACCOUNT_DELETION_POLICY", "never")]).unwrap_err();
        assert!(err.to_string().contains("ACCOUNT_DELETION_POLICY"));

        let err = from_pairs(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }
}
