//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use gym_core::domain::{AccessPolicy, Role, StaffMember, mask_identifier};
use gym_core::ports::{
    Cache, CredentialStore, PasswordService, RateLimiter, RevocationList, TokenService,
};
use gym_core::services::{CacheRevocationList, LoginService, RequestAuthenticator};
use gym_infra::{
    Argon2PasswordService, InMemoryCache, InMemoryCredentialStore, InMemoryRateLimiter,
    JwtTokenService, PostgresCredentialStore, RedisCache, RedisRateLimiter,
};

use crate::config::{AppConfig, SeedAdmin};

/// Shared application state.
///
/// Everything in here is either immutable after startup or synchronizes
/// internally; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub passwords: Arc<dyn PasswordService>,
    pub login: Arc<LoginService>,
    pub authenticator: Arc<RequestAuthenticator>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub trust_proxy_headers: bool,
}

/// Collaborators the state is assembled from.
pub struct Components {
    pub store: Arc<dyn CredentialStore>,
    pub cache: Arc<dyn Cache>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub policy: AccessPolicy,
    pub lookup_timeout: Duration,
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Wire the services together from already-built collaborators.
    pub fn assemble(components: Components) -> anyhow::Result<Self> {
        let Components {
            store,
            cache,
            rate_limiter,
            tokens,
            passwords,
            policy,
            lookup_timeout,
            trust_proxy_headers,
        } = components;

        let revocations: Arc<dyn RevocationList> = Arc::new(CacheRevocationList::new(cache));

        let login = LoginService::new(store.clone(), passwords.clone(), tokens.clone())
            .context("Failed to initialise login service")?;

        let authenticator =
            RequestAuthenticator::new(tokens, store.clone(), revocations, policy, lookup_timeout);

        Ok(Self {
            store,
            passwords,
            login: Arc::new(login),
            authenticator: Arc::new(authenticator),
            rate_limiter,
            trust_proxy_headers,
        })
    }

    /// Build the application state with implementations chosen by configuration.
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let tokens: Arc<dyn TokenService> =
            Arc::new(JwtTokenService::new(config.jwt.clone()).context("Invalid JWT configuration")?);

        let passwords: Arc<dyn PasswordService> = Arc::new(
            Argon2PasswordService::with_config(config.password)
                .context("Invalid Argon2 parameters")?,
        );

        let store: Arc<dyn CredentialStore> = match &config.database {
            Some(db_config) => {
                let conn = gym_infra::database::connect(db_config)
                    .await
                    .context("Failed to connect to credential database")?;
                Arc::new(PostgresCredentialStore::new(conn))
            }
            None => {
                tracing::warn!("DATABASE_URL not set. Using in-memory credential store.");
                Arc::new(InMemoryCredentialStore::new())
            }
        };

        let (cache, rate_limiter) = Self::build_shared_backends(config).await?;

        let state = Self::assemble(Components {
            store,
            cache,
            rate_limiter,
            tokens,
            passwords,
            policy: AccessPolicy::default(),
            lookup_timeout: config.lookup_timeout,
            trust_proxy_headers: config.trust_proxy_headers,
        })?;

        if let Some(seed) = &config.seed_admin {
            state.seed_admin(seed).await?;
        }

        tracing::info!("Application state initialized");
        Ok(state)
    }

    async fn build_shared_backends(
        config: &AppConfig,
    ) -> anyhow::Result<(Arc<dyn Cache>, Arc<dyn RateLimiter>)> {
        let in_memory = || -> anyhow::Result<(Arc<dyn Cache>, Arc<dyn RateLimiter>)> {
            let limiter = InMemoryRateLimiter::new(config.rate_limit.clone())
                .context("Invalid rate limit configuration")?;
            Ok((Arc::new(InMemoryCache::new()), Arc::new(limiter)))
        };

        let Some(redis) = &config.redis else {
            tracing::info!("REDIS_URL not set. Revocations and rate limits are per-process.");
            return in_memory();
        };

        let connected = async {
            let cache = RedisCache::new(redis).await?;
            let limiter = RedisRateLimiter::new(redis, config.rate_limit.clone()).await?;
            anyhow::Ok((
                Arc::new(cache) as Arc<dyn Cache>,
                Arc::new(limiter) as Arc<dyn RateLimiter>,
            ))
        }
        .await;

        match connected {
            Ok(backends) => Ok(backends),
            Err(e) if redis.fallback_to_memory => {
                tracing::error!(error = %e, "Redis unavailable. Falling back to in-memory backends.");
                in_memory()
            }
            Err(e) => Err(e.context("Failed to connect to Redis")),
        }
    }

    /// Create or reset the bootstrap administrator.
    pub async fn seed_admin(&self, seed: &SeedAdmin) -> anyhow::Result<()> {
        let hash = self
            .passwords
            .hash(&seed.secret)
            .context("Failed to hash seed administrator secret")?;

        self.store
            .save(StaffMember::new(seed.identifier.clone(), hash, Role::Admin))
            .await
            .context("Failed to store seed administrator")?;

        tracing::info!(
            identifier = %mask_identifier(&seed.identifier),
            "Seed administrator provisioned"
        );
        Ok(())
    }
}
