//! Redis-backed cache, so that a logout on one server instance is seen by all.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};

use gym_core::ports::{Cache, CacheError};

const DEFAULT_NAMESPACE: &str = "gymgate";

/// Redis connection settings, shared by the revocation cache and the login
/// rate limiter.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Prefix for every key this service writes.
    pub namespace: String,
    /// Use per-process backends when Redis cannot be reached at startup.
    pub fallback_to_memory: bool,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(5),
            namespace: DEFAULT_NAMESPACE.to_string(),
            fallback_to_memory: true,
        }
    }

    /// `None` when `REDIS_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let mut config = Self::new(std::env::var("REDIS_URL").ok()?);

        if let Some(secs) = std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Ok(ns) = std::env::var("REDIS_NAMESPACE") {
            config.namespace = ns;
        }
        if let Ok(flag) = std::env::var("REDIS_FALLBACK_TO_MEMORY") {
            config.fallback_to_memory = matches!(flag.as_str(), "true" | "1");
        }
        Some(config)
    }

    pub(crate) fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

/// Why a Redis connection could not be opened.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConnectError {
    #[error("invalid Redis URL: {0}")]
    Url(#[source] RedisError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Redis(#[from] RedisError),
}

/// Open a managed (auto-reconnecting) connection, bounded by the configured timeout.
pub(crate) async fn connect(config: &RedisConfig) -> Result<ConnectionManager, ConnectError> {
    let client = Client::open(config.url.as_str()).map_err(ConnectError::Url)?;

    let conn = tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
        .await
        .map_err(|_| ConnectError::Timeout(config.connect_timeout))??;
    Ok(conn)
}

fn op_failed(op: &'static str) -> impl Fn(RedisError) -> CacheError {
    move |e| {
        tracing::warn!(op, error = %e, "Redis command failed");
        CacheError::Operation(e.to_string())
    }
}

pub struct RedisCache {
    conn: ConnectionManager,
    config: RedisConfig,
}

impl RedisCache {
    pub async fn new(config: &RedisConfig) -> Result<Self, CacheError> {
        let conn = connect(config)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;
        tracing::info!(namespace = %config.namespace, "Connected to Redis cache");

        Ok(Self {
            conn,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = self.config.key(key);

        match ttl {
            // PSETEX rejects 0; a sub-millisecond entry still has to land.
            Some(ttl) => {
                let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
                conn.pset_ex::<_, _, ()>(key, value, millis)
                    .await
                    .map_err(op_failed("PSETEX"))
            }
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(op_failed("SET")),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        conn.exists(self.config.key(key))
            .await
            .map_err(op_failed("EXISTS"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_cache() -> Option<RedisCache> {
        let mut config = RedisConfig::new(
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6389".to_string()),
        );
        config.connect_timeout = Duration::from_secs(1);
        config.namespace = format!("gymgate-test-{}", uuid::Uuid::new_v4());

        RedisCache::new(&config).await.ok()
    }

    #[test]
    fn test_keys_are_namespaced() {
        let config = RedisConfig::new("redis://localhost");
        assert_eq!(config.key("revoked:abc"), "gymgate:revoked:abc");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_connection_error() {
        let mut config = RedisConfig::new("redis://127.0.0.1:1");
        config.connect_timeout = Duration::from_millis(200);

        let result = RedisCache::new(&config).await;
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }

    #[tokio::test]
    async fn test_revocation_marker_expires() {
        let Some(cache) = test_cache().await else {
            return;
        };

        cache
            .set("revoked:jti-1", "1", Some(Duration::from_millis(500)))
            .await
            .unwrap();
        assert!(cache.exists("revoked:jti-1").await.unwrap());
        assert!(!cache.exists("revoked:jti-2").await.unwrap());

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert!(!cache.exists("revoked:jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_marker_without_ttl_persists() {
        let Some(cache) = test_cache().await else {
            return;
        };

        cache.set("k", "v", None).await.unwrap();
        assert!(cache.exists("k").await.unwrap());
    }
}
