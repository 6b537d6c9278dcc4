use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::ports::{Cache, CacheError, RevocationList};

const KEY_PREFIX: &str = "revoked";

/// Revocation list stored in any [`Cache`] backend.
pub struct CacheRevocationList {
    cache: Arc<dyn Cache>,
}

impl CacheRevocationList {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    fn key(token_id: &str) -> String {
        format!("{KEY_PREFIX}:{token_id}")
    }
}

#[async_trait]
impl RevocationList for CacheRevocationList {
    async fn revoke(&self, token_id: &str, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Ok(());
        }
        self.cache.set(&Self::key(token_id), "1", Some(ttl)).await
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool, CacheError> {
        self.cache.exists(&Self::key(token_id)).await
    }
}
