//! Per-process cache, used for revocations when Redis is not configured.
//!
//! Entries are lost on restart and are not shared between instances, so a
//! logout only holds on the instance that served it.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use gym_core::ports::{Cache, CacheError};

/// Expired entries are swept once the map has grown this much past its last sweep.
const SWEEP_GROWTH: usize = 1024;

#[derive(Default)]
struct Entries {
    map: HashMap<String, (String, Option<Instant>)>,
    sweep_at: usize,
}

impl Entries {
    fn is_live(&self, key: &str, now: Instant) -> bool {
        self.map
            .get(key)
            .is_some_and(|(_, expiry)| expiry.is_none_or(|at| now < at))
    }

    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.map.len();
        self.map
            .retain(|_, (_, expiry)| expiry.is_none_or(|at| now < at));
        self.sweep_at = self.map.len() + SWEEP_GROWTH;
        before - self.map.len()
    }
}

#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<Entries>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many went.
    pub async fn purge_expired(&self) -> usize {
        self.entries.write().await.sweep(Instant::now())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.map.len()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if entries.map.len() >= entries.sweep_at {
            let swept = entries.sweep(now);
            tracing::trace!(swept, "Swept expired cache entries");
        }
        entries
            .map
            .insert(key.to_string(), (value.to_string(), ttl.map(|ttl| now + ttl)));
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries.is_live(key, Instant::now()))
    }
}
