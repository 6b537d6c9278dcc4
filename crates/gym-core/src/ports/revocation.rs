//! Token revocation port.

use std::time::Duration;

use async_trait::async_trait;

use super::cache::CacheError;

/// Denylist of token ids that must no longer be accepted.
///
/// Entries only need to live as long as the token they block.
#[async_trait]
pub trait RevocationList: Send + Sync {
    async fn revoke(&self, token_id: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn is_revoked(&self, token_id: &str) -> Result<bool, CacheError>;
}
