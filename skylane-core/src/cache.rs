use async_trait::async_trait;

use crate::CoreResult;

/// Plain key/value store with TTL expiry, injected into the components
/// that need process-wide caching (the Amadeus token cache). This is not
/// a lock: concurrent callers may race and write redundantly, which the
/// consumers tolerate.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> CoreResult<Option<String>>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> CoreResult<()>;

    async fn delete(&self, key: &str) -> CoreResult<()>;
}
