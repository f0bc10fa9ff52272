use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use skylane_core::cache::TokenStore;
use skylane_core::provider::ProviderResult;
use skylane_core::{CoreError, CoreResult};

pub const AMADEUS_TOKEN_KEY: &str = "amadeus:access_token";

// Cache for slightly less than the provider-reported lifetime so a token
// never expires mid-request.
const EXPIRY_BUFFER_SECS: u64 = 60;
const MIN_TTL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// The OAuth2 client-credentials exchange, abstracted so the cache can be
/// exercised without a network.
#[async_trait]
pub trait OAuthTokenSource: Send + Sync {
    async fn exchange(&self) -> ProviderResult<IssuedToken>;
}

/// Two-state token cache: no-token / has-token(value, expiry).
///
/// The backing store enforces TTL expiry itself; this component treats it
/// as plain get/set/delete. Concurrent refreshes may race and fetch a
/// token redundantly, which is accepted (the exchange is idempotent).
pub struct AmadeusTokenCache {
    store: Arc<dyn TokenStore>,
    source: Arc<dyn OAuthTokenSource>,
}

impl AmadeusTokenCache {
    pub fn new(store: Arc<dyn TokenStore>, source: Arc<dyn OAuthTokenSource>) -> Self {
        Self { store, source }
    }

    /// Cached token if present, otherwise a fresh exchange. Exchange
    /// failure is terminal here; the surrounding client decides whether
    /// to retry the whole operation.
    pub async fn get_token(&self) -> ProviderResult<String> {
        match self.store.get(AMADEUS_TOKEN_KEY).await {
            Ok(Some(token)) => {
                debug!("using cached Amadeus access token");
                return Ok(token);
            }
            Ok(None) => {}
            Err(err) => warn!("token store read failed, fetching fresh token: {err}"),
        }

        info!("no cached Amadeus token, requesting a new one");
        let issued = self.source.exchange().await?;
        let ttl = issued
            .expires_in
            .saturating_sub(EXPIRY_BUFFER_SECS)
            .max(MIN_TTL_SECS);
        if let Err(err) = self
            .store
            .set_with_ttl(AMADEUS_TOKEN_KEY, &issued.access_token, ttl)
            .await
        {
            warn!("failed to cache Amadeus token: {err}");
        }
        Ok(issued.access_token)
    }

    /// Drop the cached token so the next `get_token` performs a fresh
    /// exchange. Called after any 401 from a downstream Amadeus call.
    pub async fn invalidate(&self) {
        if let Err(err) = self.store.delete(AMADEUS_TOKEN_KEY).await {
            warn!("failed to invalidate Amadeus token: {err}");
        } else {
            info!("Amadeus access token invalidated");
        }
    }
}

/// In-process `TokenStore` for tests and single-instance deployments
/// that run without Redis.
#[derive(Default)]
pub struct InMemoryTokenStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> CoreResult<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CoreResult<()> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> CoreError {
    CoreError::Internal("token store lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        expires_in: u64,
    }

    impl CountingSource {
        fn new(expires_in: u64) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                expires_in,
            })
        }
    }

    #[async_trait]
    impl OAuthTokenSource for CountingSource {
        async fn exchange(&self) -> ProviderResult<IssuedToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(IssuedToken {
                access_token: format!("tok-{n}"),
                expires_in: self.expires_in,
            })
        }
    }

    /// Store wrapper that records the TTLs it was asked to apply.
    struct RecordingStore {
        inner: InMemoryTokenStore,
        ttls: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl TokenStore for RecordingStore {
        async fn get(&self, key: &str) -> CoreResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set_with_ttl(&self, key: &str, value: &str, ttl_seconds: u64) -> CoreResult<()> {
            self.ttls.lock().unwrap().push(ttl_seconds);
            self.inner.set_with_ttl(key, value, ttl_seconds).await
        }

        async fn delete(&self, key: &str) -> CoreResult<()> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_hits_cache() {
        let source = CountingSource::new(1799);
        let cache = AmadeusTokenCache::new(Arc::new(InMemoryTokenStore::new()), source.clone());

        let first = cache.get_token().await.unwrap();
        let second = cache.get_token().await.unwrap();

        assert_eq!(first, "tok-1");
        assert_eq!(second, "tok-1");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_one_new_exchange() {
        let source = CountingSource::new(1799);
        let cache = AmadeusTokenCache::new(Arc::new(InMemoryTokenStore::new()), source.clone());

        assert_eq!(cache.get_token().await.unwrap(), "tok-1");
        cache.invalidate().await;
        assert_eq!(cache.get_token().await.unwrap(), "tok-2");
        assert_eq!(cache.get_token().await.unwrap(), "tok-2");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ttl_has_buffer_and_floor() {
        let store = Arc::new(RecordingStore {
            inner: InMemoryTokenStore::new(),
            ttls: Mutex::new(Vec::new()),
        });

        // Normal lifetime: buffer subtracted.
        let cache = AmadeusTokenCache::new(store.clone(), CountingSource::new(1800));
        cache.get_token().await.unwrap();
        // Short lifetime: floored at 300s.
        cache.invalidate().await;
        let cache = AmadeusTokenCache::new(store.clone(), CountingSource::new(120));
        cache.get_token().await.unwrap();

        let ttls = store.ttls.lock().unwrap().clone();
        assert_eq!(ttls, vec![1740, 300]);
    }
}
