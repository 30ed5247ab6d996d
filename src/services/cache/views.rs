use async_trait::async_trait;
use std::{sync::Arc, time::Duration};

use crate::services::cache::client::{CacheClient, CacheResult};

/// Cache of rendered views, keyed by request path.
///
/// `revalidate(path)` drops the cached rendering so the next read is fresh.
#[async_trait]
pub trait ViewCache: Send + Sync {
    async fn get(&self, path: &str) -> CacheResult<Option<String>>;

    async fn put(&self, path: &str, body: &str) -> CacheResult<()>;

    async fn revalidate(&self, path: &str) -> CacheResult<()>;
}

/// `ViewCache` on top of any `CacheClient` backend.
#[derive(Clone)]
pub struct CachedViews<C: CacheClient> {
    cache: Arc<C>,
    // Key prefix to avoid collisions with other users of the same backend
    prefix: String,
    ttl: Duration,
}

impl<C: CacheClient> CachedViews<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            ttl,
        }
    }

    pub fn key(&self, path: &str) -> String {
        format!("{}:{}", self.prefix, path)
    }

    pub fn backend_name(&self) -> &'static str {
        self.cache.backend_name()
    }
}

#[async_trait]
impl<C: CacheClient> ViewCache for CachedViews<C> {
    async fn get(&self, path: &str) -> CacheResult<Option<String>> {
        self.cache.get_string(&self.key(path)).await
    }

    async fn put(&self, path: &str, body: &str) -> CacheResult<()> {
        self.cache
            .set_string_with_ttl(&self.key(path), body, self.ttl)
            .await
    }

    async fn revalidate(&self, path: &str) -> CacheResult<()> {
        let removed = self.cache.del(&self.key(path)).await?;
        tracing::debug!(
            path,
            removed,
            backend = self.backend_name(),
            "view revalidated"
        );
        Ok(())
    }
}
