//! In-process cache client.
//!
//! Used when no Valkey URL is configured (local development, tests).
//! Not shared between processes; entries expire lazily on read.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::services::cache::client::{CacheClient, CacheResult};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCacheClient {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryCacheClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheClient for MemoryCacheClient {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let entries = self.entries.read().await;
        let value = entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone());
        Ok(value)
    }

    async fn set_string_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        // Drop whatever has expired while we hold the write lock.
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(key).map_or(0, |_| 1))
    }
}
