//! Cache client interface used by higher-level services (view cache, etc.).
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command).
///
/// Note:
/// - We keep this independent from `AppError` so callers can decide how to fail.
///   The view cache is best-effort: a failure there never fails a request.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// A minimal, string-based cache interface.
///
/// Implementations must be cheap to clone (typically `Arc<...>` inside).
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // Returns the cache backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Get UTF-8 string value.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    // Set value with TTL, overwriting any existing value.
    async fn set_string_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    // Delete a key. Returns number of deleted keys.
    async fn del(&self, key: &str) -> CacheResult<u64>;
}

/// Convenience helper to build a TTL from seconds.
pub fn ttl_seconds(seconds: u64) -> Duration {
    Duration::from_secs(seconds)
}
