pub mod client;
pub mod memory;
pub mod valkey;
pub mod views;

pub use client::{CacheClient, CacheError, CacheResult, ttl_seconds};
pub use memory::MemoryCacheClient;
pub use valkey::ValkeyClient;
pub use views::{CachedViews, ViewCache};
