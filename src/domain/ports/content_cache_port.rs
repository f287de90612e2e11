//! Port definition for the persistent content cache.

use bytes::Bytes;

use crate::domain::entities::CacheKey;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// Entry not found in cache.
    #[error("Entry not found: {0}")]
    NotFound(String),
    /// Failed to decode cached content.
    #[error("Decode error: {0}")]
    DecodeError(String),
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
}

/// Key-value store of raw image bytes.
/// Implementations must be thread-safe.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentCachePort: Send + Sync {
    /// Returns the stored bytes, or None if not cached.
    async fn get(&self, key: &CacheKey) -> Option<Bytes>;

    /// Stores bytes under the key, replacing any previous entry.
    async fn put(&self, key: CacheKey, bytes: Bytes) -> CacheResult<()>;

    /// Returns true if the key is cached.
    async fn contains(&self, key: &CacheKey) -> bool;

    /// Removes an entry.
    async fn evict(&self, key: &CacheKey);

    /// Removes every entry.
    async fn clear(&self) -> CacheResult<()>;

    /// Returns the current number of entries.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
