//! Fetch result DTOs.

use crate::domain::entities::CacheKey;

/// What a completed fetch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Key the bytes are stored under, if the source is persisted.
    pub cache_key: Option<CacheKey>,
    /// Decoded width in pixels.
    pub width: u32,
    /// Decoded height in pixels.
    pub height: u32,
    /// Size of the raw bytes.
    pub bytes_size: u64,
    /// True if the bytes are in the content cache after the fetch.
    pub cached: bool,
}

impl std::fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}, {} bytes", self.width, self.height, self.bytes_size)?;
        match self.cache_key {
            Some(key) if self.cached => write!(f, ", cached as {key}"),
            Some(key) => write!(f, ", not cached ({key})"),
            None => write!(f, ", not cacheable"),
        }
    }
}
