//! Persistent content cache adapters.

pub mod disk_cache;

pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskContentCache};
