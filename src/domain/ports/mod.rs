//! Port definitions for the loader and the persistent cache.

mod content_cache_port;
mod file_loader_port;

pub use content_cache_port::{CacheError, CacheResult, ContentCachePort};
pub use file_loader_port::{
    FileLoader, FileLoaderFactory, LoaderRequest, LoaderStatus, LoaderTarget,
};
