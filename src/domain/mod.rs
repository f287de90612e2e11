//! Domain layer with core entities, image sources, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Domain services.
pub mod services;
/// Image sources.
pub mod sources;

pub use entities::{CacheKey, FileOrigin, Size};
pub use errors::LoaderError;
pub use ports::{ContentCachePort, FileLoader, FileLoaderFactory};
pub use sources::{AnySource, Source};
