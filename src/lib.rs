//! Image sources - polymorphic image acquisition with stable cache keys.
//!
//! A source hides where image bytes come from (memory, a local file, or a
//! remote blob fetched through a loader) behind one contract for loading,
//! cancelling, reporting progress and dimensions, and producing a cache key
//! with the bytes to persist under it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases and DTOs.
pub mod application;
/// Domain layer containing entities, sources, and port definitions.
pub mod domain;
/// Infrastructure layer containing the cache, loaders, and configuration.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "image-sources";
