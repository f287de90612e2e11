//! Infrastructure layer with external service adapters.

/// Persistent content cache.
pub mod cache;
/// Application configuration.
pub mod config;
/// Byte loaders for remote sources.
pub mod loader;

pub use cache::DiskContentCache;
pub use config::{AppConfig, CliArgs, Command, ConfigStorage, LogLevel};
pub use loader::{HttpFileLoader, HttpLoaderFactory};
