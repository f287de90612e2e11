//! Loaders that fetch bytes for remote sources.

pub mod endpoints;
pub mod http_loader;

pub use http_loader::{HttpFileLoader, HttpLoaderFactory};
