//! Domain error types.

mod loader_error;

pub use loader_error::LoaderError;
