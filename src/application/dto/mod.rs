//! Data transfer objects for the application layer.

mod fetch_outcome;

pub use fetch_outcome::FetchOutcome;
