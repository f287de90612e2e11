//! Use case implementations.

mod fetch_image_use_case;

pub use fetch_image_use_case::{FetchError, FetchImageUseCase};
