//! Domain services.

pub mod image_decoder;
