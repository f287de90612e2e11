//! Domain entity definitions.

mod cache_key;
mod geometry;
mod location;
mod origin;

pub use cache_key::{
    CacheKey, GEO_POINT_CACHE_TAG, STORAGE_CACHE_TAG, URL_CACHE_TAG, WEB_DOCUMENT_CACHE_TAG,
};
pub use geometry::Size;
pub use location::{GeoPointLocation, StorageFileLocation, StorageImageLocation, WebFileLocation};
pub use origin::{FileOrigin, LoadFromCloud};
