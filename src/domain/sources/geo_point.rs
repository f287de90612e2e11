//! Rendered map tiles.

use std::sync::Arc;

use super::remote::{RemoteKind, RemoteSource};
use crate::domain::entities::{CacheKey, GeoPointLocation, Size};
use crate::domain::ports::{FileLoaderFactory, LoaderTarget};

/// Identity of a map tile.
#[derive(Debug, Clone)]
pub struct GeoPoint {
    location: GeoPointLocation,
    size: u64,
}

/// A source backed by a map tile renderer.
pub type GeoPointSource = RemoteSource<GeoPoint>;

impl GeoPointSource {
    /// Creates a source for the tile.
    pub fn new(location: GeoPointLocation, factory: Arc<dyn FileLoaderFactory>) -> Self {
        Self::with_kind(GeoPoint { location, size: 0 }, factory)
    }
}

impl RemoteKind for GeoPoint {
    fn cache_key(&self) -> Option<CacheKey> {
        Some(CacheKey::geo_point(&self.location))
    }

    fn shrink_box(&self) -> Size {
        Size::EMPTY
    }

    fn loader_target(&self) -> Option<LoaderTarget> {
        Some(LoaderTarget::GeoPoint {
            location: self.location,
            size: self.size,
        })
    }

    fn width(&self) -> u32 {
        self.location.pixel_size().width
    }

    fn height(&self) -> u32 {
        self.location.pixel_size().height
    }

    fn bytes_size(&self) -> u64 {
        self.size
    }

    // Dimensions are fixed by the location; only the size is learned.
    fn set_information(&mut self, size: u64, _width: u32, _height: u32) {
        if size != 0 {
            self.size = size;
        }
    }
}
