//! Files served through the web-document proxy.

use std::sync::Arc;

use super::remote::{RemoteKind, RemoteSource};
use crate::domain::entities::{CacheKey, Size, WebFileLocation};
use crate::domain::ports::{FileLoaderFactory, LoaderTarget};

/// Identity of a proxied web file.
#[derive(Debug, Clone)]
pub struct WebCached {
    location: WebFileLocation,
    shrink_box: Size,
    width: u32,
    height: u32,
    size: u64,
}

/// A source backed by the web-document proxy.
pub type WebCachedSource = RemoteSource<WebCached>;

impl WebCachedSource {
    /// Creates a source that shrinks the image into `shrink_box`.
    pub fn with_box(
        location: WebFileLocation,
        shrink_box: Size,
        size: u64,
        factory: Arc<dyn FileLoaderFactory>,
    ) -> Self {
        Self::with_kind(
            WebCached {
                location,
                shrink_box,
                width: 0,
                height: 0,
                size,
            },
            factory,
        )
    }

    /// Creates a source with dimensions known up front.
    pub fn with_dimensions(
        location: WebFileLocation,
        width: u32,
        height: u32,
        size: u64,
        factory: Arc<dyn FileLoaderFactory>,
    ) -> Self {
        Self::with_kind(
            WebCached {
                location,
                shrink_box: Size::new(width, height),
                width,
                height,
                size,
            },
            factory,
        )
    }
}

impl RemoteKind for WebCached {
    fn cache_key(&self) -> Option<CacheKey> {
        (!self.location.is_null()).then(|| CacheKey::web_document(&self.location, self.shrink_box))
    }

    fn shrink_box(&self) -> Size {
        self.shrink_box
    }

    fn loader_target(&self) -> Option<LoaderTarget> {
        (!self.location.is_null()).then(|| LoaderTarget::WebFile {
            location: self.location.clone(),
            size: self.size,
        })
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bytes_size(&self) -> u64 {
        self.size
    }

    fn set_information(&mut self, size: u64, width: u32, height: u32) {
        if size != 0 {
            self.size = size;
        }
        if width != 0 && height != 0 {
            self.width = width;
            self.height = height;
        }
    }
}
