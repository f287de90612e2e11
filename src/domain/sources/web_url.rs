//! Images at arbitrary web addresses.

use std::sync::Arc;

use super::remote::{RemoteKind, RemoteSource};
use crate::domain::entities::{CacheKey, Size};
use crate::domain::ports::{FileLoaderFactory, LoaderTarget};

/// Identity of an image at a web address.
#[derive(Debug, Clone)]
pub struct WebUrl {
    url: String,
    shrink_box: Size,
    width: u32,
    height: u32,
    size: u64,
}

/// A source backed by a plain URL.
pub type WebUrlSource = RemoteSource<WebUrl>;

impl WebUrlSource {
    /// Creates a source. A non-empty `shrink_box` makes the loaded image
    /// fit inside it.
    pub fn new(url: impl Into<String>, shrink_box: Size, factory: Arc<dyn FileLoaderFactory>) -> Self {
        Self::with_kind(
            WebUrl {
                url: url.into(),
                shrink_box,
                width: 0,
                height: 0,
                size: 0,
            },
            factory,
        )
    }

    /// Creates a source with dimensions known up front.
    pub fn with_dimensions(
        url: impl Into<String>,
        width: u32,
        height: u32,
        factory: Arc<dyn FileLoaderFactory>,
    ) -> Self {
        Self::with_kind(
            WebUrl {
                url: url.into(),
                shrink_box: Size::new(width, height),
                width,
                height,
                size: 0,
            },
            factory,
        )
    }

    /// The address being loaded.
    pub fn url(&self) -> &str {
        &self.kind().url
    }
}

impl RemoteKind for WebUrl {
    fn cache_key(&self) -> Option<CacheKey> {
        (!self.url.is_empty()).then(|| CacheKey::url(&self.url, self.shrink_box))
    }

    fn shrink_box(&self) -> Size {
        self.shrink_box
    }

    fn loader_target(&self) -> Option<LoaderTarget> {
        (!self.url.is_empty()).then(|| LoaderTarget::Url(self.url.clone()))
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
