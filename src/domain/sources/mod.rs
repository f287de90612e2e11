//! Image sources.
//!
//! A source hides where image bytes come from: an already decoded image, a
//! file on disk, or one of several kinds of remote blob. Every source
//! answers the same questions (is it loading, how far along, how big, what
//! is its cache key) and produces the bytes to persist under that key.
//!
//! Remote sources share one state machine, [`RemoteSource`], and differ only
//! in their [`RemoteKind`]: the identity they carry, how it maps to a
//! [`CacheKey`], and which loader target it resolves to.

mod geo_point;
mod in_memory;
mod local_file;
mod remote;
mod storage;
mod web_cached;
mod web_url;

use std::sync::Arc;

use bytes::Bytes;
use image::DynamicImage;

use crate::domain::entities::{CacheKey, FileOrigin, StorageImageLocation};

pub use geo_point::{GeoPoint, GeoPointSource};
pub use in_memory::ImageSource;
pub use local_file::LocalFileSource;
pub use remote::{RemoteKind, RemoteSource};
pub use storage::{StorageBlob, StorageSource};
pub use web_cached::{WebCached, WebCachedSource};
pub use web_url::{WebUrl, WebUrlSource};

/// Uniform contract of every image source.
///
/// No method blocks on the network or fails: a load that goes wrong shows
/// up as a source that is not loading and has nothing to hand out.
pub trait Source: Send {
    /// Begins acquisition unless cancelled. Repeated calls do not start
    /// another fetch.
    fn load(&mut self, origin: &FileOrigin);

    /// Like [`Source::load`], but clears a previous cancellation first.
    fn load_even_cancelled(&mut self, origin: &FileOrigin);

    /// Returns the decoded image if it is available.
    fn take_loaded(&mut self) -> Option<Arc<DynamicImage>>;

    /// Releases decoded image and raw bytes, keeping identity.
    fn unload(&mut self);

    /// True while a loader is active.
    fn loading(&self) -> bool;

    /// True while a loading indicator should be shown.
    fn display_loading(&self) -> bool;

    /// Stops loading. Cancellation sticks until
    /// [`Source::load_even_cancelled`].
    fn cancel(&mut self);

    /// Completion fraction in `[0.0, 1.0]`.
    fn progress(&self) -> f64;

    /// Bytes retrieved so far.
    fn load_offset(&self) -> u64;

    /// The storage location, if the source has one.
    fn location(&self) -> Option<&StorageImageLocation>;

    /// Replaces a stale access token embedded in the location.
    fn refresh_file_reference(&mut self, data: &[u8]);

    /// Key for the persistent cache, if the source is ever persisted.
    fn cache_key(&self) -> Option<CacheKey>;

    /// Resolves a placeholder storage location.
    fn set_delayed_storage_location(&mut self, location: StorageImageLocation);

    /// Replays a load requested before the location was resolved.
    fn perform_delayed_load(&mut self, origin: &FileOrigin);

    /// Injects bytes obtained elsewhere, bypassing the loader.
    fn set_image_bytes(&mut self, bytes: Bytes);

    /// Best-known width, 0 if unknown.
    fn width(&self) -> u32;

    /// Best-known height, 0 if unknown.
    fn height(&self) -> u32;

    /// Best-known byte size, 0 if unknown.
    fn bytes_size(&self) -> u64;

    /// Records authoritative metadata. Zero values are ignored.
    fn set_information(&mut self, size: u64, width: u32, height: u32);

    /// Raw bytes to store under [`Source::cache_key`]; empty if none.
    fn bytes_for_cache(&mut self) -> Bytes;
}

/// Closed set of source variants.
pub enum AnySource {
    /// Already decoded image.
    Image(ImageSource),
    /// File on disk.
    LocalFile(LocalFileSource),
    /// Cloud storage blob.
    Storage(StorageSource),
    /// Web-document proxy file.
    WebCached(WebCachedSource),
    /// Map tile.
    GeoPoint(GeoPointSource),
    /// Arbitrary web address.
    WebUrl(WebUrlSource),
}

impl AnySource {
    /// Short name of the variant, for logs.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Image(_) => "image",
            Self::LocalFile(_) => "local_file",
            Self::Storage(_) => "storage",
            Self::WebCached(_) => "web_cached",
            Self::GeoPoint(_) => "geo_point",
            Self::WebUrl(_) => "web_url",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $source:ident => $body:expr) => {
        match $self {
            AnySource::Image($source) => $body,
            AnySource::LocalFile($source) => $body,
            AnySource::Storage($source) => $body,
            AnySource::WebCached($source) => $body,
            AnySource::GeoPoint($source) => $body,
            AnySource::WebUrl($source) => $body,
        }
    };
}

impl Source for AnySource {
    fn load(&mut self, origin: &FileOrigin) {
        dispatch!(self, s => s.load(origin));
    }

    fn load_even_cancelled(&mut self, origin: &FileOrigin) {
        dispatch!(self, s => s.load_even_cancelled(origin));
    }

    fn take_loaded(&mut self) -> Option<Arc<DynamicImage>> {
        dispatch!(self, s => s.take_loaded())
    }

    fn unload(&mut self) {
        dispatch!(self, s => s.unload());
    }

    fn loading(&self) -> bool {
        dispatch!(self, s => s.loading())
    }

    fn display_loading(&self) -> bool {
        dispatch!(self, s => s.display_loading())
    }

    fn cancel(&mut self) {
        dispatch!(self, s => s.cancel());
    }

    fn progress(&self) -> f64 {
        dispatch!(self, s => s.progress())
    }

    fn load_offset(&self) -> u64 {
        dispatch!(self, s => s.load_offset())
    }

    fn location(&self) -> Option<&StorageImageLocation> {
        dispatch!(self, s => s.location())
    }

    fn refresh_file_reference(&mut self, data: &[u8]) {
        dispatch!(self, s => s.refresh_file_reference(data));
    }

    fn cache_key(&self) -> Option<CacheKey> {
        dispatch!(self, s => s.cache_key())
    }

    fn set_delayed_storage_location(&mut self, location: StorageImageLocation) {
        dispatch!(self, s => s.set_delayed_storage_location(location));
    }

    fn perform_delayed_load(&mut self, origin: &FileOrigin) {
        dispatch!(self, s => s.perform_delayed_load(origin));
    }

    fn set_image_bytes(&mut self, bytes: Bytes) {
        dispatch!(self, s => s.set_image_bytes(bytes));
    }

    fn width(&self) -> u32 {
        dispatch!(self, s => s.width())
    }

    fn height(&self) -> u32 {
        dispatch!(self, s => s.height())
    }

    fn bytes_size(&self) -> u64 {
        dispatch!(self, s => s.bytes_size())
    }

    fn set_information(&mut self, size: u64, width: u32, height: u32) {
        dispatch!(self, s => s.set_information(size, width, height));
    }

    fn bytes_for_cache(&mut self) -> Bytes {
        dispatch!(self, s => s.bytes_for_cache())
    }
}

impl From<ImageSource> for AnySource {
    fn from(source: ImageSource) -> Self {
        Self::Image(source)
    }
}

impl From<LocalFileSource> for AnySource {
    fn from(source: LocalFileSource) -> Self {
        Self::LocalFile(source)
    }
}

impl From<StorageSource> for AnySource {
    fn from(source: StorageSource) -> Self {
        Self::Storage(source)
    }
}

impl From<WebCachedSource> for AnySource {
    fn from(source: WebCachedSource) -> Self {
        Self::WebCached(source)
    }
}

impl From<GeoPointSource> for AnySource {
    fn from(source: GeoPointSource) -> Self {
        Self::GeoPoint(source)
    }
}

impl From<WebUrlSource> for AnySource {
    fn from(source: WebUrlSource) -> Self {
        Self::WebUrl(source)
    }
}
