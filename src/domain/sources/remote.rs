//! Shared state machine for sources fetched through a loader.

use std::sync::Arc;

use bytes::Bytes;
use image::DynamicImage;
use tracing::{debug, trace, warn};

use super::Source;
use crate::domain::entities::{CacheKey, FileOrigin, LoadFromCloud, Size, StorageImageLocation};
use crate::domain::ports::{
    FileLoader, FileLoaderFactory, LoaderRequest, LoaderStatus, LoaderTarget,
};
use crate::domain::services::image_decoder;

/// Identity and metadata of one kind of remote blob.
pub trait RemoteKind: Send {
    /// Cache key derived from identity only.
    fn cache_key(&self) -> Option<CacheKey>;

    /// Box the decoded image is shrunk into; empty for full size.
    fn shrink_box(&self) -> Size;

    /// What the loader should fetch, or None if the identity is unusable.
    fn loader_target(&self) -> Option<LoaderTarget>;

    /// Best-known width.
    fn width(&self) -> u32;

    /// Best-known height.
    fn height(&self) -> u32;

    /// Best-known byte size.
    fn bytes_size(&self) -> u64;

    /// Updates cached metadata. Never touches identity.
    fn set_information(&mut self, size: u64, width: u32, height: u32);

    /// Storage location, for kinds that have one.
    fn location(&self) -> Option<&StorageImageLocation> {
        None
    }

    /// Replaces a stale access token.
    fn refresh_file_reference(&mut self, _data: &[u8]) {}

    /// False while the identity is a placeholder.
    fn is_resolved(&self) -> bool {
        true
    }

    /// Fixes a placeholder location. Returns false if the kind has none.
    fn resolve_location(&mut self, _location: StorageImageLocation) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct PendingLoad {
    origin: FileOrigin,
    from_cloud: LoadFromCloud,
}

/// A source whose bytes arrive through an exclusively owned loader.
///
/// States: idle, loading (a loader is alive and unfinished), loaded (raw
/// bytes are held) and cancelled. Cancellation is sticky: plain `load` does
/// nothing until `load_even_cancelled`. A loader that fails, or delivers
/// bytes that do not decode, also leaves the source cancelled.
pub struct RemoteSource<K: RemoteKind> {
    kind: K,
    factory: Arc<dyn FileLoaderFactory>,
    loader: Option<Box<dyn FileLoader>>,
    loader_policy: LoadFromCloud,
    cancelled: bool,
    pending: Option<PendingLoad>,
    bytes: Bytes,
    image: Option<Arc<DynamicImage>>,
}

impl<K: RemoteKind> RemoteSource<K> {
    /// Wraps a kind; loaders come from `factory`.
    pub fn with_kind(kind: K, factory: Arc<dyn FileLoaderFactory>) -> Self {
        Self {
            kind,
            factory,
            loader: None,
            loader_policy: LoadFromCloud::CloudOrLocal,
            cancelled: false,
            pending: None,
            bytes: Bytes::new(),
            image: None,
        }
    }

    /// The variant-specific identity.
    pub const fn kind(&self) -> &K {
        &self.kind
    }

    /// Box the loaded image is shrunk into.
    pub fn shrink_box(&self) -> Size {
        self.kind.shrink_box()
    }

    /// The live loader, if any.
    pub fn current_loader(&self) -> Option<&dyn FileLoader> {
        self.loader.as_deref()
    }

    /// True while cancellation is in effect.
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// True while a load is queued behind an unresolved location.
    pub const fn has_pending_load(&self) -> bool {
        self.pending.is_some()
    }

    /// Satisfies a load from the local cache only, without the network.
    pub fn load_local(&mut self, origin: &FileOrigin) {
        self.sync_loader();
        if self.loaded() || self.loader.is_some() || self.cancelled {
            return;
        }
        if !self.kind.is_resolved() {
            self.defer(origin, LoadFromCloud::LocalOnly);
            return;
        }
        self.start_loader(origin, LoadFromCloud::LocalOnly, true);
    }

    fn loaded(&self) -> bool {
        !self.bytes.is_empty() || self.image.is_some()
    }

    fn defer(&mut self, origin: &FileOrigin, from_cloud: LoadFromCloud) {
        let from_cloud = match &self.pending {
            Some(pending) if pending.from_cloud.allows_cloud() => pending.from_cloud,
            _ => from_cloud,
        };
        trace!(origin = %origin, "Deferring load until location is resolved");
        self.pending = Some(PendingLoad {
            origin: origin.clone(),
            from_cloud,
        });
    }

    fn start_loader(&mut self, origin: &FileOrigin, from_cloud: LoadFromCloud, auto_loading: bool) {
        let Some(target) = self.kind.loader_target() else {
            debug!("Source has no loadable identity");
            return;
        };
        let request = LoaderRequest {
            target,
            origin: origin.clone(),
            from_cloud,
            auto_loading,
            cache_key: self.kind.cache_key(),
            shrink_box: self.kind.shrink_box(),
        };
        debug!(loader_target = %request.target, origin = %origin, ?from_cloud, "Creating loader");

        let mut loader = self.factory.create(request);
        loader.start();
        self.pending = None;
        self.loader = Some(loader);
        self.loader_policy = from_cloud;
    }

    fn destroy_loader(&mut self) {
        if let Some(mut loader) = self.loader.take()
            && !loader.finished()
        {
            loader.cancel();
        }
    }

    /// Moves a finished loader's bytes into the source and drops the loader.
    fn sync_loader(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        match loader.status() {
            LoaderStatus::Idle | LoaderStatus::Loading => {}
            LoaderStatus::Finished => {
                let bytes = loader.take_bytes().unwrap_or_default();
                self.loader = None;
                if bytes.is_empty() {
                    warn!("Loader finished without bytes");
                    self.cancelled = true;
                    return;
                }
                trace!(len = bytes.len(), "Loader finished");
                self.kind.set_information(bytes.len() as u64, 0, 0);
                self.bytes = bytes;
            }
            LoaderStatus::Failed | LoaderStatus::Cancelled => {
                let policy = self.loader_policy;
                self.loader = None;
                if policy.allows_cloud() {
                    debug!("Loader failed, source cancelled");
                    self.cancelled = true;
                } else {
                    trace!("Local-only loader missed");
                }
            }
        }
    }
}

impl<K: RemoteKind> Source for RemoteSource<K> {
    fn load(&mut self, origin: &FileOrigin) {
        self.sync_loader();
        if self.loaded() || self.cancelled {
            return;
        }
        if !self.kind.is_resolved() {
            self.defer(origin, LoadFromCloud::CloudOrLocal);
            return;
        }
        if self.loader.is_some() {
            if self.loader_policy.allows_cloud() {
                return;
            }
            self.destroy_loader();
        }
        self.start_loader(origin, LoadFromCloud::CloudOrLocal, false);
    }

    fn load_even_cancelled(&mut self, origin: &FileOrigin) {
        self.cancelled = false;
        self.load(origin);
    }

    fn take_loaded(&mut self) -> Option<Arc<DynamicImage>> {
        self.sync_loader();
        if let Some(image) = &self.image {
            return Some(image.clone());
        }
        if self.bytes.is_empty() {
            return None;
        }
        if let Some((decoded, _)) = image_decoder::decode_shrunk(&self.bytes, self.kind.shrink_box())
        {
            self.kind
                .set_information(self.bytes.len() as u64, decoded.width(), decoded.height());
            let image = Arc::new(decoded);
            self.image = Some(image.clone());
            return Some(image);
        }
        warn!(len = self.bytes.len(), "Loaded bytes are not an image");
        self.bytes = Bytes::new();
        self.cancelled = true;
        None
    }

    fn unload(&mut self) {
        self.destroy_loader();
        self.pending = None;
        self.bytes = Bytes::new();
        self.image = None;
    }

    fn loading(&self) -> bool {
        self.loader.as_ref().is_some_and(|loader| !loader.finished())
    }

    fn display_loading(&self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        self.loader.as_ref().is_some_and(|loader| {
            !loader.finished() && !(loader.loading_local() && loader.auto_loading())
        })
    }

    fn cancel(&mut self) {
        self.sync_loader();
        self.pending = None;
        self.destroy_loader();
        if !self.loaded() && !self.cancelled {
            debug!("Source cancelled");
            self.cancelled = true;
        }
    }

    fn progress(&self) -> f64 {
        match &self.loader {
            Some(loader) if loader.status() == LoaderStatus::Finished => 1.0,
            Some(loader) if !loader.finished() => loader.progress().clamp(0.0, 1.0),
            _ if self.loaded() => 1.0,
            _ => 0.0,
        }
    }

    fn load_offset(&self) -> u64 {
        self.loader
            .as_ref()
            .map_or(self.bytes.len() as u64, |loader| loader.offset())
    }

    fn location(&self) -> Option<&StorageImageLocation> {
        self.kind.location()
    }

    fn refresh_file_reference(&mut self, data: &[u8]) {
        trace!(len = data.len(), "Refreshing file reference");
        self.kind.refresh_file_reference(data);
    }

    fn cache_key(&self) -> Option<CacheKey> {
        self.kind.cache_key()
    }

    fn set_delayed_storage_location(&mut self, location: StorageImageLocation) {
        if self.kind.resolve_location(location) {
            debug!(key = ?self.kind.cache_key(), "Delayed location resolved");
        }
    }

    fn perform_delayed_load(&mut self, origin: &FileOrigin) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if !self.kind.is_resolved() {
            self.pending = Some(pending);
            return;
        }
        let origin = if *origin == FileOrigin::Unknown {
            &pending.origin
        } else {
            origin
        };
        match pending.from_cloud {
            LoadFromCloud::CloudOrLocal => self.load(origin),
            LoadFromCloud::LocalOnly => self.load_local(origin),
        }
    }

    fn set_image_bytes(&mut self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        self.destroy_loader();
        self.pending = None;
        self.cancelled = false;
        self.image = None;
        debug!(len = bytes.len(), "Image bytes injected");
        self.kind.set_information(bytes.len() as u64, 0, 0);
        self.bytes = bytes;
    }

    fn width(&self) -> u32 {
        self.kind.width()
    }

    fn height(&self) -> u32 {
        self.kind.height()
    }

    fn bytes_size(&self) -> u64 {
        self.kind.bytes_size()
    }

    fn set_information(&mut self, size: u64, width: u32, height: u32) {
        self.kind.set_information(size, width, height);
    }

    fn bytes_for_cache(&mut self) -> Bytes {
        self.sync_loader();
        self.bytes.clone()
    }
}

impl<K: RemoteKind> Drop for RemoteSource<K> {
    fn drop(&mut self) {
        self.destroy_loader();
    }
}
