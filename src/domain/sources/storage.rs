//! Cloud storage blobs, including locations resolved after construction.

use std::sync::Arc;

use super::remote::{RemoteKind, RemoteSource};
use crate::domain::entities::{CacheKey, Size, StorageImageLocation};
use crate::domain::ports::{FileLoaderFactory, LoaderTarget};

/// Identity of a storage blob.
#[derive(Debug, Clone)]
pub struct StorageBlob {
    location: StorageImageLocation,
    size: u64,
}

/// A source backed by a cloud storage blob.
pub type StorageSource = RemoteSource<StorageBlob>;

impl StorageSource {
    /// Creates a source for a known location.
    pub fn new(
        location: StorageImageLocation,
        size: u64,
        factory: Arc<dyn FileLoaderFactory>,
    ) -> Self {
        Self::with_kind(StorageBlob { location, size }, factory)
    }

    /// Creates a source whose location will be supplied later through
    /// `set_delayed_storage_location`. Loads requested before then are
    /// queued.
    pub fn delayed(factory: Arc<dyn FileLoaderFactory>) -> Self {
        Self::new(StorageImageLocation::invalid(), 0, factory)
    }
}

impl RemoteKind for StorageBlob {
    fn cache_key(&self) -> Option<CacheKey> {
        self.location
            .valid()
            .then(|| CacheKey::storage(&self.location.file))
    }

    fn shrink_box(&self) -> Size {
        Size::EMPTY
    }

    fn loader_target(&self) -> Option<LoaderTarget> {
        self.location.valid().then(|| LoaderTarget::Storage {
            location: self.location.file.clone(),
            size: self.size,
        })
    }

    fn width(&self) -> u32 {
        self.location.width
    }

    fn height(&self) -> u32 {
        self.location.height
    }

    fn bytes_size(&self) -> u64 {
        self.size
    }

    fn set_information(&mut self, size: u64, width: u32, height: u32) {
        if size != 0 {
            self.size = size;
        }
        if width != 0 && height != 0 {
            self.location.width = width;
            self.location.height = height;
        }
    }

    fn location(&self) -> Option<&StorageImageLocation> {
        Some(&self.location)
    }

    fn refresh_file_reference(&mut self, data: &[u8]) {
        self.location.file.refresh_file_reference(data);
    }

    fn is_resolved(&self) -> bool {
        self.location.valid()
    }

    fn resolve_location(&mut self, location: StorageImageLocation) -> bool {
        if !location.valid() {
            return false;
        }
        let (width, height) = (self.location.width, self.location.height);
        self.location = location;
        if self.location.size().is_empty() && width != 0 && height != 0 {
            self.location.width = width;
            self.location.height = height;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{FileOrigin, StorageFileLocation};
    use crate::domain::ports::mocks::FakeLoaderFactory;
    use crate::domain::sources::Source;

    fn location(volume: u64, token: &[u8]) -> StorageImageLocation {
        StorageImageLocation::new(
            StorageFileLocation::new(2, volume, 1).with_file_reference(token.to_vec()),
            800,
            600,
        )
    }

    #[test]
    fn test_metadata_from_location() {
        let source = StorageSource::new(location(5, b""), 1234, FakeLoaderFactory::new());

        assert_eq!(source.width(), 800);
        assert_eq!(source.height(), 600);
        assert_eq!(source.bytes_size(), 1234);
        assert!(source.shrink_box().is_empty());
    }

    #[test]
    fn test_refresh_keeps_cache_key_and_loader() {
        let factory = FakeLoaderFactory::new();
        let mut source = StorageSource::new(location(5, b"old"), 0, factory.clone());
        let key = source.cache_key();
        source.load(&FileOrigin::Unknown);
        let handle = factory.last().unwrap();

        source.refresh_file_reference(b"fresh");

        assert_eq!(source.cache_key(), key);
        assert_eq!(source.location().unwrap().file.file_reference, b"fresh");
        assert!(source.loading());
        assert!(!handle.cancelled());
    }

    #[test]
    fn test_refreshed_reference_reaches_next_loader() {
        let factory = FakeLoaderFactory::new();
        let mut source = StorageSource::new(location(5, b"old"), 0, factory.clone());
        source.refresh_file_reference(b"fresh");
        source.load(&FileOrigin::Unknown);

        let request = factory.last_request().unwrap();
        let LoaderTarget::Storage { location, .. } = request.target else {
            panic!("expected storage target");
        };
        assert_eq!(location.file_reference, b"fresh");
    }

    #[test]
    fn test_set_information_ignores_zeroes() {
        let mut source = StorageSource::new(location(5, b""), 100, FakeLoaderFactory::new());
        let key = source.cache_key();

        source.set_information(0, 0, 0);
        assert_eq!(source.bytes_size(), 100);
        assert_eq!(source.width(), 800);

        source.set_information(200, 1024, 768);
        assert_eq!(source.bytes_size(), 200);
        assert_eq!((source.width(), source.height()), (1024, 768));
        assert_eq!(source.cache_key(), key);
    }

    #[test]
    fn test_delayed_location_defers_load() {
        let factory = FakeLoaderFactory::new();
        let mut source = StorageSource::delayed(factory.clone());
        assert_eq!(source.cache_key(), None);

        source.load(&FileOrigin::Profile { peer_id: 9 });
        assert_eq!(factory.created(), 0);
        assert!(!source.loading());
        assert!(source.display_loading());
        assert!(source.has_pending_load());

        let resolved = location(42, b"token");
        source.set_delayed_storage_location(resolved.clone());
        assert_eq!(factory.created(), 0);
        source.perform_delayed_load(&FileOrigin::Unknown);

        assert_eq!(factory.created(), 1);
        assert!(source.loading());
        let request = factory.last_request().unwrap();
        assert_eq!(
            request.target,
            LoaderTarget::Storage {
                location: resolved.file.clone(),
                size: 0,
            }
        );
        assert_eq!(request.origin, FileOrigin::Profile { peer_id: 9 });
        assert_eq!(source.cache_key(), Some(CacheKey::storage(&resolved.file)));
    }

    #[test]
    fn test_plain_load_after_resolution_consumes_queued_load() {
        let factory = FakeLoaderFactory::new();
        let mut source = StorageSource::delayed(factory.clone());

        source.load(&FileOrigin::Unknown);
        source.set_delayed_storage_location(location(42, b"token"));
        source.load(&FileOrigin::Unknown);
        assert_eq!(factory.created(), 1);
        assert!(!source.has_pending_load());

        factory.last().unwrap().complete(vec![7u8; 10]);
        assert_eq!(source.bytes_for_cache().len(), 10);
        assert!(!source.loading());
        assert!(!source.display_loading());

        source.perform_delayed_load(&FileOrigin::Unknown);
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn test_unload_drops_queued_load() {
        let mut source = StorageSource::delayed(FakeLoaderFactory::new());

        source.load(&FileOrigin::Unknown);
        source.unload();

        assert!(!source.has_pending_load());
        assert!(!source.display_loading());
    }

    #[test]
    fn test_delayed_load_without_request_does_nothing() {
        let factory = FakeLoaderFactory::new();
        let mut source = StorageSource::delayed(factory.clone());

        source.set_delayed_storage_location(location(42, b""));
        source.perform_delayed_load(&FileOrigin::Unknown);

        assert_eq!(factory.created(), 0);
    }

    #[test]
    fn test_cancel_drops_deferred_load() {
        let factory = FakeLoaderFactory::new();
        let mut source = StorageSource::delayed(factory.clone());

        source.load(&FileOrigin::Unknown);
        source.cancel();
        source.set_delayed_storage_location(location(42, b""));
        source.perform_delayed_load(&FileOrigin::Unknown);

        assert_eq!(factory.created(), 0);
        assert!(!source.display_loading());
    }

    #[test]
    fn test_perform_before_resolution_keeps_request() {
        let factory = FakeLoaderFactory::new();
        let mut source = StorageSource::delayed(factory.clone());

        source.load(&FileOrigin::Unknown);
        source.perform_delayed_load(&FileOrigin::Unknown);
        assert!(source.has_pending_load());

        source.set_delayed_storage_location(location(42, b""));
        source.perform_delayed_load(&FileOrigin::Unknown);
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn test_placeholder_rejected_as_resolution() {
        let mut source = StorageSource::delayed(FakeLoaderFactory::new());
        source.set_delayed_storage_location(StorageImageLocation::invalid());
        assert!(source.cache_key().is_none());
    }
}
