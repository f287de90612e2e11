//! Port definition for byte loaders.

use bytes::Bytes;

use crate::domain::entities::{
    CacheKey, FileOrigin, GeoPointLocation, LoadFromCloud, Size, StorageFileLocation,
    WebFileLocation,
};

/// What a loader should fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderTarget {
    /// A cloud storage blob.
    Storage {
        /// Blob location, including its current access token.
        location: StorageFileLocation,
        /// Expected size in bytes, 0 if unknown.
        size: u64,
    },
    /// A file behind the web-document proxy.
    WebFile {
        /// Proxy location.
        location: WebFileLocation,
        /// Expected size in bytes, 0 if unknown.
        size: u64,
    },
    /// A rendered map tile.
    GeoPoint {
        /// Tile parameters.
        location: GeoPointLocation,
        /// Expected size in bytes, 0 if unknown.
        size: u64,
    },
    /// An arbitrary web address.
    Url(String),
}

impl std::fmt::Display for LoaderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage { location, .. } => write!(f, "storage:{location}"),
            Self::WebFile { location, .. } => write!(f, "web:{}", location.url),
            Self::GeoPoint { location, .. } => {
                write!(f, "geo:{},{}@{}", location.lat, location.lon, location.zoom)
            }
            Self::Url(url) => write!(f, "url:{url}"),
        }
    }
}

/// Everything a factory needs to build a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderRequest {
    /// What to fetch.
    pub target: LoaderTarget,
    /// Provenance, passed through for reference refresh on retry.
    pub origin: FileOrigin,
    /// Whether the network may be used.
    pub from_cloud: LoadFromCloud,
    /// True for background fetches, false for user-initiated ones.
    pub auto_loading: bool,
    /// Key the bytes live under in the persistent cache.
    pub cache_key: Option<CacheKey>,
    /// Box the image will be shrunk into, empty for full size.
    pub shrink_box: Size,
}

/// Lifecycle of a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderStatus {
    /// Created but not started.
    #[default]
    Idle,
    /// Fetching bytes.
    Loading,
    /// Bytes are available.
    Finished,
    /// Fetching failed.
    Failed,
    /// Cancelled by the owner.
    Cancelled,
}

impl LoaderStatus {
    /// Returns true once the loader will make no further progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Cancelled)
    }
}

/// A single fetch of raw bytes, exclusively owned by one source.
///
/// Implementations do their I/O in the background and must never block in
/// any of these methods. Dropping a loader tears down its background work.
pub trait FileLoader: Send {
    /// Starts fetching. Calling this on a started loader does nothing.
    fn start(&mut self);

    /// Stops fetching. Later progress is not reported.
    fn cancel(&mut self);

    /// Current lifecycle state.
    fn status(&self) -> LoaderStatus;

    /// Fraction in `[0.0, 1.0]`.
    fn progress(&self) -> f64;

    /// Number of bytes received so far.
    fn offset(&self) -> u64;

    /// Moves the fetched bytes out once finished.
    fn take_bytes(&mut self) -> Option<Bytes>;

    /// Completes the loader with externally supplied bytes.
    fn finish_with_bytes(&mut self, bytes: Bytes);

    /// True while the loader is reading from the local cache.
    fn loading_local(&self) -> bool;

    /// True for background fetches.
    fn auto_loading(&self) -> bool;

    /// True once the loader has stopped, successfully or not.
    fn finished(&self) -> bool {
        self.status().is_terminal()
    }
}

/// Builds loaders for remote sources.
pub trait FileLoaderFactory: Send + Sync {
    /// Creates an unstarted loader for the request.
    fn create(&self, request: LoaderRequest) -> Box<dyn FileLoader>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Observable state of a fake loader.
    #[derive(Debug, Default)]
    pub struct FakeLoaderState {
        pub status: LoaderStatus,
        pub progress: f64,
        pub offset: u64,
        pub bytes: Option<Bytes>,
        pub starts: usize,
        pub cancelled: bool,
        pub dropped: bool,
        pub loading_local: bool,
    }

    /// Test-side handle that drives a fake loader after the source owns it.
    #[derive(Debug, Clone, Default)]
    pub struct FakeLoaderHandle(Arc<Mutex<FakeLoaderState>>);

    impl FakeLoaderHandle {
        /// Simulates completion with the given bytes.
        pub fn complete(&self, bytes: impl Into<Bytes>) {
            let bytes = bytes.into();
            let mut state = self.0.lock();
            state.status = LoaderStatus::Finished;
            state.offset = bytes.len() as u64;
            state.progress = 1.0;
            state.bytes = Some(bytes);
        }

        /// Simulates a failed fetch.
        pub fn fail(&self) {
            self.0.lock().status = LoaderStatus::Failed;
        }

        /// Simulates partial progress.
        pub fn advance(&self, offset: u64, progress: f64) {
            let mut state = self.0.lock();
            state.offset = offset;
            state.progress = progress;
        }

        /// Marks the loader as reading from the local cache.
        pub fn set_loading_local(&self, local: bool) {
            self.0.lock().loading_local = local;
        }

        pub fn status(&self) -> LoaderStatus {
            self.0.lock().status
        }

        pub fn starts(&self) -> usize {
            self.0.lock().starts
        }

        pub fn cancelled(&self) -> bool {
            self.0.lock().cancelled
        }

        pub fn dropped(&self) -> bool {
            self.0.lock().dropped
        }
    }

    /// Loader whose progress is driven through a [`FakeLoaderHandle`].
    pub struct FakeLoader {
        handle: FakeLoaderHandle,
        auto_loading: bool,
        complete_on_start: Option<Bytes>,
    }

    impl FileLoader for FakeLoader {
        fn start(&mut self) {
            let mut state = self.handle.0.lock();
            state.starts += 1;
            if state.status == LoaderStatus::Idle {
                state.status = LoaderStatus::Loading;
            }
            drop(state);
            if let Some(bytes) = self.complete_on_start.take() {
                self.handle.complete(bytes);
            }
        }

        fn cancel(&mut self) {
            let mut state = self.handle.0.lock();
            state.cancelled = true;
            state.status = LoaderStatus::Cancelled;
        }

        fn status(&self) -> LoaderStatus {
            self.handle.status()
        }

        fn progress(&self) -> f64 {
            self.handle.0.lock().progress
        }

        fn offset(&self) -> u64 {
            self.handle.0.lock().offset
        }

        fn take_bytes(&mut self) -> Option<Bytes> {
            self.handle.0.lock().bytes.take()
        }

        fn finish_with_bytes(&mut self, bytes: Bytes) {
            self.handle.complete(bytes);
        }

        fn loading_local(&self) -> bool {
            self.handle.0.lock().loading_local
        }

        fn auto_loading(&self) -> bool {
            self.auto_loading
        }
    }

    impl Drop for FakeLoader {
        fn drop(&mut self) {
            self.handle.0.lock().dropped = true;
        }
    }

    /// Factory recording every request and handing out fake loaders.
    #[derive(Default)]
    pub struct FakeLoaderFactory {
        requests: Mutex<Vec<LoaderRequest>>,
        handles: Mutex<Vec<FakeLoaderHandle>>,
        complete_with: Option<Bytes>,
    }

    impl FakeLoaderFactory {
        /// Creates a factory whose loaders wait for the test to finish them.
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Creates a factory whose loaders finish as soon as they start.
        pub fn completing_with(bytes: impl Into<Bytes>) -> Arc<Self> {
            Arc::new(Self {
                complete_with: Some(bytes.into()),
                ..Self::default()
            })
        }

        /// Number of loaders created so far.
        pub fn created(&self) -> usize {
            self.handles.lock().len()
        }

        /// Handle of the most recently created loader.
        pub fn last(&self) -> Option<FakeLoaderHandle> {
            self.handles.lock().last().cloned()
        }

        /// Most recent request.
        pub fn last_request(&self) -> Option<LoaderRequest> {
            self.requests.lock().last().cloned()
        }
    }

    impl FileLoaderFactory for FakeLoaderFactory {
        fn create(&self, request: LoaderRequest) -> Box<dyn FileLoader> {
            let handle = FakeLoaderHandle::default();
            let auto_loading = request.auto_loading;
            self.requests.lock().push(request);
            self.handles.lock().push(handle.clone());
            Box::new(FakeLoader {
                handle,
                auto_loading,
                complete_on_start: self.complete_with.clone(),
            })
        }
    }
}
