//! Loader that reads the persistent cache first and falls back to HTTP.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::endpoints;
use crate::domain::errors::LoaderError;
use crate::domain::ports::{
    ContentCachePort, FileLoader, FileLoaderFactory, LoaderRequest, LoaderStatus, LoaderTarget,
};
use crate::infrastructure::config::{EndpointsConfig, NetworkConfig};

#[derive(Debug, Default)]
struct LoaderState {
    status: LoaderStatus,
    offset: u64,
    total: u64,
    bytes: Option<Bytes>,
    loading_local: bool,
}

/// Everything a background fetch needs, cloned into the task.
#[derive(Clone)]
struct Job {
    request: LoaderRequest,
    client: reqwest::Client,
    cache: Arc<dyn ContentCachePort>,
    endpoints: Arc<EndpointsConfig>,
    state: Arc<Mutex<LoaderState>>,
}

impl Job {
    async fn run(self) {
        let result = self.fetch().await;
        let mut state = self.state.lock();
        if state.status == LoaderStatus::Cancelled {
            return;
        }
        match result {
            Ok(bytes) => {
                trace!(loader_target = %self.request.target, len = bytes.len(), "Loader finished");
                state.offset = bytes.len() as u64;
                state.total = state.total.max(state.offset);
                state.bytes = Some(bytes);
                state.status = LoaderStatus::Finished;
            }
            Err(e) => {
                if e.is_recoverable() {
                    debug!(loader_target = %self.request.target, error = %e, "Loader failed, retry may succeed");
                } else {
                    warn!(loader_target = %self.request.target, error = %e, "Loader failed");
                }
                state.status = LoaderStatus::Failed;
            }
        }
    }

    async fn fetch(&self) -> Result<Bytes, LoaderError> {
        if let Some(key) = self.request.cache_key {
            self.state.lock().loading_local = true;
            let cached = self.cache.get(&key).await;
            self.state.lock().loading_local = false;
            if let Some(bytes) = cached {
                debug!(key = %key, len = bytes.len(), "Loaded from content cache");
                return Ok(bytes);
            }
        }
        if !self.request.from_cloud.allows_cloud() {
            return Err(LoaderError::NotCachedLocally);
        }

        let url = endpoints::resolve(&self.request.target, self.request.shrink_box, &self.endpoints)?;
        debug!(url = %url, auto = self.request.auto_loading, "Downloading");

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LoaderError::network(format!("Request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(LoaderError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let total = response
            .content_length()
            .unwrap_or_else(|| expected_size(&self.request.target));
        self.state.lock().total = total;

        let mut buffer = BytesMut::with_capacity(usize::try_from(total).unwrap_or(0));
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| LoaderError::network(format!("Failed to read body: {e}")))?
        {
            buffer.extend_from_slice(&chunk);
            let mut state = self.state.lock();
            if state.status == LoaderStatus::Cancelled {
                return Err(LoaderError::network("cancelled"));
            }
            state.offset = buffer.len() as u64;
        }
        let bytes = buffer.freeze();

        if let Some(key) = self.request.cache_key
            && !bytes.is_empty()
            && let Err(e) = self.cache.put(key, bytes.clone()).await
        {
            warn!(key = %key, error = %e, "Failed to store in content cache");
        }
        Ok(bytes)
    }
}

const fn expected_size(target: &LoaderTarget) -> u64 {
    match target {
        LoaderTarget::Storage { size, .. }
        | LoaderTarget::WebFile { size, .. }
        | LoaderTarget::GeoPoint { size, .. } => *size,
        LoaderTarget::Url(_) => 0,
    }
}

/// One fetch running on a tokio runtime.
pub struct HttpFileLoader {
    job: Job,
    runtime: Handle,
    task: Option<JoinHandle<()>>,
}

impl HttpFileLoader {
    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl FileLoader for HttpFileLoader {
    fn start(&mut self) {
        {
            let mut state = self.job.state.lock();
            if state.status != LoaderStatus::Idle {
                return;
            }
            state.status = LoaderStatus::Loading;
        }
        let job = self.job.clone();
        self.task = Some(self.runtime.spawn(job.run()));
    }

    fn cancel(&mut self) {
        {
            let mut state = self.job.state.lock();
            if !state.status.is_terminal() {
                trace!(loader_target = %self.job.request.target, "Loader cancelled");
                state.status = LoaderStatus::Cancelled;
            }
        }
        self.abort();
    }

    fn status(&self) -> LoaderStatus {
        self.job.state.lock().status
    }

    #[allow(clippy::cast_precision_loss)]
    fn progress(&self) -> f64 {
        let state = self.job.state.lock();
        match state.status {
            LoaderStatus::Finished => 1.0,
            _ if state.total > 0 => (state.offset as f64 / state.total as f64).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    fn offset(&self) -> u64 {
        self.job.state.lock().offset
    }

    fn take_bytes(&mut self) -> Option<Bytes> {
        self.job.state.lock().bytes.take()
    }

    fn finish_with_bytes(&mut self, bytes: Bytes) {
        self.abort();
        let mut state = self.job.state.lock();
        state.offset = bytes.len() as u64;
        state.total = state.offset;
        state.bytes = Some(bytes);
        state.loading_local = false;
        state.status = LoaderStatus::Finished;
    }

    fn loading_local(&self) -> bool {
        self.job.state.lock().loading_local
    }

    fn auto_loading(&self) -> bool {
        self.job.request.auto_loading
    }
}

impl Drop for HttpFileLoader {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Builds [`HttpFileLoader`]s sharing one HTTP client and content cache.
#[derive(Clone)]
pub struct HttpLoaderFactory {
    runtime: Handle,
    client: reqwest::Client,
    cache: Arc<dyn ContentCachePort>,
    endpoints: Arc<EndpointsConfig>,
}

impl std::fmt::Debug for HttpLoaderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLoaderFactory")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl HttpLoaderFactory {
    /// Creates a factory whose loaders run on `runtime`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        runtime: Handle,
        network: &NetworkConfig,
        endpoints: EndpointsConfig,
        cache: Arc<dyn ContentCachePort>,
    ) -> Result<Self, LoaderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network.timeout_secs))
            .user_agent(network.user_agent.clone())
            .build()
            .map_err(|e| LoaderError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            runtime,
            client,
            cache,
            endpoints: Arc::new(endpoints),
        })
    }

    /// Creates a factory on the runtime of the calling context.
    ///
    /// # Errors
    /// Returns error outside a tokio runtime or if the HTTP client cannot
    /// be built.
    pub fn from_current(
        network: &NetworkConfig,
        endpoints: EndpointsConfig,
        cache: Arc<dyn ContentCachePort>,
    ) -> Result<Self, LoaderError> {
        let runtime = Handle::try_current().map_err(|e| LoaderError::runtime(e.to_string()))?;
        Self::new(runtime, network, endpoints, cache)
    }
}

impl FileLoaderFactory for HttpLoaderFactory {
    fn create(&self, request: LoaderRequest) -> Box<dyn FileLoader> {
        Box::new(HttpFileLoader {
            job: Job {
                request,
                client: self.client.clone(),
                cache: self.cache.clone(),
                endpoints: self.endpoints.clone(),
                state: Arc::new(Mutex::new(LoaderState::default())),
            },
            runtime: self.runtime.clone(),
            task: None,
        })
    }
}
