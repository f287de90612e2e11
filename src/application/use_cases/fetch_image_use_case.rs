//! Drives one source from load to persisted bytes.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::dto::FetchOutcome;
use crate::domain::entities::FileOrigin;
use crate::domain::ports::{CacheError, ContentCachePort};
use crate::domain::sources::Source;

/// Fetch failures.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source was still loading when time ran out.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Loading stopped without a decodable image.
    #[error("source produced no image")]
    NotLoaded,
    /// The bytes could not be persisted.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Loads a source, waits for it, and writes its bytes to the cache.
pub struct FetchImageUseCase {
    cache: Arc<dyn ContentCachePort>,
    timeout: Duration,
    poll_interval: Duration,
}

impl FetchImageUseCase {
    /// Creates new use case.
    #[must_use]
    pub fn new(cache: Arc<dyn ContentCachePort>, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            cache,
            timeout,
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Runs the fetch. The source is cancelled on timeout.
    ///
    /// # Errors
    /// Returns error on timeout, when no image results, or when the cache
    /// rejects the bytes.
    pub async fn execute<S>(&self, source: &mut S, origin: &FileOrigin) -> Result<FetchOutcome, FetchError>
    where
        S: Source + ?Sized,
    {
        debug!(origin = %origin, key = ?source.cache_key(), "Fetching image");
        source.load(origin);

        let waited = {
            let source = &*source;
            let mut interval = tokio::time::interval(self.poll_interval);
            tokio::time::timeout(self.timeout, async move {
                loop {
                    interval.tick().await;
                    if !source.loading() && !source.display_loading() {
                        break;
                    }
                }
            })
            .await
        };
        if waited.is_err() {
            warn!(offset = source.load_offset(), progress = source.progress(), "Fetch timed out");
            source.cancel();
            return Err(FetchError::Timeout(self.timeout));
        }

        let image = source.take_loaded().ok_or(FetchError::NotLoaded)?;
        let cache_key = source.cache_key();
        let mut cached = false;

        if let Some(key) = cache_key {
            if self.cache.contains(&key).await {
                cached = true;
            } else {
                let bytes = source.bytes_for_cache();
                if !bytes.is_empty() {
                    self.cache.put(key, bytes).await?;
                    cached = true;
                }
            }
        }

        let outcome = FetchOutcome {
            cache_key,
            width: image.width(),
            height: image.height(),
            bytes_size: source.bytes_size(),
            cached,
        };
        info!(outcome = %outcome, "Fetched image");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CacheKey, Size};
    use crate::domain::ports::mocks::{FakeLoaderFactory, MockContentCachePort};
    use crate::domain::services::image_decoder::fixtures::png_bytes;
    use crate::domain::sources::{AnySource, ImageSource, WebUrlSource};
    use bytes::Bytes;
    use image::DynamicImage;
    use tokio_test::{assert_err, assert_ok};

    const URL: &str = "https://example.com/a.png";

    fn use_case(cache: MockContentCachePort, timeout_ms: u64) -> FetchImageUseCase {
        FetchImageUseCase::new(
            Arc::new(cache),
            Duration::from_millis(timeout_ms),
            Duration::from_millis(1),
        )
    }

    #[tokio::test]
    async fn test_fetch_writes_bytes_under_key() {
        let png = png_bytes(20, 10);
        let expected = png.clone();
        let key = CacheKey::url(URL, Size::EMPTY);
        let mut cache = MockContentCachePort::new();
        cache.expect_contains().times(1).returning(|_| false);
        cache
            .expect_put()
            .withf(move |k, bytes| *k == key && *bytes == expected)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut source = AnySource::from(WebUrlSource::new(
            URL,
            Size::EMPTY,
            FakeLoaderFactory::completing_with(png.clone()),
        ));
        let outcome = assert_ok!(use_case(cache, 1000).execute(&mut source, &FileOrigin::Unknown).await);

        assert_eq!(outcome.cache_key, Some(key));
        assert_eq!((outcome.width, outcome.height), (20, 10));
        assert_eq!(outcome.bytes_size, png.len() as u64);
        assert!(outcome.cached);
    }

    #[tokio::test]
    async fn test_already_cached_is_not_rewritten() {
        let mut cache = MockContentCachePort::new();
        cache.expect_contains().returning(|_| true);
        cache.expect_put().never();

        let mut source = WebUrlSource::new(URL, Size::EMPTY, FakeLoaderFactory::completing_with(png_bytes(4, 4)));
        let outcome = assert_ok!(use_case(cache, 1000).execute(&mut source, &FileOrigin::Unknown).await);

        assert!(outcome.cached);
    }

    #[tokio::test]
    async fn test_timeout_cancels_source() {
        let factory = FakeLoaderFactory::new();
        let mut source = WebUrlSource::new(URL, Size::EMPTY, factory.clone());

        let result = use_case(MockContentCachePort::new(), 20)
            .execute(&mut source, &FileOrigin::Unknown)
            .await;

        assert!(matches!(assert_err!(result), FetchError::Timeout(_)));
        assert!(factory.last().unwrap().cancelled());
        assert!(source.is_cancelled());
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_not_loaded() {
        let mut source = WebUrlSource::new(
            URL,
            Size::EMPTY,
            FakeLoaderFactory::completing_with(Bytes::from_static(b"not an image")),
        );

        let result = use_case(MockContentCachePort::new(), 1000)
            .execute(&mut source, &FileOrigin::Unknown)
            .await;

        assert!(matches!(assert_err!(result), FetchError::NotLoaded));
    }

    #[tokio::test]
    async fn test_cache_failure_is_reported() {
        let mut cache = MockContentCachePort::new();
        cache.expect_contains().returning(|_| false);
        cache
            .expect_put()
            .returning(|_, _| Err(CacheError::IoError("disk full".to_string())));

        let mut source = WebUrlSource::new(URL, Size::EMPTY, FakeLoaderFactory::completing_with(png_bytes(4, 4)));
        let result = use_case(cache, 1000).execute(&mut source, &FileOrigin::Unknown).await;

        assert!(matches!(assert_err!(result), FetchError::Cache(_)));
    }

    #[tokio::test]
    async fn test_uncacheable_source_skips_cache() {
        let mut source = ImageSource::new(DynamicImage::new_rgb8(3, 3), None);

        let outcome = assert_ok!(
            use_case(MockContentCachePort::new(), 1000)
                .execute(&mut source, &FileOrigin::Unknown)
                .await
        );

        assert_eq!(outcome.cache_key, None);
        assert!(!outcome.cached);
    }
}
