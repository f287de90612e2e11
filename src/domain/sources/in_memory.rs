//! Images that are already decoded.

use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tracing::{trace, warn};

use super::Source;
use crate::domain::entities::{CacheKey, FileOrigin, Size, StorageImageLocation};
use crate::domain::services::image_decoder;

/// A source holding a decoded image in memory.
///
/// Always loaded. `unload` trades the decoded pixels for their encoded
/// bytes, and the next `take_loaded` decodes them again.
pub struct ImageSource {
    data: Option<Arc<DynamicImage>>,
    format: ImageFormat,
    bytes: Bytes,
    size: Size,
}

impl ImageSource {
    /// Wraps a decoded image. `format` is used when the image has to be
    /// serialized; PNG if not given.
    #[must_use]
    pub fn new(data: DynamicImage, format: Option<ImageFormat>) -> Self {
        let size = image_decoder::image_size(&data);
        Self {
            data: Some(Arc::new(data)),
            format: format.unwrap_or(ImageFormat::Png),
            bytes: Bytes::new(),
            size,
        }
    }

    /// Wraps encoded bytes together with their decoded form.
    #[must_use]
    pub fn with_bytes(data: DynamicImage, bytes: Bytes, format: ImageFormat) -> Self {
        let mut source = Self::new(data, Some(format));
        source.bytes = bytes;
        source
    }

    /// Format used when serializing.
    #[must_use]
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    fn encoded(&mut self) -> Bytes {
        if self.bytes.is_empty()
            && let Some(data) = &self.data
        {
            trace!(format = ?self.format, size = %self.size, "Encoding in-memory image");
            self.bytes = image_decoder::encode(data, self.format);
        }
        self.bytes.clone()
    }
}

impl Source for ImageSource {
    fn load(&mut self, _origin: &FileOrigin) {}

    fn load_even_cancelled(&mut self, _origin: &FileOrigin) {}

    fn take_loaded(&mut self) -> Option<Arc<DynamicImage>> {
        if self.data.is_none() {
            match image_decoder::decode(&self.bytes) {
                Some((decoded, _)) => self.data = Some(Arc::new(decoded)),
                None => warn!(len = self.bytes.len(), "In-memory bytes no longer decode"),
            }
        }
        self.data.clone()
    }

    fn unload(&mut self) {
        self.encoded();
        self.data = None;
    }

    fn loading(&self) -> bool {
        false
    }

    fn display_loading(&self) -> bool {
        false
    }

    fn cancel(&mut self) {}

    fn progress(&self) -> f64 {
        1.0
    }

    fn load_offset(&self) -> u64 {
        0
    }

    fn location(&self) -> Option<&StorageImageLocation> {
        None
    }

    fn refresh_file_reference(&mut self, _data: &[u8]) {}

    fn cache_key(&self) -> Option<CacheKey> {
        None
    }

    fn set_delayed_storage_location(&mut self, _location: StorageImageLocation) {}

    fn perform_delayed_load(&mut self, _origin: &FileOrigin) {}

    fn set_image_bytes(&mut self, _bytes: Bytes) {}

    fn width(&self) -> u32 {
        self.size.width
    }

    fn height(&self) -> u32 {
        self.size.height
    }

    fn bytes_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn set_information(&mut self, _size: u64, _width: u32, _height: u32) {}

    fn bytes_for_cache(&mut self) -> Bytes {
        self.encoded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::image_decoder::fixtures::png_bytes;

    #[test]
    fn test_always_loaded() {
        let mut source = ImageSource::new(DynamicImage::new_rgb8(8, 6), None);

        assert!(!source.loading());
        assert!(!source.display_loading());
        assert!((source.progress() - 1.0).abs() < f64::EPSILON);
        assert_eq!((source.width(), source.height()), (8, 6));
        assert!(source.cache_key().is_none());
        assert!(source.location().is_none());
        assert!(source.take_loaded().is_some());
    }

    #[test]
    fn test_cancel_does_not_unload() {
        let mut source = ImageSource::new(DynamicImage::new_rgb8(2, 2), None);
        source.cancel();
        source.load(&FileOrigin::Unknown);
        assert!(source.take_loaded().is_some());
    }

    #[test]
    fn test_unload_serializes_then_reloads() {
        let mut source = ImageSource::new(DynamicImage::new_rgb8(16, 4), Some(ImageFormat::Png));
        assert_eq!(source.bytes_size(), 0);

        source.unload();
        assert!(source.bytes_size() > 0);

        let image = source.take_loaded().unwrap();
        assert_eq!((image.width(), image.height()), (16, 4));
    }

    #[test]
    fn test_bytes_for_cache_prefers_original_bytes() {
        let original = png_bytes(3, 3);
        let (decoded, format) = image_decoder::decode(&original).unwrap();
        let mut source = ImageSource::with_bytes(decoded, original.clone(), format);

        assert_eq!(source.bytes_for_cache(), original);
        assert_eq!(source.format(), ImageFormat::Png);
    }

    #[test]
    fn test_bytes_for_cache_encodes_lazily() {
        let mut source = ImageSource::new(DynamicImage::new_rgb8(5, 5), None);
        let bytes = source.bytes_for_cache();

        assert_eq!(image_decoder::probe_dimensions(&bytes), Some(Size::new(5, 5)));
    }
}
