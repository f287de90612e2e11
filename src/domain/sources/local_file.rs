//! Images read from the local filesystem.

use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use super::Source;
use crate::domain::entities::{CacheKey, FileOrigin, Size, StorageImageLocation};
use crate::domain::services::image_decoder;

/// Size reported when a file cannot be read.
const UNREADABLE_SIZE: Size = Size::new(1, 1);

/// A source backed by a file, with optional bytes or image supplied up
/// front.
///
/// Dimensions are resolved on first access: from the decoded image, then
/// from the header of the held bytes, then from the file header.
pub struct LocalFileSource {
    path: PathBuf,
    bytes: Bytes,
    format: Option<ImageFormat>,
    data: Option<Arc<DynamicImage>>,
    dimensions: OnceCell<Size>,
}

impl LocalFileSource {
    /// Creates a source from a path and whatever is already known about it.
    pub fn new(
        path: impl Into<PathBuf>,
        bytes: Bytes,
        format: Option<ImageFormat>,
        data: Option<DynamicImage>,
    ) -> Self {
        Self {
            path: path.into(),
            bytes,
            format,
            data: data.map(Arc::new),
            dimensions: OnceCell::new(),
        }
    }

    /// Creates a source that reads everything from `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Bytes::new(), None, None)
    }

    /// The file being read.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format of the last decoded payload, if known.
    #[must_use]
    pub const fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// True once dimensions have been resolved.
    #[must_use]
    pub fn dimensions_resolved(&self) -> bool {
        self.dimensions.get().is_some()
    }

    fn dimensions(&self) -> Size {
        *self.dimensions.get_or_init(|| {
            if let Some(data) = &self.data {
                return image_decoder::image_size(data);
            }
            if !self.bytes.is_empty()
                && let Some(size) = image_decoder::probe_dimensions(&self.bytes)
            {
                return size;
            }
            image_decoder::probe_file_dimensions(&self.path).unwrap_or_else(|| {
                debug!(path = %self.path.display(), "Using placeholder dimensions");
                UNREADABLE_SIZE
            })
        })
    }

    fn read_file(&self) -> Option<Bytes> {
        match fs::read(&self.path) {
            Ok(contents) => Some(Bytes::from(contents)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read image file");
                None
            }
        }
    }

    fn decode(&mut self, bytes: &[u8]) {
        if let Some((decoded, format)) = image_decoder::decode(bytes) {
            self.format = Some(format);
            let size = image_decoder::image_size(&decoded);
            self.data = Some(Arc::new(decoded));
            self.dimensions = OnceCell::from(size);
        }
    }
}

impl Source for LocalFileSource {
    fn load(&mut self, _origin: &FileOrigin) {}

    fn load_even_cancelled(&mut self, _origin: &FileOrigin) {}

    fn take_loaded(&mut self) -> Option<Arc<DynamicImage>> {
        if self.data.is_none() {
            let bytes = if self.bytes.is_empty() {
                self.read_file()?
            } else {
                self.bytes.clone()
            };
            self.decode(&bytes);
        }
        self.data.clone()
    }

    fn unload(&mut self) {
        self.data = None;
        self.dimensions.take();
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

    fn set_image_bytes(&mut self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }
        self.data = None;
        self.dimensions.take();
        self.decode(&bytes);
        self.bytes = bytes;
    }

    fn width(&self) -> u32 {
        self.dimensions().width
    }

    fn height(&self) -> u32 {
        self.dimensions().height
    }

    fn bytes_size(&self) -> u64 {
        if self.bytes.is_empty() {
            fs::metadata(&self.path).map_or(0, |meta| meta.len())
        } else {
            self.bytes.len() as u64
        }
    }

    fn set_information(&mut self, _size: u64, width: u32, height: u32) {
        if width != 0 && height != 0 {
            self.dimensions = OnceCell::from(Size::new(width, height));
        }
    }

    fn bytes_for_cache(&mut self) -> Bytes {
        if self.bytes.is_empty() {
            self.read_file().unwrap_or_default()
        } else {
            self.bytes.clone()
        }
    }
}
