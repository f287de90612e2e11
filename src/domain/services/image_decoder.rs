//! Decoding and encoding of raw image bytes.
//!
//! Failures are reported as `None`: an undecodable payload is "no image",
//! never an error the caller has to handle.

use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::{trace, warn};

use crate::domain::entities::Size;

/// Returns the pixel size of an image.
#[must_use]
pub fn image_size(image: &DynamicImage) -> Size {
    Size::new(image.width(), image.height())
}

/// Decodes bytes, guessing the format from the content.
#[must_use]
pub fn decode(bytes: &[u8]) -> Option<(DynamicImage, ImageFormat)> {
    if bytes.is_empty() {
        return None;
    }
    let format = image::guess_format(bytes).ok()?;
    match image::load_from_memory_with_format(bytes, format) {
        Ok(image) => Some((image, format)),
        Err(e) => {
            warn!(error = %e, len = bytes.len(), "Failed to decode image bytes");
            None
        }
    }
}

/// Decodes bytes and shrinks the result to fit inside `shrink_box`.
///
/// Aspect ratio is preserved and images are never upscaled. An empty box
/// keeps the full size.
#[must_use]
pub fn decode_shrunk(bytes: &[u8], shrink_box: Size) -> Option<(DynamicImage, ImageFormat)> {
    let (image, format) = decode(bytes)?;
    Some((shrink_to_fit(image, shrink_box), format))
}

/// Shrinks an image to fit inside `shrink_box`.
#[must_use]
pub fn shrink_to_fit(image: DynamicImage, shrink_box: Size) -> DynamicImage {
    if shrink_box.is_empty() || !shrink_box.is_exceeded_by(image_size(&image)) {
        return image;
    }
    trace!(from = %image_size(&image), into = %shrink_box, "Shrinking image");
    image.resize(shrink_box.width, shrink_box.height, FilterType::Lanczos3)
}

/// Reads dimensions from the image header without decoding pixels.
#[must_use]
pub fn probe_dimensions(bytes: &[u8]) -> Option<Size> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    reader.into_dimensions().ok().map(Size::from)
}

/// Reads dimensions from an image file header.
#[must_use]
pub fn probe_file_dimensions(path: &Path) -> Option<Size> {
    match image::image_dimensions(path) {
        Ok(dimensions) => Some(Size::from(dimensions)),
        Err(e) => {
            trace!(path = %path.display(), error = %e, "Could not read image dimensions");
            None
        }
    }
}

/// Encodes an image, falling back to PNG when `format` cannot represent it.
#[must_use]
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Bytes {
    let mut buffer = Cursor::new(Vec::new());
    if let Err(e) = image.write_to(&mut buffer, format) {
        trace!(format = ?format, error = %e, "Encoder rejected image, using PNG");
        buffer = Cursor::new(Vec::new());
        if let Err(e) = image.write_to(&mut buffer, ImageFormat::Png) {
            warn!(error = %e, "Failed to encode image");
            return Bytes::new();
        }
    }
    Bytes::from(buffer.into_inner())
}


#[cfg(test)]
mod tests {
    use super::fixtures::png_bytes;
    use super::*;

    #[test]
    fn test_decode_png() {
        let (image, format) = decode(&png_bytes(12, 8)).unwrap();
        assert_eq!(image_size(&image), Size::new(12, 8));
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_decode_garbage_is_none() {
        assert!(decode(b"definitely not an image").is_none());
        assert!(decode(&[]).is_none());
    }

    #[test]
    fn test_shrink_preserves_aspect() {
        let (image, _) = decode_shrunk(&png_bytes(200, 100), Size::new(50, 50)).unwrap();
        assert_eq!(image_size(&image), Size::new(50, 25));
    }

    #[test]
    fn test_shrink_never_upscales() {
        let (image, _) = decode_shrunk(&png_bytes(20, 10), Size::new(50, 50)).unwrap();
        assert_eq!(image_size(&image), Size::new(20, 10));
    }

    #[test]
    fn test_empty_box_keeps_size() {
        let (image, _) = decode_shrunk(&png_bytes(200, 100), Size::EMPTY).unwrap();
        assert_eq!(image_size(&image), Size::new(200, 100));
    }

    #[test]
    fn test_probe_dimensions() {
        assert_eq!(probe_dimensions(&png_bytes(33, 44)), Some(Size::new(33, 44)));
        assert_eq!(probe_dimensions(b"nope"), None);
    }

    #[test]
    fn test_probe_file_dimensions() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("probe.png");
        std::fs::write(&path, png_bytes(7, 9))?;

        assert_eq!(probe_file_dimensions(&path), Some(Size::new(7, 9)));
        assert_eq!(probe_file_dimensions(&dir.path().join("missing.png")), None);
        Ok(())
    }

    #[test]
    fn test_encode_jpeg_from_rgba_falls_back() {
        let image = DynamicImage::new_rgba8(4, 4);
        let bytes = encode(&image, ImageFormat::Jpeg);
        assert!(!bytes.is_empty());
        assert!(decode(&bytes).is_some());
    }
}
