//! Identifiers for remotely hosted image blobs.

use super::Size;

/// Identity of a blob in the cloud storage.
///
/// The `file_reference` is an access token that can expire. It is part of
/// what the loader sends, but not part of the blob's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StorageFileLocation {
    /// Storage cluster holding the blob.
    pub dc_id: i32,
    /// Volume within the cluster.
    pub volume_id: u64,
    /// Local identifier within the volume.
    pub local_id: i32,
    /// Access token embedded in the location.
    pub file_reference: Vec<u8>,
}

impl StorageFileLocation {
    /// Creates a location without an access token.
    #[must_use]
    pub const fn new(dc_id: i32, volume_id: u64, local_id: i32) -> Self {
        Self {
            dc_id,
            volume_id,
            local_id,
            file_reference: Vec::new(),
        }
    }

    /// Attaches an access token.
    #[must_use]
    pub fn with_file_reference(mut self, file_reference: impl Into<Vec<u8>>) -> Self {
        self.file_reference = file_reference.into();
        self
    }

    /// Returns true if the location points at an actual blob.
    #[must_use]
    pub const fn valid(&self) -> bool {
        self.dc_id != 0 && self.volume_id != 0
    }

    /// Replaces a stale access token. Empty data is ignored.
    pub fn refresh_file_reference(&mut self, data: &[u8]) {
        if !data.is_empty() {
            self.file_reference = data.to_vec();
        }
    }

    /// Compares identity, ignoring the access token.
    #[must_use]
    pub fn same_file(&self, other: &Self) -> bool {
        self.dc_id == other.dc_id
            && self.volume_id == other.volume_id
            && self.local_id == other.local_id
    }
}

impl std::fmt::Display for StorageFileLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.dc_id, self.volume_id, self.local_id)
    }
}

/// A storage blob that is known to be an image of a given size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StorageImageLocation {
    /// The blob.
    pub file: StorageFileLocation,
    /// Image width, 0 if unknown.
    pub width: u32,
    /// Image height, 0 if unknown.
    pub height: u32,
}

impl StorageImageLocation {
    /// Creates an image location.
    #[must_use]
    pub const fn new(file: StorageFileLocation, width: u32, height: u32) -> Self {
        Self {
            file,
            width,
            height,
        }
    }

    /// Placeholder used before a delayed location is resolved.
    #[must_use]
    pub const fn invalid() -> Self {
        Self::new(StorageFileLocation::new(0, 0, 0), 0, 0)
    }

    /// Returns true if the blob location is usable.
    #[must_use]
    pub const fn valid(&self) -> bool {
        self.file.valid()
    }

    /// Returns the stored dimensions.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// A file served by the web-document proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct WebFileLocation {
    /// Original address of the document.
    pub url: String,
    /// Proxy access hash.
    pub access_hash: u64,
}

impl WebFileLocation {
    /// Creates a web file location.
    #[must_use]
    pub fn new(url: impl Into<String>, access_hash: u64) -> Self {
        Self {
            url: url.into(),
            access_hash,
        }
    }

    /// Returns true if there is no address.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.url.is_empty()
    }
}

/// A rendered map tile centered on a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPointLocation {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Proxy access hash.
    pub access_hash: u64,
    /// Tile width in logical pixels.
    pub width: u32,
    /// Tile height in logical pixels.
    pub height: u32,
    /// Map zoom level.
    pub zoom: u8,
    /// Pixel density multiplier.
    pub scale: u8,
}

impl GeoPointLocation {
    /// Creates a tile location with the given logical size.
    #[must_use]
    pub const fn new(lat: f64, lon: f64, width: u32, height: u32, zoom: u8, scale: u8) -> Self {
        Self {
            lat,
            lon,
            access_hash: 0,
            width,
            height,
            zoom,
            scale,
        }
    }

    /// Physical pixel size of the rendered tile.
    #[must_use]
    pub const fn pixel_size(&self) -> Size {
        let scale = self.scale as u32;
        Size::new(self.width * scale, self.height * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_validity() {
        assert!(StorageFileLocation::new(2, 100, 5).valid());
        assert!(!StorageFileLocation::new(0, 100, 5).valid());
        assert!(!StorageFileLocation::new(2, 0, 5).valid());
        assert!(!StorageImageLocation::invalid().valid());
    }

    #[test]
    fn test_refresh_file_reference_keeps_identity() {
        let original = StorageFileLocation::new(2, 100, 5).with_file_reference(b"old".to_vec());
        let mut refreshed = original.clone();
        refreshed.refresh_file_reference(b"new");

        assert_eq!(refreshed.file_reference, b"new");
        assert!(refreshed.same_file(&original));
        assert_ne!(refreshed, original);
    }

    #[test]
    fn test_refresh_with_empty_data_is_ignored() {
        let mut location = StorageFileLocation::new(2, 100, 5).with_file_reference(b"token".to_vec());
        location.refresh_file_reference(&[]);
        assert_eq!(location.file_reference, b"token");
    }

    #[test]
    fn test_geo_pixel_size() {
        let location = GeoPointLocation::new(51.5, -0.12, 300, 200, 15, 2);
        assert_eq!(location.pixel_size(), Size::new(600, 400));
    }
}
