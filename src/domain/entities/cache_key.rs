//! Keys into the persistent content cache.

use hex::FromHex;
use sha2::{Digest, Sha256};

use super::{GeoPointLocation, Size, StorageFileLocation, WebFileLocation};

/// Tag for storage blobs.
pub const STORAGE_CACHE_TAG: u64 = 0x0000_0100_0000_0000;
/// Tag for web-document proxy files.
pub const WEB_DOCUMENT_CACHE_TAG: u64 = 0x0000_0200_0000_0000;
/// Tag for arbitrary URLs.
pub const URL_CACHE_TAG: u64 = 0x0000_0300_0000_0000;
/// Tag for map tiles.
pub const GEO_POINT_CACHE_TAG: u64 = 0x0000_0400_0000_0000;

/// Cluster id folded into web-document keys.
const WEB_DOCUMENT_CACHE_DC: u64 = 4;

/// A 128-bit key into the persistent cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    /// Tag and kind-specific bits.
    pub high: u64,
    /// Kind-specific bits.
    pub low: u64,
}

impl CacheKey {
    /// Creates a key from raw parts.
    #[must_use]
    pub const fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    /// Key for a storage blob. The access token does not participate.
    #[must_use]
    pub const fn storage(location: &StorageFileLocation) -> Self {
        let dc = (location.dc_id as u64) & 0xFF;
        Self::new(
            STORAGE_CACHE_TAG | (dc << 32) | (location.local_id as u32 as u64),
            location.volume_id,
        )
    }

    /// Key for a web-document proxy file fetched into `shrink_box`.
    #[must_use]
    pub fn web_document(location: &WebFileLocation, shrink_box: Size) -> Self {
        let (part1, part2) = hash_parts(&location.url, shrink_box);
        Self::new(
            WEB_DOCUMENT_CACHE_TAG | ((WEB_DOCUMENT_CACHE_DC & 0xFF) << 32) | u64::from(part1),
            part2,
        )
    }

    /// Key for a plain URL fetched into `shrink_box`.
    #[must_use]
    pub fn url(url: &str, shrink_box: Size) -> Self {
        let (part1, part2) = hash_parts(url, shrink_box);
        Self::new(URL_CACHE_TAG | u64::from(part1), part2)
    }

    /// Key for a map tile. Coordinates are quantized to `f32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn geo_point(location: &GeoPointLocation) -> Self {
        let zoomscale =
            ((u64::from(location.zoom) & 0x0F) << 8) | (u64::from(location.scale) & 0x0F);
        let widthheight =
            ((u64::from(location.width) & 0xFFFF) << 16) | (u64::from(location.height) & 0xFFFF);
        let lat = u64::from((location.lat as f32).to_bits());
        let lon = u64::from((location.lon as f32).to_bits());
        Self::new(
            GEO_POINT_CACHE_TAG | (zoomscale << 32) | widthheight,
            (lat << 32) | lon,
        )
    }

    /// Returns the kind tag.
    #[must_use]
    pub const fn tag(&self) -> u64 {
        self.high & 0x0000_FF00_0000_0000
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.high, self.low)
    }
}

impl std::str::FromStr for CacheKey {
    type Err = hex::FromHexError;

    /// Parses the 32 hex digit form written by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = <[u8; 16]>::from_hex(s)?;
        let (high, low) = raw.split_at(8);
        let mut high_bytes = [0u8; 8];
        high_bytes.copy_from_slice(high);
        let mut low_bytes = [0u8; 8];
        low_bytes.copy_from_slice(low);
        Ok(Self::new(
            u64::from_be_bytes(high_bytes),
            u64::from_be_bytes(low_bytes),
        ))
    }
}

fn hash_parts(url: &str, shrink_box: Size) -> (u32, u64) {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    if !shrink_box.is_empty() {
        hasher.update(format!("#{shrink_box}").as_bytes());
    }
    let hash = hasher.finalize();

    let mut first = [0u8; 4];
    first.copy_from_slice(&hash[..4]);
    let mut second = [0u8; 8];
    second.copy_from_slice(&hash[4..12]);
    (u32::from_le_bytes(first), u64::from_le_bytes(second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_storage_key_layout() {
        let location = StorageFileLocation::new(2, 0xDEAD_BEEF, 7);
        let key = CacheKey::storage(&location);

        assert_eq!(key.high, STORAGE_CACHE_TAG | (2 << 32) | 7);
        assert_eq!(key.low, 0xDEAD_BEEF);
        assert_eq!(key.tag(), STORAGE_CACHE_TAG);
    }

    #[test]
    fn test_storage_key_ignores_file_reference() {
        let plain = StorageFileLocation::new(2, 100, 7);
        let with_token = plain.clone().with_file_reference(b"token".to_vec());
        assert_eq!(CacheKey::storage(&plain), CacheKey::storage(&with_token));
    }

    #[test]
    fn test_negative_local_id_stays_in_low_bits() {
        let key = CacheKey::storage(&StorageFileLocation::new(1, 5, -1));
        assert_eq!(key.high & 0xFFFF_FFFF, 0xFFFF_FFFF);
        assert_eq!(key.tag(), STORAGE_CACHE_TAG);
    }

    #[test]
    fn test_url_key_depends_on_box() {
        let url = "https://example.com/cat.png";
        let plain = CacheKey::url(url, Size::EMPTY);
        let boxed = CacheKey::url(url, Size::new(100, 100));

        assert_ne!(plain, boxed);
        assert_eq!(plain, CacheKey::url(url, Size::new(0, 50)));
        assert_eq!(plain.tag(), URL_CACHE_TAG);
    }

    #[test]
    fn test_web_document_and_url_keys_differ() {
        let location = WebFileLocation::new("https://example.com/a.jpg", 1);
        let web = CacheKey::web_document(&location, Size::EMPTY);
        let url = CacheKey::url(&location.url, Size::EMPTY);

        assert_ne!(web, url);
        assert_eq!(web.low, url.low);
        assert_eq!(web.tag(), WEB_DOCUMENT_CACHE_TAG);
    }

    #[test_case(51.5, -0.12, 51.500_000_1, -0.12, true ; "below_f32_precision")]
    #[test_case(51.5, -0.12, 51.6, -0.12, false ; "different_latitude")]
    #[test_case(51.5, -0.12, 51.5, -0.13, false ; "different_longitude")]
    fn test_geo_key_quantization(lat1: f64, lon1: f64, lat2: f64, lon2: f64, equal: bool) {
        let first = CacheKey::geo_point(&GeoPointLocation::new(lat1, lon1, 300, 200, 15, 2));
        let second = CacheKey::geo_point(&GeoPointLocation::new(lat2, lon2, 300, 200, 15, 2));
        assert_eq!(first == second, equal);
    }

    #[test]
    fn test_geo_key_includes_zoom_and_size() {
        let base = GeoPointLocation::new(10.0, 20.0, 300, 200, 15, 2);
        let zoomed = GeoPointLocation { zoom: 16, ..base };
        let wider = GeoPointLocation { width: 301, ..base };

        let key = CacheKey::geo_point(&base);
        assert_ne!(key, CacheKey::geo_point(&zoomed));
        assert_ne!(key, CacheKey::geo_point(&wider));
        assert_eq!(key.high & 0xFFFF_FFFF, (300 << 16) | 200);
    }

    #[test]
    fn test_display_and_parse() {
        let key = CacheKey::new(0x0000_0100_0000_0002, 0xABCD);
        let text = key.to_string();

        assert_eq!(text, "0000010000000002000000000000abcd");
        assert_eq!(text.parse::<CacheKey>(), Ok(key));
    }

    #[test_case("éaaaaaaaaaaaaaaa" ; "multibyte")]
    #[test_case("00000100000000020000000000abcd" ; "short")]
    #[test_case("0000010000000002000000000000abcdff" ; "long")]
    #[test_case("000001000000000z000000000000abcd" ; "not_hex")]
    #[test_case("" ; "empty")]
    fn test_parse_rejects_malformed(text: &str) {
        assert!(text.parse::<CacheKey>().is_err());
    }
}
