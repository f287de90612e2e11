//! Resolution of loader targets to fetchable addresses.

use crate::domain::entities::{GeoPointLocation, Size, StorageFileLocation};
use crate::domain::errors::LoaderError;
use crate::domain::ports::LoaderTarget;
use crate::infrastructure::config::EndpointsConfig;

/// Query parameters replaced when a size hint is added.
const SIZE_PARAMS: [&str; 2] = ["width", "height"];

/// Returns the address to fetch for `target`.
///
/// A non-empty `shrink_box` adds `width`/`height` hints so servers that
/// support it can return a resized variant.
///
/// # Errors
/// Returns error if the target has no usable address.
pub fn resolve(
    target: &LoaderTarget,
    shrink_box: Size,
    endpoints: &EndpointsConfig,
) -> Result<String, LoaderError> {
    let url = match target {
        LoaderTarget::Storage { location, .. } => storage_url(&endpoints.storage_base_url, location)?,
        LoaderTarget::WebFile { location, .. } => {
            if location.is_null() {
                return Err(LoaderError::unresolvable(target.to_string()));
            }
            checked(&location.url)?
        }
        LoaderTarget::GeoPoint { location, .. } => geo_url(&endpoints.geo_tile_url, location),
        LoaderTarget::Url(url) => checked(url)?,
    };
    Ok(with_size_hint(&url, shrink_box))
}

fn checked(url: &str) -> Result<String, LoaderError> {
    if url.is_empty() {
        return Err(LoaderError::invalid_url("empty"));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(LoaderError::invalid_url(format!("unsupported scheme in {url}")));
    }
    Ok(url.to_string())
}

fn storage_url(base: &str, location: &StorageFileLocation) -> Result<String, LoaderError> {
    if !location.valid() {
        return Err(LoaderError::unresolvable(location.to_string()));
    }
    let base = base.trim_end_matches('/');
    let mut url = format!(
        "{base}/{}/{}/{}",
        location.dc_id, location.volume_id, location.local_id
    );
    if !location.file_reference.is_empty() {
        url.push_str("?file_reference=");
        url.push_str(&hex::encode(&location.file_reference));
    }
    checked(&url)
}

fn geo_url(template: &str, location: &GeoPointLocation) -> String {
    template
        .replace("{lat}", &format!("{:.6}", location.lat))
        .replace("{lon}", &format!("{:.6}", location.lon))
        .replace("{width}", &location.width.to_string())
        .replace("{height}", &location.height.to_string())
        .replace("{zoom}", &location.zoom.to_string())
        .replace("{scale}", &location.scale.to_string())
}

/// Adds `width` and `height` query parameters, replacing existing ones.
#[must_use]
pub fn with_size_hint(url: &str, shrink_box: Size) -> String {
    if shrink_box.is_empty() {
        return url.to_string();
    }

    let (base_url, existing_params) = match url.split_once('?') {
        Some((base, params)) => (base, Some(params)),
        None => (url, None),
    };

    let mut params = Vec::new();
    if let Some(existing) = existing_params {
        for param in existing.split('&').filter(|p| !p.is_empty()) {
            let key = param.split('=').next().unwrap_or("");
            if !SIZE_PARAMS.contains(&key) {
                params.push(param.to_string());
            }
        }
    }
    params.push(format!("width={}", shrink_box.width));
    params.push(format!("height={}", shrink_box.height));

    format!("{}?{}", base_url, params.join("&"))
}
