//! Location resolution and MIME lookup for deliveries.

use reqwest::Url;

use super::error::DeliveryError;

/// MIME type used when the extension is not recognised.
pub const FALLBACK_MIME: &str = "audio/mpeg";

/// MIME type for a converted file extension.
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "aac" => "audio/aac",
        _ => FALLBACK_MIME,
    }
}

/// Extension of a filename, if it has one.
pub fn extension_of(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext).filter(|e| !e.is_empty())
}

/// Resolves a location returned by the conversion service against its base URL.
///
/// Fully qualified http(s) URLs are returned unchanged. Paths that already
/// start with the base path are joined to the base origin; any other location
/// is appended to the base URL.
pub fn resolve_location(base_url: &str, location: &str) -> Result<String, DeliveryError> {
    let invalid = |reason: String| DeliveryError::InvalidLocation {
        location: location.to_string(),
        reason,
    };

    if let Ok(url) = Url::parse(location) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(url.to_string());
        }
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }

    let base = Url::parse(base_url).map_err(|e| invalid(format!("bad base URL: {}", e)))?;
    let base_path = base.path().trim_end_matches('/');

    if !base_path.is_empty() && location.starts_with(&format!("{}/", base_path)) {
        return base
            .join(location)
            .map(|u| u.to_string())
            .map_err(|e| invalid(e.to_string()));
    }

    let separator = if location.starts_with('/') { "" } else { "/" };
    let joined = format!("{}{}{}", base_url.trim_end_matches('/'), separator, location);
    Url::parse(&joined)
        .map(|u| u.to_string())
        .map_err(|e| invalid(e.to_string()))
}
