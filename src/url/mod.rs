//! URL handling module for Detail-Harvest
//!
//! Locator URLs are used verbatim as dedup keys; this module only parses them
//! and derives the host key that scopes the per-host politeness delay.

mod domain;

pub use domain::{extract_domain, host_key};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses a locator URL, accepting only absolute HTTP(S) URLs with a host
///
/// # Examples
///
/// ```
/// use detail_harvest::url::parse_locator_url;
///
/// assert!(parse_locator_url("https://example.com/item/p").is_ok());
/// assert!(parse_locator_url("ftp://example.com/item").is_err());
/// assert!(parse_locator_url("/relative/path").is_err());
/// ```
pub fn parse_locator_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(raw.to_string()));
    }

    Ok(url)
}
