use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host, or None if the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use detail_harvest::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives the rate-limit key for a URL
///
/// The key is the network location: lowercase host plus the port when one is
/// written explicitly. Default ports are folded away by the URL parser, so
/// `https://a.com:443/` and `https://a.com/` share a key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use detail_harvest::url::host_key;
///
/// let url = Url::parse("https://Shop.Example.com/item/p").unwrap();
/// assert_eq!(host_key(&url), Some("shop.example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/item").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let domain = extract_domain(url)?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", domain, port)),
        None => Some(domain),
    }
}
