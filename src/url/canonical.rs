use crate::{UrlError, UrlResult};
use url::Url;

/// Canonicalizes a URL string
///
/// # Canonicalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. Strip the fragment
/// 3. Require an `http` or `https` scheme; lowercase scheme and host
/// 4. Drop the port when it equals the scheme default; keep it otherwise
/// 5. An empty path becomes `/`
/// 6. Remove a single trailing slash from non-root paths
/// 7. Preserve the query string verbatim
///
/// Canonicalization is idempotent: feeding the output back in yields the
/// same string.
///
/// # Arguments
///
/// * `raw` - The URL string to canonicalize
///
/// # Returns
///
/// * `Ok(String)` - The canonical URL
/// * `Err(UrlError)` - The input is malformed or uses an unsupported scheme
///
/// # Examples
///
/// ```
/// use searchlight::url::canonicalize;
///
/// let url = canonicalize("HTTPS://Example.COM/path/").unwrap();
/// assert_eq!(url, "https://example.com/path");
/// ```
pub fn canonicalize(raw: &str) -> UrlResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Malformed("empty URL".to_string()));
    }

    // The url crate lowercases scheme and host and drops default ports
    let mut url = Url::parse(trimmed).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    // An absent path already parses as "/"; strip one trailing slash elsewhere
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let stripped = path[..path.len() - 1].to_string();
        url.set_path(&stripped);
    }

    Ok(url.to_string())
}

/// Resolves a reference against a base URL, then canonicalizes the result
///
/// Relative resolution follows RFC 3986 via `Url::join`.
///
/// # Arguments
///
/// * `base` - The base URL (typically the page the link was found on)
/// * `reference` - The href value, absolute or relative
///
/// # Returns
///
/// * `Ok(String)` - The canonical absolute URL
/// * `Err(UrlError)` - Base or reference is malformed, or the result is
///   not an http(s) URL
pub fn resolve(base: &str, reference: &str) -> UrlResult<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(UrlError::Malformed("empty reference".to_string()));
    }

    let base_url = Url::parse(base).map_err(|e| UrlError::Parse(e.to_string()))?;
    let joined = base_url
        .join(reference)
        .map_err(|e| UrlError::Parse(e.to_string()))?;

    canonicalize(joined.as_str())
}
