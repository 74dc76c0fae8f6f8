use url::Url;

/// Longest URL the crawler will consider; anything longer is dropped
const MAX_URL_LENGTH: usize = 2048;

/// Path suffixes that identify media or binary content
const BINARY_SUFFIXES: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "ico", "webp", "pdf", "doc", "docx", "xls", "xlsx",
    "ppt", "pptx", "zip", "rar", "tar", "gz", "7z", "mp3", "mp4", "avi", "mov", "wmv", "flv",
    "wav", "exe", "dmg", "pkg", "deb", "rpm",
];

/// Decides whether a URL may enter the crawl frontier
///
/// Rejects:
/// - non-http(s) schemes (`mailto:`, `javascript:`, `tel:`, `ftp:`, ...)
/// - URLs whose path ends in a media or binary suffix
/// - URLs longer than 2048 characters
/// - anything that does not parse as a URL with a host
///
/// # Examples
///
/// ```
/// use searchlight::url::admissible;
///
/// assert!(admissible("https://example.com/article"));
/// assert!(!admissible("https://example.com/image.jpg"));
/// assert!(!admissible("mailto:someone@example.com"));
/// ```
pub fn admissible(url: &str) -> bool {
    if url.len() > MAX_URL_LENGTH {
        return false;
    }

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    if parsed.host_str().is_none() {
        return false;
    }

    let path = parsed.path().to_ascii_lowercase();
    if let Some((_, suffix)) = path.rsplit_once('.') {
        if BINARY_SUFFIXES.contains(&suffix) {
            return false;
        }
    }

    true
}

/// Checks whether two URLs share an origin host
///
/// Host comparison is case-insensitive (hosts are lowercased during
/// parsing). Malformed input never matches.
pub fn same_origin(a: &str, b: &str) -> bool {
    let host_a = Url::parse(a).ok().and_then(|u| u.host_str().map(str::to_owned));
    let host_b = Url::parse(b).ok().and_then(|u| u.host_str().map(str::to_owned));

    match (host_a, host_b) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
