//! Per-origin robots.txt cache and decision point

use crate::robots::RobotsRules;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use url::Url;

/// Decides whether URLs may be fetched, honoring per-origin robots.txt
///
/// Rules are fetched lazily, at most once per origin even under
/// contention, and cached for the lifetime of the policy.
pub struct RobotsPolicy {
    client: reqwest::Client,
    user_agent: String,
    respect: bool,
    cache: DashMap<String, Arc<OnceCell<RobotsRules>>>,
}

impl RobotsPolicy {
    /// Creates a policy using the crawler's HTTP client and user agent
    pub fn new(client: reqwest::Client, user_agent: String, respect: bool) -> Self {
        Self {
            client,
            user_agent,
            respect,
            cache: DashMap::new(),
        }
    }

    /// Checks whether a URL may be fetched
    ///
    /// Always true when the global respect switch is off. Unparseable
    /// URLs are allowed through; they fail later at fetch time with a
    /// proper error.
    pub async fn allowed(&self, url: &str) -> bool {
        if !self.respect {
            return true;
        }

        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return true,
        };

        let origin = match origin_key(&parsed) {
            Some(o) => o,
            None => return true,
        };

        let cell = self
            .cache
            .entry(origin.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let rules = cell
            .get_or_init(|| async { self.fetch_rules(&origin).await })
            .await;

        let path = if parsed.path().is_empty() {
            "/"
        } else {
            parsed.path()
        };
        rules.is_allowed(path)
    }

    /// Fetches and parses an origin's robots.txt
    ///
    /// Any failure (network, non-200, unreadable body) yields allow-all.
    async fn fetch_rules(&self, origin: &str) -> RobotsRules {
        let robots_url = format!("{}/robots.txt", origin);
        tracing::debug!("Fetching robots.txt from {}", robots_url);

        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => RobotsRules::parse(&body, &self.user_agent),
                Err(e) => {
                    tracing::debug!("Failed reading robots.txt body from {}: {}", robots_url, e);
                    RobotsRules::allow_all()
                }
            },
            Ok(response) => {
                tracing::debug!(
                    "No robots.txt at {} (status {})",
                    robots_url,
                    response.status()
                );
                RobotsRules::allow_all()
            }
            Err(e) => {
                tracing::debug!("Failed to fetch robots.txt from {}: {}", robots_url, e);
                RobotsRules::allow_all()
            }
        }
    }

    /// Number of origins with cached rules
    pub fn cached_origins(&self) -> usize {
        self.cache.len()
    }

    /// Drops all cached rules
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Cache key `scheme://host[:port]`; ports appear only when explicit
fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}://{}:{}", url.scheme(), host, port)),
        None => Some(format!("{}://{}", url.scheme(), host)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(respect: bool) -> RobotsPolicy {
        RobotsPolicy::new(reqwest::Client::new(), "TestBot/1.0".to_string(), respect)
    }

    #[test]
    fn test_origin_key() {
        let url = Url::parse("https://example.com/a/b").unwrap();
        assert_eq!(origin_key(&url).unwrap(), "https://example.com");

        let with_port = Url::parse("http://example.com:8080/a").unwrap();
        assert_eq!(origin_key(&with_port).unwrap(), "http://example.com:8080");
    }

    #[tokio::test]
    async fn test_respect_disabled_allows_everything() {
        let policy = policy(false);
        assert!(policy.allowed("https://example.com/private").await);
        // Nothing is fetched or cached when the switch is off
        assert_eq!(policy.cached_origins(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_url_allowed() {
        let policy = policy(true);
        assert!(policy.allowed("not a url").await);
    }
}
