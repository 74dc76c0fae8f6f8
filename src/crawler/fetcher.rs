//! HTTP fetching for the crawler
//!
//! One client is built per engine with the configured user agent and
//! timeout. Redirects follow the client's default policy; any 2xx HTML
//! response is accepted, everything else is classified as a per-page
//! error and the crawl continues.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// A successfully fetched HTML page
#[derive(Debug)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Raw HTML body
    pub body: String,
}

/// Per-page fetch failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("unsupported content type: {0}")]
    NotHtml(String),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Builds the crawler's HTTP client
pub fn build_http_client(user_agent: &str, timeout_ms: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_millis(timeout_ms))
        .connect_timeout(Duration::from_millis(timeout_ms.min(10_000)))
        .gzip(true)
        .build()
}

/// Fetches a URL, accepting only 2xx HTML responses
pub async fn fetch_html(client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
    let response = client.get(url).send().await.map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    // A missing header is given the benefit of the doubt
    if !content_type.is_empty() && !content_type.contains("text/html") {
        return Err(FetchError::NotHtml(content_type));
    }

    let final_url = response.url().to_string();
    let body = response.text().await.map_err(classify)?;

    Ok(FetchedPage {
        final_url,
        status: status.as_u16(),
        body,
    })
}

fn classify(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client("TestBot/1.0", 5_000);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transport_error() {
        let client = build_http_client("TestBot/1.0", 1_000).unwrap();
        // Port 1 on localhost refuses connections
        let result = fetch_html(&client, "http://127.0.0.1:1/").await;
        assert!(matches!(
            result,
            Err(FetchError::Transport(_)) | Err(FetchError::Timeout)
        ));
    }
}
