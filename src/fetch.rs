//! Load pages over HTTP so they can be decorated.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;

use crate::dom::MemoryDocument;
use crate::{Error, Result};

/// HTTP settings for `fetch_document`
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string to send with requests
    pub user_agent: String,
    /// Timeout for the whole request in milliseconds
    pub timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("teapot-decor/{}", env!("CARGO_PKG_VERSION")),
            timeout_ms: 30000,
        }
    }
}

/// Whether `input` looks like an absolute http(s) URL
pub fn is_remote(input: &str) -> bool {
    url::Url::parse(input)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Fetch `url` and parse the response body as HTML
pub fn fetch_document(url: &str, config: &FetchConfig) -> Result<MemoryDocument> {
    let parsed = url::Url::parse(url).map_err(|e| Error::LoadError(format!("Invalid URL {}: {}", url, e)))?;

    let client = Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| Error::LoadError(format!("Failed to build HTTP client: {}", e)))?;

    let resp = client
        .get(parsed.as_str())
        .send()
        .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", url, e)))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::LoadError(format!("{} returned HTTP {}", url, status)));
    }

    let body = resp
        .text()
        .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;
    debug!("Fetched {} ({} bytes)", url, body.len());

    MemoryDocument::parse(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_detection() {
        assert!(is_remote("http://example.com/page.html"));
        assert!(is_remote("https://example.com"));
        assert!(!is_remote("index.html"));
        assert!(!is_remote("file:///tmp/index.html"));
        assert!(!is_remote("-"));
    }

    #[test]
    fn invalid_url_is_load_error() {
        let err = fetch_document("not a url", &FetchConfig::default()).unwrap_err();
        assert!(matches!(err, Error::LoadError(_)));
    }
}
