//! HTTP client trait and implementations.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::FetchError;

use super::cache::DiskCache;
use super::rate_limiter::RateLimiter;

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch HTML content from a URL.
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

/// Configuration for CachingClient.
#[derive(Clone)]
pub struct CachingClientBuilder {
    cache_dir: Option<PathBuf>,
    rate_limit_ms: u64,
    offline_mode: bool,
    timeout: Duration,
    user_agent: String,
}

impl Default for CachingClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CachingClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Environment variables:
    /// - `CHEFKOCH_HTTP_CACHE`: "none" (default), "disk", or a path
    /// - `CHEFKOCH_HTTP_CACHE_OFFLINE`: "true" to serve cached pages without revalidation
    /// - `CHEFKOCH_RATE_LIMIT_MS`: delay between requests to the same host (default 250)
    pub fn new() -> Self {
        let cache_dir = match std::env::var("CHEFKOCH_HTTP_CACHE").ok() {
            Some(val) if val == "none" || val.is_empty() => None,
            Some(val) if val == "disk" => Some(DiskCache::default_dir()),
            Some(path) => Some(PathBuf::from(path)),
            None => None,
        };

        let offline_mode = std::env::var("CHEFKOCH_HTTP_CACHE_OFFLINE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let rate_limit_ms = std::env::var("CHEFKOCH_RATE_LIMIT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(250);

        Self {
            cache_dir,
            rate_limit_ms,
            offline_mode,
            timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (compatible; chefkoch-sensors/0.1)".to_string(),
        }
    }

    /// Set the cache directory. None disables caching.
    pub fn cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cache_dir = dir;
        self
    }

    /// Set the rate limit delay in milliseconds. 0 disables rate limiting.
    pub fn rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    /// When true, cached responses are used without network validation.
    pub fn offline_mode(mut self, offline: bool) -> Self {
        self.offline_mode = offline;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn build(self) -> Result<CachingClient, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        Ok(CachingClient {
            inner,
            cache: self.cache_dir.map(DiskCache::new),
            rate_limiter: RateLimiter::new(Duration::from_millis(self.rate_limit_ms)),
            offline_mode: self.offline_mode,
        })
    }
}

/// Production HTTP client with rate limiting and optional ETag-validated cache.
pub struct CachingClient {
    inner: reqwest::Client,
    cache: Option<DiskCache>,
    rate_limiter: RateLimiter,
    offline_mode: bool,
}

/// Headers worth remembering next to a cached body.
struct ResponseMeta {
    content_type: Option<String>,
    etag: Option<String>,
    last_modified: Option<String>,
}

impl ResponseMeta {
    fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        };
        Self {
            content_type: get("content-type"),
            etag: get("etag"),
            last_modified: get("last-modified"),
        }
    }
}

impl CachingClient {
    /// Create a new CachingClient with default configuration.
    pub fn new() -> Result<Self, reqwest::Error> {
        CachingClientBuilder::new().build()
    }

    pub fn builder() -> CachingClientBuilder {
        CachingClientBuilder::new()
    }

    pub fn cache_stats(&self) -> Option<super::cache::CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    fn get_host(url: &reqwest::Url) -> Option<String> {
        url.host_str().map(|h| h.to_string())
    }

    fn store(&self, url: &str, bytes: &[u8], meta: ResponseMeta) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(url, bytes, meta.content_type, meta.etag, meta.last_modified)
            {
                tracing::warn!(url, error = %e, "failed to write page cache");
            }
        }
    }

    async fn fetch_with_cache(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let cached = self.cache.as_ref().and_then(|c| c.get(url));

        if let Some(cached) = &cached {
            if self.offline_mode {
                tracing::debug!(url, "cache hit (offline mode)");
                return Ok(cached.data.clone());
            }
        } else if self.offline_mode && self.cache.is_some() {
            return Err(FetchError::NotCached(url.to_string()));
        }

        if let Some(host) = Self::get_host(&parsed) {
            self.rate_limiter.wait(&host).await;
        }

        let mut request = self.inner.get(parsed);
        if let Some(cached) = &cached {
            if let Some(etag) = &cached.metadata.etag {
                request = request.header("If-None-Match", etag);
            }
            if let Some(last_modified) = &cached.metadata.last_modified {
                request = request.header("If-Modified-Since", last_modified);
            }
        }

        tracing::debug!(url, revalidate = cached.is_some(), "network: fetching");
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return match cached {
                    Some(cached) => {
                        tracing::warn!(url, error = %e, "network error, using cached copy");
                        Ok(cached.data)
                    }
                    None => Err(FetchError::RequestFailed(e)),
                };
            }
        };

        if response.status() == reqwest::StatusCode::NOT_MODIFIED {
            if let Some(cached) = cached {
                tracing::debug!(url, "cache valid (304 Not Modified)");
                return Ok(cached.data);
            }
        }

        let response = response.error_for_status().map_err(|e| {
            tracing::debug!(url, error = %e, "network: request failed");
            FetchError::RequestFailed(e)
        })?;

        tracing::debug!(url, status = %response.status(), "network: fetched successfully");
        let meta = ResponseMeta::from_headers(response.headers());
        let bytes = response.bytes().await?.to_vec();
        self.store(url, &bytes, meta);

        Ok(bytes)
    }
}

#[async_trait]
impl HttpClient for CachingClient {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let bytes = self.fetch_with_cache(url).await?;
        String::from_utf8(bytes)
            .map_err(|e| FetchError::InvalidEncoding(format!("Invalid UTF-8 in response: {}", e)))
    }
}

/// Mock response for testing.
#[derive(Clone)]
pub enum MockResponse {
    Html(String),
    Error(String),
}

/// Mock HTTP client for testing. Unregistered urls fail.
#[derive(Default)]
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn with_html(self, url: &str, html: &str) -> Self {
        self.with_response(url, MockResponse::Html(html.to_string()))
    }

    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        match self.responses.get(url) {
            Some(MockResponse::Html(html)) => Ok(html.clone()),
            Some(MockResponse::Error(e)) => Err(FetchError::Status(e.clone())),
            None => Err(FetchError::Status(format!(
                "No mock response for URL: {}",
                url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn mock_client_serves_registered_pages() {
        let client = MockClient::new()
            .with_html("https://example.com/a", "<p>a</p>")
            .with_error("https://example.com/b", "HTTP 500");

        assert_eq!(
            client.fetch_html("https://example.com/a").await.unwrap(),
            "<p>a</p>"
        );
        assert!(matches!(
            client.fetch_html("https://example.com/b").await,
            Err(FetchError::Status(e)) if e == "HTTP 500"
        ));
        assert!(matches!(
            client.fetch_html("https://example.com/c").await,
            Err(FetchError::Status(_))
        ));
    }

    #[tokio::test]
    async fn offline_mode_serves_cache_without_network() {
        let temp_dir = TempDir::new().unwrap();
        let url = "https://www.chefkoch.de/rezepte/1/Suppe.html";
        DiskCache::new(temp_dir.path().to_path_buf())
            .put(url, b"<html>cached</html>", None, None, None)
            .unwrap();

        let client = CachingClientBuilder::new()
            .cache_dir(Some(temp_dir.path().to_path_buf()))
            .offline_mode(true)
            .rate_limit_ms(0)
            .build()
            .unwrap();

        assert_eq!(client.fetch_html(url).await.unwrap(), "<html>cached</html>");
        assert!(matches!(
            client
                .fetch_html("https://www.chefkoch.de/rezepte/2/Kuchen.html")
                .await,
            Err(FetchError::NotCached(_))
        ));
        assert_eq!(client.cache_stats().unwrap().cached_pages, 1);
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let client = CachingClientBuilder::new()
            .cache_dir(None)
            .rate_limit_ms(0)
            .build()
            .unwrap();
        assert!(matches!(
            client.fetch_html("not a url").await,
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
