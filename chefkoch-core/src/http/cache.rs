//! Disk-based page cache with ETag support.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use super::slugify_url;

const BODY_FILE: &str = "body.html";
const METADATA_FILE: &str = "metadata.json";

/// Disk-based HTTP response cache.
///
/// Only successful responses are stored. Failures are retried on the next
/// refresh cycle instead of being remembered.
pub struct DiskCache {
    cache_dir: PathBuf,
}

/// Metadata stored alongside cached responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub url: String,
    pub content_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// A cached successful response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub data: Vec<u8>,
    pub metadata: CacheMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub cached_pages: usize,
}

impl DiskCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Get the default cache directory: ~/.chefkoch/http-cache
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".chefkoch").join("http-cache"))
            .unwrap_or_else(|| PathBuf::from("data/http-cache"))
    }

    fn url_dir(&self, url: &str) -> PathBuf {
        self.cache_dir.join(slugify_url(url))
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.url_dir(url).join(BODY_FILE).exists()
    }

    /// Get cached response if it exists.
    pub fn get(&self, url: &str) -> Option<CachedResponse> {
        let dir = self.url_dir(url);
        let data = fs::read(dir.join(BODY_FILE)).ok()?;
        let metadata_str = fs::read_to_string(dir.join(METADATA_FILE)).ok()?;
        let metadata: CacheMetadata = serde_json::from_str(&metadata_str).ok()?;
        Some(CachedResponse { data, metadata })
    }

    /// Save a successful response to the cache.
    pub fn put(
        &self,
        url: &str,
        data: &[u8],
        content_type: Option<String>,
        etag: Option<String>,
        last_modified: Option<String>,
    ) -> std::io::Result<()> {
        let dir = self.url_dir(url);
        fs::create_dir_all(&dir)?;

        let metadata = CacheMetadata {
            url: url.to_string(),
            content_type,
            fetched_at: Utc::now(),
            etag,
            last_modified,
        };
        let metadata_json = serde_json::to_string_pretty(&metadata)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(dir.join(BODY_FILE), data)?;
        fs::write(dir.join(METADATA_FILE), metadata_json)?;

        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();

        if let Ok(entries) = fs::read_dir(&self.cache_dir) {
            stats.cached_pages = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().join(BODY_FILE).exists())
                .count();
        }

        stats
    }

    /// Clear all cached responses.
    pub fn clear(&self) -> std::io::Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }
}
