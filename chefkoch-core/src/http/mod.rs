//! HTTP client with optional disk caching and per-host rate limiting.
//!
//! All requests to the recipe site go through this module so that
//! concurrent sensor refreshes do not hammer the same host.

mod cache;
mod client;
mod rate_limiter;

pub use cache::{CacheMetadata, CacheStats, CachedResponse, DiskCache};
pub use client::{CachingClient, CachingClientBuilder, HttpClient, MockClient, MockResponse};
pub use rate_limiter::RateLimiter;

use sha2::{Digest, Sha256};

/// Longest slug used as a cache directory name.
const MAX_SLUG_LEN: usize = 200;

/// Hex digits of the url hash appended to truncated slugs.
const SLUG_HASH_LEN: usize = 16;

/// Convert a URL to a filesystem-safe slug.
/// e.g., "https://www.chefkoch.de/rezepte/123/Suppe.html" -> "chefkoch-de_rezepte-123-Suppe-html"
pub fn slugify_url(url: &str) -> String {
    let parsed = match url::Url::parse(url) {
        Ok(p) => p,
        Err(_) => return sanitize_for_filesystem(url),
    };

    let host = parsed
        .host_str()
        .unwrap_or("unknown")
        .trim_start_matches("www.");

    let path = parsed.path().trim_matches('/');

    let combined = match (path.is_empty(), parsed.query()) {
        (true, None) => host.to_string(),
        (false, None) => format!("{}_{}", host, path),
        (true, Some(query)) => format!("{}__{}", host, query),
        (false, Some(query)) => format!("{}_{}__{}", host, path, query),
    };

    sanitize_for_filesystem(&combined)
}

fn sanitize_for_filesystem(s: &str) -> String {
    let slug: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else if c == '.' || c == '/' {
                '-'
            } else {
                '_'
            }
        })
        .collect();

    if slug.chars().count() <= MAX_SLUG_LEN {
        return slug;
    }

    // Long urls share their prefix; the hash keeps them apart.
    let head: String = slug.chars().take(MAX_SLUG_LEN - SLUG_HASH_LEN - 1).collect();
    format!("{}_{}", head, &sha256_hex(s)[..SLUG_HASH_LEN])
}

fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_www_and_keeps_path() {
        assert_eq!(
            slugify_url("https://www.chefkoch.de/rezepte/123/Suppe.html"),
            "chefkoch-de_rezepte-123-Suppe-html"
        );
    }

    #[test]
    fn slug_keeps_query_apart() {
        let plain = slugify_url("https://www.chefkoch.de/rs/s0/vegan/Rezepte.html");
        let filtered = slugify_url("https://www.chefkoch.de/rs/s0/vegan/Rezepte.html?health=Vegan");
        assert_ne!(plain, filtered);
    }

    #[test]
    fn long_slugs_differing_late_stay_apart() {
        let base = format!(
            "https://www.chefkoch.de/rs/s0/pasta/Rezepte.html?{}",
            "countries=Italien&".repeat(20)
        );
        let first = slugify_url(&format!("{}rating=3", base));
        let second = slugify_url(&format!("{}rating=4", base));

        assert_ne!(first, second);
        assert_eq!(first.chars().count(), MAX_SLUG_LEN);
        assert_eq!(first[..100], second[..100]);
    }

    #[test]
    fn slug_of_garbage_is_sanitized() {
        assert_eq!(slugify_url("not a url"), "not_a_url");
    }
}
