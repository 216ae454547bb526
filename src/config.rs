use std::time::Duration;

use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://moviesda15.com";
pub const DEFAULT_CATEGORY_URL: &str = "https://moviesda15.com/tamil-2025-movies/";

/// Shared, read-only settings of the HTTP session.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: Url,
    /// Pause before every request.
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url"),
            delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Bounds for category mode.
#[derive(Debug, Clone, Copy)]
pub struct ListingLimits {
    pub max_pages: usize,
    pub max_movies: usize,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self { max_pages: 1, max_movies: 5 }
    }
}

/// Split a comma-separated setting into trimmed, non-empty parts.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Distinct site origins (`scheme://host/`) of the given URLs, in first-seen order.
pub fn site_origins(urls: &[Url]) -> Vec<Url> {
    let mut origins: Vec<Url> = Vec::new();
    for url in urls {
        let origin = crate::document::origin_of(url);
        if !origins.contains(&origin) {
            origins.push(origin);
        }
    }
    origins
}
