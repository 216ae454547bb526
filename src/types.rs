use serde::{Deserialize, Serialize};
use url::Url;

/// A title page discovered by listing or search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRef {
    pub title: String,
    pub url: Url,
}

/// One selectable quality (or episode) on a movie page.
///
/// `direct` marks options whose page already lists download entries, so the
/// aggregator skips the quality -> file listing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityOption {
    pub label: String,
    pub url: Url,
    pub direct: bool,
    pub file_size: Option<String>,
}

impl QualityOption {
    pub fn new(label: impl Into<String>, url: Url, direct: bool) -> Self {
        Self { label: label.into(), url, direct, file_size: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSet {
    pub poster_url: Option<Url>,
    pub screenshots: Vec<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLink {
    pub server_name: String,
    pub level1_url: Url,
    #[serde(rename = "mp4_url")]
    pub media_url: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadEntry {
    pub filename: String,
    pub intermediate_url: Url,
    pub file_size: Option<String>,
    #[serde(rename = "direct_links")]
    pub servers: Vec<ServerLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityResult {
    #[serde(rename = "quality")]
    pub label: String,
    pub downloads: Vec<DownloadEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieResult {
    #[serde(rename = "movie_url")]
    pub url: Url,
    pub title: String,
    pub poster_url: Option<Url>,
    pub screenshots: Vec<Url>,
    pub qualities: Vec<QualityResult>,
}

impl MovieResult {
    /// Every server link in report order, across qualities and files.
    pub fn server_links(&self) -> impl Iterator<Item = &ServerLink> {
        self.qualities
            .iter()
            .flat_map(|q| q.downloads.iter())
            .flat_map(|d| d.servers.iter())
    }

    pub fn media_urls(&self) -> impl Iterator<Item = &Url> {
        self.server_links().filter_map(|s| s.media_url.as_ref())
    }
}
