//! Link roles and the two site dialects.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// URL/markup convention of a site, derived from the URL itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteDialect {
    /// moviesda: slug URLs with resolution tokens, `div.dlink` download pages.
    Moviesda,
    /// isaidub: numeric `/movie/{id}/` pages told apart only by anchor text.
    Isaidub,
}

impl SiteDialect {
    pub fn detect(url: &str) -> Self {
        if url.to_ascii_lowercase().contains("isaidub") {
            Self::Isaidub
        } else {
            Self::Moviesda
        }
    }

    pub fn of(url: &Url) -> Self {
        Self::detect(url.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    CatalogEntry,
    OriginalIndirection,
    SeasonIndirection,
    QualityDirect,
    NumericQualityDirect,
    EpisodeOrFileDownload,
}

pub const RESOLUTIONS: [&str; 4] = ["1080p", "720p", "480p", "360p"];

/// Path markers of a title page proper. Category and index pages never carry them.
pub const TITLE_MARKERS: [&str; 4] = [
    "-tamil-movie",
    "-tamil-web-series",
    "-tamil-dubbed-movie",
    "-tamil-dubbed-web-series",
];

static NUMERIC_PAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/movie/\d+/?$").expect("regex"));
static RESOLUTION_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(1080p|720p|480p|360p)").expect("regex"));
static DIMENSION_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+x\d+").expect("regex"));

/// Tag an anchor with its role. `None` means "not interesting here", never an error.
pub fn classify(href: &str, text: &str, dialect: SiteDialect) -> Option<LinkRole> {
    let href_path = href.split(['?', '#']).next().unwrap_or(href);
    let numeric = dialect == SiteDialect::Isaidub && NUMERIC_PAGE.is_match(href_path);
    let text_lower = text.to_lowercase();

    if href.contains("-original-movie") || href.contains("-movie-original") {
        return Some(LinkRole::OriginalIndirection);
    }
    if numeric && text_lower.contains("original") {
        return Some(LinkRole::OriginalIndirection);
    }
    if href.contains("-season-") && href.contains("-dubbed-movie") {
        return Some(LinkRole::SeasonIndirection);
    }
    if href.contains("/download/") {
        return Some(LinkRole::EpisodeOrFileDownload);
    }
    if RESOLUTIONS.iter().any(|r| href.contains(&format!("-{}-", r))) {
        return Some(LinkRole::QualityDirect);
    }
    if numeric && (RESOLUTION_TEXT.is_match(text) || DIMENSION_TEXT.is_match(text)) {
        return Some(LinkRole::NumericQualityDirect);
    }
    if !text.is_empty() && (is_title_page(href) || href.contains("-movie")) {
        return Some(LinkRole::CatalogEntry);
    }
    None
}

pub fn is_title_page(href: &str) -> bool {
    TITLE_MARKERS.iter().any(|m| href.contains(m))
}

/// First resolution token (`1080p`...) in `s`, as written.
pub fn resolution_token(s: &str) -> Option<&str> {
    RESOLUTION_TEXT.find(s).map(|m| m.as_str())
}
