//! Movie page -> quality options.
//!
//! A movie page reaches its real quality list through one of four shapes:
//! an "Original" page, a season page, quality links on the page itself, or
//! (moviesda series) episode download pages that have to be probed by URL.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::classify::{classify, LinkRole, SiteDialect};
use crate::document::{origin_of, Anchor, Document, ListItem};
use crate::fetch::Fetch;
use crate::types::{ImageSet, QualityOption};

pub const MAX_PROBED_EPISODES: u32 = 20;

const POSTER_SEGMENT: &str = "/uploads/posters/";
const SCREENSHOT_SEGMENT: &str = "/uploads/screen_shots/";

static FILE_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)File Size[:\s]*(\d+\.?\d*\s*[GMKT]B)").expect("regex"));
static SERIES_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/([^/]+?)-season-(\d+)(?:-\d{4})?(?:-[^/]+)?-tamil-movie/?$").expect("regex")
});
static SERIES_URL_LOOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/([^/]+)-season-(\d+)").expect("regex"));

/// Fetch a movie page and work out its quality options and images.
/// A page that cannot be fetched yields nothing.
pub async fn resolve_qualities(fetcher: &dyn Fetch, movie_url: &Url) -> (Vec<QualityOption>, ImageSet) {
    info!("getting quality options: {}", movie_url);
    let doc = match fetcher.fetch(movie_url).await {
        Ok(doc) => doc,
        Err(_) => return (Vec::new(), ImageSet::default()),
    };
    let images = extract_images(&doc);
    let qualities = qualities_from_movie_page(fetcher, &doc).await;
    debug!("{} quality options on {}", qualities.len(), movie_url);
    (qualities, images)
}

async fn qualities_from_movie_page(fetcher: &dyn Fetch, doc: &Document) -> Vec<QualityOption> {
    let dialect = SiteDialect::of(&doc.url);
    let mut qualities = Vec::new();
    let mut saw_season = false;

    for anchor in &doc.catalog_links {
        let Some(role) = classify(&anchor.href, &anchor.text, dialect) else { continue };
        let Some(url) = doc.absolute(&anchor.href) else { continue };
        match role {
            LinkRole::OriginalIndirection => {
                info!("following original link: {}", url);
                return extract_qualities_from_original_page(fetcher, &url).await;
            }
            LinkRole::SeasonIndirection => {
                saw_season = true;
                info!("following season link: {}", url);
                let episodes = extract_episodes_from_season_page(fetcher, &url).await;
                if !episodes.is_empty() {
                    return episodes;
                }
            }
            LinkRole::QualityDirect => qualities.push(QualityOption::new(&anchor.text, url, false)),
            LinkRole::NumericQualityDirect => qualities.push(QualityOption::new(&anchor.text, url, true)),
            LinkRole::CatalogEntry | LinkRole::EpisodeOrFileDownload => {}
        }
    }

    let series_page = doc.url.as_str().to_lowercase().contains("season");
    if qualities.is_empty() && !saw_season && dialect == SiteDialect::Moviesda && series_page {
        info!("no qualities on {}, probing episode pages", doc.url);
        qualities = probe_episodes(fetcher, &doc.url).await;
    }
    qualities
}

/// Quality links on an "Original" page, in document order.
pub async fn extract_qualities_from_original_page(fetcher: &dyn Fetch, url: &Url) -> Vec<QualityOption> {
    let Ok(doc) = fetcher.fetch(url).await else { return Vec::new() };
    let dialect = SiteDialect::of(&doc.url);
    doc.catalog_links
        .iter()
        .filter(|a| {
            matches!(
                classify(&a.href, &a.text, dialect),
                Some(LinkRole::QualityDirect | LinkRole::NumericQualityDirect)
            )
        })
        .filter_map(|a| Some(QualityOption::new(&a.text, doc.absolute(&a.href)?, false)))
        .collect()
}

/// Episodes listed on a season page, oldest first.
///
/// The page lists episodes newest first, and a `File Size:` line is a sibling
/// item following the episode it describes.
pub async fn extract_episodes_from_season_page(fetcher: &dyn Fetch, url: &Url) -> Vec<QualityOption> {
    let Ok(doc) = fetcher.fetch(url).await else { return Vec::new() };
    let mut episodes = fold_download_items(&doc, |_| true, |label, url| QualityOption::new(label, url, true));
    episodes.reverse();
    episodes
}

/// Something a list-item scan can attach a `File Size:` line to.
pub(crate) trait HasFileSize {
    fn set_file_size(&mut self, size: String);
}

impl HasFileSize for QualityOption {
    fn set_file_size(&mut self, size: String) {
        self.file_size = Some(size);
    }
}

/// Walk list items in order: an item holding an accepted download-page
/// anchor opens a new entry, a `File Size:` text attaches to the latest entry.
pub(crate) fn fold_download_items<T, A, F>(doc: &Document, accept: A, mut make: F) -> Vec<T>
where
    T: HasFileSize,
    A: Fn(&Anchor) -> bool,
    F: FnMut(String, Url) -> T,
{
    let dialect = SiteDialect::of(&doc.url);
    doc.list_items.iter().fold(Vec::new(), |mut acc, li: &ListItem| {
        let download = li.anchors.iter().find(|a| {
            classify(&a.href, &a.text, dialect) == Some(LinkRole::EpisodeOrFileDownload) && accept(*a)
        });
        if let Some(a) = download {
            if let Some(url) = doc.absolute(&a.href) {
                let label = if a.text.is_empty() { "Episode".to_string() } else { a.text.clone() };
                acc.push(make(label, url));
            }
        }
        if let (Some(size), Some(last)) = (file_size(&li.text), acc.last_mut()) {
            last.set_file_size(size);
        }
        acc
    })
}

pub fn file_size(text: &str) -> Option<String> {
    FILE_SIZE.captures(text).map(|c| c[1].to_string())
}

/// Series slug and season number from a series page URL.
pub fn series_tokens(url: &str) -> Option<(String, String)> {
    let caps = SERIES_URL.captures(url).or_else(|| SERIES_URL_LOOSE.captures(url))?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Try `/download/{slug}-season-{n}-epi-{NN}/` for episodes 1..=20 until one
/// is missing or has no download servers.
pub async fn probe_episodes(fetcher: &dyn Fetch, series_url: &Url) -> Vec<QualityOption> {
    let Some((slug, season)) = series_tokens(series_url.as_str()) else {
        warn!("could not parse series url: {}", series_url);
        return Vec::new();
    };
    info!("scanning episodes for {} season {}", slug, season);
    let origin = origin_of(series_url);
    let mut episodes = Vec::new();

    for n in 1..=MAX_PROBED_EPISODES {
        let Ok(url) = origin.join(&format!("download/{slug}-season-{season}-epi-{n:02}/")) else { break };
        let doc = match fetcher.fetch(&url).await {
            Ok(doc) => doc,
            Err(e) if e.is_not_found() => {
                debug!("episode {} not found, series ends at {}", n, n - 1);
                break;
            }
            Err(e) => {
                warn!("episode probing for {} truncated at episode {}: {}", slug, n, e);
                break;
            }
        };
        if doc.server_links.is_empty() {
            debug!("episode {} has no download links, series ends at {}", n, n - 1);
            break;
        }
        let label = doc
            .title
            .as_deref()
            .and_then(|t| t.split(" - ").next())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Episode {n}"));
        debug!("found episode: {}", label);
        episodes.push(QualityOption::new(label, url, true));
    }
    episodes
}

/// Poster and screenshots of a movie page.
pub fn extract_images(doc: &Document) -> ImageSet {
    let mut images = ImageSet::default();
    for img in &doc.images {
        let Some(src) = doc.absolute(&img.src) else { continue };
        let alt = img.alt.to_lowercase();
        if src.as_str().contains(POSTER_SEGMENT) || alt.contains("poster") {
            if images.poster_url.is_none() {
                images.poster_url = Some(src);
            }
        } else if src.as_str().contains(SCREENSHOT_SEGMENT) || alt.contains("screenshot") {
            images.screenshots.push(src);
        }
    }
    if images.poster_url.is_none() {
        images.poster_url = doc.pictures.iter().find_map(|p| {
            p.source
                .iter()
                .chain(p.img_src.iter())
                .filter(|s| s.contains(POSTER_SEGMENT))
                .find_map(|s| doc.absolute(s))
        });
    }
    images
}
