use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;
use url::Url;

use crate::classify::{classify, LinkRole, SiteDialect};
use crate::document::Document;
use crate::fetch::Fetch;
use crate::redirect::{collect_servers, servers_on_page};
use crate::resolve::{fold_download_items, resolve_qualities, HasFileSize};
use crate::types::{DownloadEntry, MovieRef, MovieResult, QualityOption, QualityResult};

static TITLE_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"/([^/]+)-\d{4}-tamil").expect("regex"));

impl HasFileSize for DownloadEntry {
    fn set_file_size(&mut self, size: String) {
        self.file_size = Some(size);
    }
}

/// Resolve one movie down to its media URLs. Never fails: pages that cannot
/// be fetched just leave their part of the tree empty.
pub async fn build_movie_result(fetcher: &dyn Fetch, movie: &MovieRef) -> MovieResult {
    let (qualities, images) = resolve_qualities(fetcher, &movie.url).await;

    let mut results = Vec::with_capacity(qualities.len());
    for quality in &qualities {
        let downloads = if quality.direct {
            direct_downloads(fetcher, quality).await
        } else {
            listed_downloads(fetcher, &quality.url).await
        };
        results.push(QualityResult { label: quality.label.clone(), downloads });
    }

    MovieResult {
        url: movie.url.clone(),
        title: movie.title.clone(),
        poster_url: images.poster_url,
        screenshots: images.screenshots,
        qualities: results,
    }
}

/// A page that is either one download (server links right on it) or a list
/// of per-file download pages.
async fn direct_downloads(fetcher: &dyn Fetch, quality: &QualityOption) -> Vec<DownloadEntry> {
    info!("getting downloads from: {}", quality.url);
    let Ok(doc) = fetcher.fetch(&quality.url).await else { return Vec::new() };

    if !doc.server_links.is_empty() {
        let servers = servers_on_page(fetcher, &doc).await;
        return vec![DownloadEntry {
            filename: quality.label.clone(),
            intermediate_url: quality.url.clone(),
            file_size: quality.file_size.clone(),
            servers,
        }];
    }

    let entries = fold_download_items(&doc, |_| true, new_entry);
    with_servers(fetcher, entries).await
}

/// Standard quality page: `li a.coral` file links, each with its own
/// download page.
async fn listed_downloads(fetcher: &dyn Fetch, quality_url: &Url) -> Vec<DownloadEntry> {
    info!("getting download links: {}", quality_url);
    let Ok(doc) = fetcher.fetch(quality_url).await else { return Vec::new() };

    let mut entries = fold_download_items(&doc, |a| a.has_class("coral"), new_entry);
    if entries.is_empty() {
        entries = loose_file_links(&doc);
    }
    with_servers(fetcher, entries).await
}

/// Every download-page anchor on a page that does not mark its file links.
fn loose_file_links(doc: &Document) -> Vec<DownloadEntry> {
    let dialect = SiteDialect::of(&doc.url);
    let mut entries: Vec<DownloadEntry> = Vec::new();
    for a in &doc.anchors {
        if classify(&a.href, &a.text, dialect) != Some(LinkRole::EpisodeOrFileDownload) {
            continue;
        }
        let Some(url) = doc.absolute(&a.href) else { continue };
        if entries.iter().all(|e| e.intermediate_url != url) {
            entries.push(new_entry(a.text.clone(), url));
        }
    }
    entries
}

fn new_entry(filename: String, intermediate_url: Url) -> DownloadEntry {
    DownloadEntry { filename, intermediate_url, file_size: None, servers: Vec::new() }
}

async fn with_servers(fetcher: &dyn Fetch, mut entries: Vec<DownloadEntry>) -> Vec<DownloadEntry> {
    for entry in &mut entries {
        entry.servers = collect_servers(fetcher, &entry.intermediate_url).await;
    }
    entries
}

/// "Leo" from `.../leo-2023-tamil-movie/`, word-capitalised.
pub fn title_from_url(url: &Url) -> Option<String> {
    let caps = TITLE_SLUG.captures(url.as_str())?;
    let title = caps[1]
        .split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ");
    Some(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{url, FakeSite};

    fn movie(u: &str) -> MovieRef {
        MovieRef { title: "Leo".into(), url: url(u) }
    }

    #[tokio::test]
    async fn direct_page_with_servers_is_one_entry() {
        let site = FakeSite::new()
            .page(
                "https://isaidub.love/movie/leo-2023-tamil-dubbed-movie/",
                r#"<div class="f"><a href="/movie/501/">Leo (640x360)</a></div>"#,
            )
            .page(
                "https://isaidub.love/movie/501/",
                r#"<div class="dlink"><a href="https://dubmv.top/f/501">Download Server 1</a></div>
                   <div class="dlink"><a href="https://dubmv.top/f/502">Download Server 2</a></div>"#,
            )
            .page("https://dubmv.top/f/501", r#"<a href="https://dubshare.one/d/Leo%20640x360.mp4">Go</a>"#);
        let result = build_movie_result(&site, &movie("https://isaidub.love/movie/leo-2023-tamil-dubbed-movie/")).await;
        assert_eq!(result.qualities.len(), 1);
        let downloads = &result.qualities[0].downloads;
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].filename, "Leo (640x360)");
        assert_eq!(downloads[0].intermediate_url.as_str(), "https://isaidub.love/movie/501/");
        assert_eq!(downloads[0].servers.len(), 1);
        assert!(downloads[0].servers[0].media_url.is_some());
    }

    #[tokio::test]
    async fn direct_list_page_is_one_entry_per_item() {
        let site = FakeSite::new()
            .page(
                "https://isaidub.love/movie/leo-2023-tamil-dubbed-movie/",
                r#"<div class="f"><a href="/movie/601/">Leo (1280x720)</a></div>"#,
            )
            .page(
                "https://isaidub.love/movie/601/",
                r#"<ul><li><a href="/download/page/1/">Leo Part 1 HD.mp4</a></li><li>File Size: 1.1 GB</li>
                   <li><a href="/download/page/2/">Leo Part 2 HD.mp4</a></li><li>File Size: 900 MB</li>
                   <li><a href="/movie/leo-2023-tamil-dubbed-movie/">Back</a></li></ul>"#,
            )
            .page(
                "https://isaidub.love/download/page/1/",
                r#"<div class="dlink"><a href="https://dubmv.top/f/1">Server</a></div>"#,
            )
            .page("https://dubmv.top/f/1", r#"<a href="https://dubshare.one/d/part1.mp4">Go</a>"#);
        let result = build_movie_result(&site, &movie("https://isaidub.love/movie/leo-2023-tamil-dubbed-movie/")).await;
        let downloads = &result.qualities[0].downloads;
        assert_eq!(downloads.len(), 2);
        assert_eq!(downloads[0].file_size.as_deref(), Some("1.1 GB"));
        assert_eq!(downloads[1].file_size.as_deref(), Some("900 MB"));
        assert_eq!(
            downloads[0].servers[0].media_url.as_ref().unwrap().as_str(),
            "https://dubshare.one/d/part1.mp4"
        );
        assert!(downloads[1].servers.is_empty());
    }

    #[tokio::test]
    async fn standard_quality_page_lists_coral_files() {
        let site = FakeSite::new()
            .page(
                "https://moviesda15.com/leo-2023-tamil-movie/",
                r#"<div class="f"><a href="/leo-2023-720p-hd-movie/">Leo 720p HD</a></div>"#,
            )
            .page(
                "https://moviesda15.com/leo-2023-720p-hd-movie/",
                r#"<ul><li><a class="coral" href="/download/leo-2023-720p-hd/">Leo 2023 720p HD.mp4</a></li>
                   <li>File Size: 1.3 GB</li>
                   <li><a href="/download/other-movie/">Other</a></li></ul>"#,
            )
            .page(
                "https://moviesda15.com/download/leo-2023-720p-hd/",
                r#"<div class="dlink"><a href="https://downloadpage.site/leo">Download Server 1</a></div>"#,
            )
            .page(
                "https://downloadpage.site/leo",
                r#"<div class="dlink"><a href="https://biggshare.xyz/leo-720p">Download</a></div>"#,
            );
        let result = build_movie_result(&site, &movie("https://moviesda15.com/leo-2023-tamil-movie/")).await;
        assert_eq!(result.qualities[0].label, "Leo 720p HD");
        let downloads = &result.qualities[0].downloads;
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].file_size.as_deref(), Some("1.3 GB"));
        assert_eq!(downloads[0].servers[0].level1_url.as_str(), "https://downloadpage.site/leo");
        assert_eq!(
            downloads[0].servers[0].media_url.as_ref().unwrap().as_str(),
            "https://biggshare.xyz/leo-720p"
        );
    }

    #[tokio::test]
    async fn coral_link_found_after_other_anchors_in_item() {
        let site = FakeSite::new()
            .page(
                "https://moviesda15.com/leo-2023-tamil-movie/",
                r#"<div class="f"><a href="/leo-2023-1080p-hd-movie/">Leo 1080p</a></div>"#,
            )
            .page(
                "https://moviesda15.com/leo-2023-1080p-hd-movie/",
                r#"<ul><li><a href="/leo-2023-tamil-movie/">Leo</a> &raquo;
                   <a class="coral" href="/download/leo-2023-1080p-hd/">Leo 2023 1080p HD.mp4</a></li>
                   <li>File Size: 2.4 GB</li></ul>"#,
            );
        let result = build_movie_result(&site, &movie("https://moviesda15.com/leo-2023-tamil-movie/")).await;
        let downloads = &result.qualities[0].downloads;
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].filename, "Leo 2023 1080p HD.mp4");
        assert_eq!(downloads[0].intermediate_url.as_str(), "https://moviesda15.com/download/leo-2023-1080p-hd/");
        assert_eq!(downloads[0].file_size.as_deref(), Some("2.4 GB"));
    }

    #[tokio::test]
    async fn unmarked_quality_page_uses_every_download_anchor() {
        let site = FakeSite::new()
            .page(
                "https://moviesda15.com/leo-2023-tamil-movie/",
                r#"<div class="f"><a href="/leo-2023-480p-hd-movie/">Leo 480p</a></div>"#,
            )
            .page(
                "https://moviesda15.com/leo-2023-480p-hd-movie/",
                r#"<p><a href="/download/leo-480p-part-1/">Part 1</a> <a href="/download/leo-480p-part-2/">Part 2</a>
                   <a href="/download/leo-480p-part-1/">Part 1 again</a> <a href="/tamil-2023-movies/">More</a></p>"#,
            );
        let result = build_movie_result(&site, &movie("https://moviesda15.com/leo-2023-tamil-movie/")).await;
        let names: Vec<_> = result.qualities[0].downloads.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, ["Part 1", "Part 2"]);
    }

    #[tokio::test]
    async fn unreachable_quality_page_keeps_empty_quality() {
        let site = FakeSite::new().page(
            "https://moviesda15.com/leo-2023-tamil-movie/",
            r#"<div class="f"><a href="/leo-2023-1080p-hd-movie/">Leo 1080p</a></div>
               <div class="f"><a href="/leo-2023-360p-hd-movie/">Leo 360p</a></div>"#,
        );
        let result = build_movie_result(&site, &movie("https://moviesda15.com/leo-2023-tamil-movie/")).await;
        assert_eq!(result.qualities.len(), 2);
        assert!(result.qualities.iter().all(|q| q.downloads.is_empty()));
    }

    #[tokio::test]
    async fn movie_without_roles_has_no_qualities() {
        let site = FakeSite::new().page("https://moviesda15.com/leo-2023-tamil-movie/", "<p>nothing here</p>");
        let result = build_movie_result(&site, &movie("https://moviesda15.com/leo-2023-tamil-movie/")).await;
        assert_eq!(result.title, "Leo");
        assert!(result.qualities.is_empty());
        assert!(result.poster_url.is_none());
    }

    #[test]
    fn title_from_slug() {
        assert_eq!(
            title_from_url(&url("https://moviesda15.com/the-greatest-of-all-time-2024-tamil-movie/")).as_deref(),
            Some("The Greatest Of All Time")
        );
        assert_eq!(title_from_url(&url("https://isaidub.love/movie/9031/")), None);
    }
}
