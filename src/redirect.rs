//! Server pages -> final media URL.
//!
//! moviesda: downloadpage -> moviespage -> biggshare/hotshare
//! isaidub:  dubmv -> dubshare

use tracing::{debug, info};
use url::Url;

use crate::classify::{classify, LinkRole, SiteDialect};
use crate::document::{Anchor, Document};
use crate::error::Unresolved;
use crate::fetch::Fetch;
use crate::types::ServerLink;

/// Fetches one `resolve_final_media` call may make, level-1 page included.
pub const MAX_HOPS: usize = 3;

pub const CDN_HOST_FRAGMENTS: [&str; 6] = ["biggshare", "hotshare", "dubshare", "dubmv", "uptodub", "uptomkv"];
const MEDIA_EXTENSIONS: [&str; 5] = [".mp4", ".mkv", ".avi", ".webm", ".m4v"];

/// A link that needs no further following.
pub fn is_terminal(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    if MEDIA_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        CDN_HOST_FRAGMENTS.iter().any(|f| host.contains(f))
    })
}

/// Follow a level-1 server URL to the media file. `None` is a normal outcome.
pub async fn resolve_final_media(fetcher: &dyn Fetch, level1: &Url) -> Option<Url> {
    match walk(fetcher, level1).await {
        Ok(media) => {
            info!("found media url: {}", media);
            Some(media)
        }
        Err(e) => {
            debug!("no media url from {}: {}", level1, e);
            None
        }
    }
}

/// The chain walk itself, keeping the reason a chain failed.
pub async fn walk(fetcher: &dyn Fetch, level1: &Url) -> Result<Url, Unresolved> {
    let mut current = level1.clone();
    for hop in 1..=MAX_HOPS {
        debug!(hop, url = %current, "following server link");
        let doc = fetcher.fetch(&current).await?;
        if let Some(media) = first_terminal(&doc, download_style_anchors(&doc)) {
            return Ok(media);
        }
        let next = redirect_link(&doc);
        // Other anchors only count once the server links lead nowhere.
        if next.is_none() || hop == MAX_HOPS {
            if let Some(media) = first_terminal(&doc, doc.anchors.iter()) {
                return Ok(media);
            }
        }
        match next {
            Some(next) => current = next,
            None => return Err(Unresolved::NoLinks(current)),
        }
    }
    Err(Unresolved::DepthExceeded(current))
}

/// Server containers first, then download-page anchors, in document order.
fn download_style_anchors(doc: &Document) -> impl Iterator<Item = &Anchor> {
    let dialect = SiteDialect::of(&doc.url);
    doc.server_links.iter().chain(
        doc.anchors
            .iter()
            .filter(move |a| classify(&a.href, &a.text, dialect) == Some(LinkRole::EpisodeOrFileDownload)),
    )
}

fn first_terminal<'a>(doc: &Document, anchors: impl Iterator<Item = &'a Anchor>) -> Option<Url> {
    anchors.filter_map(|a| doc.absolute(&a.href)).find(is_terminal)
}

fn redirect_link(doc: &Document) -> Option<Url> {
    download_style_anchors(doc)
        .filter_map(|a| doc.absolute(&a.href))
        .find(|u| *u != doc.url && u.as_str().to_ascii_lowercase().contains("download"))
}

/// Fetch an intermediate download page and resolve its servers.
pub async fn collect_servers(fetcher: &dyn Fetch, intermediate_url: &Url) -> Vec<ServerLink> {
    info!("getting server links: {}", intermediate_url);
    match fetcher.fetch(intermediate_url).await {
        Ok(doc) => servers_on_page(fetcher, &doc).await,
        Err(_) => Vec::new(),
    }
}

/// Resolve the level-1 server links on an already fetched page. Stops after
/// the first server that reaches a media URL; mirrors carry the same file.
pub async fn servers_on_page(fetcher: &dyn Fetch, doc: &Document) -> Vec<ServerLink> {
    let mut candidates: Vec<(String, Url)> = doc
        .server_links
        .iter()
        .filter_map(|a| Some((a.text.clone(), doc.absolute(&a.href)?)))
        .collect();

    if candidates.is_empty() {
        let own_host = doc.url.host_str();
        candidates = doc
            .anchors
            .iter()
            .filter(|a| {
                let text = a.text.to_lowercase();
                text.contains("download") || text.contains("server")
            })
            .filter_map(|a| Some((a.text.clone(), doc.absolute(&a.href)?)))
            .filter(|(_, url)| url.host_str() != own_host)
            .collect();
    }

    let mut servers = Vec::new();
    for (server_name, level1_url) in candidates {
        let media_url = resolve_final_media(fetcher, &level1_url).await;
        let resolved = media_url.is_some();
        servers.push(ServerLink { server_name, level1_url, media_url });
        if resolved {
            break;
        }
    }
    servers
}
