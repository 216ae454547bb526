//! Where movie page URLs come from: category listings, the A-Z index, and
//! guessed title URLs.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

use crate::classify::{classify, is_title_page, LinkRole, SiteDialect};
use crate::document::{origin_of, Document};
use crate::fetch::Fetch;
use crate::types::MovieRef;

/// Pages of one A-Z index letter that are searched.
pub const MAX_INDEX_PAGES: usize = 5;
/// Guessed title URLs tried per query.
pub const MAX_GUESSES: usize = 3;

static TRAILING_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\(\d{4}\)\s*$").expect("regex"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d{4})\)").expect("regex"));
static TITLE_BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(Tamil Dubbed Movie Download|Download|isaiDub|Moviesda).*").expect("regex")
});

/// Title pages of a category, `max_pages` listing pages deep.
pub async fn list_category(fetcher: &dyn Fetch, category_url: &Url, max_pages: usize) -> Vec<MovieRef> {
    let page_param = match SiteDialect::of(category_url) {
        SiteDialect::Moviesda => "page",
        SiteDialect::Isaidub => "get-page",
    };
    let mut movies: Vec<MovieRef> = Vec::new();

    for page in 1..=max_pages {
        let mut url = category_url.clone();
        if page > 1 {
            url.set_query(Some(&format!("{page_param}={page}")));
        }
        info!("scraping category page {}: {}", page, url);
        let Ok(doc) = fetcher.fetch(&url).await else { break };

        for movie in title_entries(&doc).filter(|m| is_title_page(m.url.path())) {
            if !movies.iter().any(|m| m.url == movie.url) {
                movies.push(movie);
            }
        }
    }
    debug!("{} movies listed from {}", movies.len(), category_url);
    movies
}

/// Catalog entries of a listing page, as refs. isaidub season titles
/// classify as season links and are listed too.
fn title_entries(doc: &Document) -> impl Iterator<Item = MovieRef> + '_ {
    let dialect = SiteDialect::of(&doc.url);
    doc.catalog_links
        .iter()
        .filter(|a| !a.text.is_empty())
        .filter(move |a| {
            matches!(
                classify(&a.href, &a.text, dialect),
                Some(LinkRole::CatalogEntry | LinkRole::SeasonIndirection)
            )
        })
        .filter_map(move |a| Some(MovieRef { title: a.text.clone(), url: doc.absolute(&a.href)? }))
}

fn strip_year(query: &str) -> String {
    TRAILING_YEAR.replace(query, "").trim().to_string()
}

/// First page of the A-Z index that would list `query`.
fn index_url(site: &Url, query: &str) -> Option<Url> {
    let origin = origin_of(site);
    let letter = query.chars().next().filter(|c| c.is_alphabetic());
    let path = match (SiteDialect::of(site), letter) {
        (SiteDialect::Moviesda, Some(l)) => format!("tamil-movies/{l}/"),
        (SiteDialect::Moviesda, None) => "tamil-atoz-movies/".to_string(),
        (SiteDialect::Isaidub, Some(l)) => format!("tamil-atoz-dubbed-movies/{l}"),
        (SiteDialect::Isaidub, None) => "tamil-atoz-dubbed-movies/".to_string(),
    };
    origin.join(&path).ok()
}

fn index_page_url(first: &Url, page: usize) -> Option<Url> {
    if page == 1 {
        return Some(first.clone());
    }
    match SiteDialect::of(first) {
        SiteDialect::Moviesda => {
            let mut url = first.clone();
            url.set_query(Some(&format!("page={page}")));
            Some(url)
        }
        SiteDialect::Isaidub => {
            let base = first.as_str().trim_end_matches('/');
            Url::parse(&format!("{base}/{page}")).ok()
        }
    }
}

/// Search the A-Z index of `site` for titles containing `query`.
pub async fn search_index(fetcher: &dyn Fetch, query: &str, site: &Url, max_results: usize) -> Vec<MovieRef> {
    let query = strip_year(query).to_lowercase();
    let Some(first) = index_url(site, &query) else { return Vec::new() };
    info!("searching '{}' on {}", query, first);

    let mut matches: Vec<MovieRef> = Vec::new();
    for page in 1..=MAX_INDEX_PAGES {
        if matches.len() >= max_results {
            break;
        }
        let Some(url) = index_page_url(&first, page) else { break };
        let Ok(doc) = fetcher.fetch(&url).await else { break };

        let mut found_any = false;
        for movie in title_entries(&doc) {
            found_any = true;
            if matches.len() < max_results
                && movie.title.to_lowercase().contains(&query)
                && !matches.iter().any(|m| m.url == movie.url)
            {
                info!("found: {}", movie.title);
                matches.push(movie);
            }
        }
        if !found_any {
            break;
        }
    }
    matches
}

/// Title page URLs a site would use for `query`, most likely first.
fn guessed_urls(site: &Url, query: &str) -> Vec<Url> {
    let year = YEAR.captures(query).map(|c| c[1].to_string());
    let slug = strip_year(query).to_lowercase().replace(' ', "-").replace('\'', "");
    let origin = origin_of(site);

    let mut paths = Vec::new();
    match SiteDialect::of(site) {
        SiteDialect::Moviesda => {
            if let Some(year) = &year {
                paths.push(format!("{slug}-{year}-movie/"));
                paths.push(format!("{slug}-{year}-tamil-movie/"));
            }
            paths.push(format!("{slug}-movie/"));
            paths.push(format!("{slug}-tamil-movie/"));
        }
        SiteDialect::Isaidub => {
            if let Some(year) = &year {
                paths.push(format!("movie/{slug}-{year}-tamil-dubbed-movie/"));
            }
            paths.push(format!("movie/{slug}-tamil-dubbed-movie/"));
        }
    }
    paths.iter().filter_map(|p| origin.join(p).ok()).collect()
}

/// Title from a page `<title>`, without the site and download boilerplate.
fn page_title(doc: &Document) -> Option<String> {
    let raw = doc.title.as_deref()?;
    let title = TITLE_BOILERPLATE.replace(raw, "").trim().to_string();
    (!title.is_empty()).then_some(title)
}

/// Guess title page URLs for `query` and keep the ones that exist.
pub async fn smart_search(fetcher: &dyn Fetch, query: &str, site: &Url, max_results: usize) -> Vec<MovieRef> {
    let fallback_title = query.trim().to_string();
    let mut matches = Vec::new();

    for url in guessed_urls(site, query).into_iter().take(MAX_GUESSES) {
        if matches.len() >= max_results {
            break;
        }
        debug!("trying url: {}", url);
        let Ok(doc) = fetcher.fetch(&url).await else { continue };
        let title = page_title(&doc).unwrap_or_else(|| fallback_title.clone());
        info!("found via url guess: {}", title);
        matches.push(MovieRef { title, url });
    }
    matches
}

/// First title matching `query` on any of `sites`: index search, then URL guessing.
pub async fn find_title(fetcher: &dyn Fetch, query: &str, sites: &[Url]) -> Option<MovieRef> {
    for site in sites {
        if let Some(found) = search_index(fetcher, query, site, 1).await.into_iter().next() {
            return Some(found);
        }
        info!("index search failed on {}, guessing urls", site);
        if let Some(found) = smart_search(fetcher, query, site, 1).await.into_iter().next() {
            return Some(found);
        }
    }
    None
}
