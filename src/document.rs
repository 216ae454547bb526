//! Owned, parsed view of a fetched page.
//!
//! `scraper::Html` is not `Send`, so pages are reduced to plain data right
//! after parsing. Only the structures the resolver looks at are kept: catalog
//! anchors (`div.f`), server anchors (`div.dlink`), list items, images.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static CATALOG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.f").expect("selector"));
static SERVER_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.dlink").expect("selector"));
static ANCHOR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("selector"));
static LI_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("li").expect("selector"));
static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("selector"));
static PICTURE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("picture").expect("selector"));
static SOURCE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("source").expect("selector"));
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("selector"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Raw `href` as written in the page; may be relative.
    pub href: String,
    pub text: String,
    pub classes: Vec<String>,
}

impl Anchor {
    fn from_element(el: ElementRef<'_>) -> Option<Self> {
        let href = el.value().attr("href")?.trim().to_string();
        Some(Self {
            href,
            text: stripped_text(el),
            classes: el.value().classes().map(str::to_string).collect(),
        })
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Every anchor with an `href` inside the item, in document order.
    pub anchors: Vec<Anchor>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTag {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureTag {
    /// First candidate of the first `<source srcset>`.
    pub source: Option<String>,
    pub img_src: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub url: Url,
    pub title: Option<String>,
    pub catalog_links: Vec<Anchor>,
    pub server_links: Vec<Anchor>,
    pub anchors: Vec<Anchor>,
    pub list_items: Vec<ListItem>,
    pub images: Vec<ImageTag>,
    pub pictures: Vec<PictureTag>,
}

impl Document {
    pub fn parse(url: Url, body: &str) -> Self {
        let html = Html::parse_document(body);

        let first_anchor = |el: ElementRef<'_>| el.select(&ANCHOR_SEL).next().and_then(Anchor::from_element);

        let catalog_links = html.select(&CATALOG_SEL).filter_map(first_anchor).collect();
        let server_links = html.select(&SERVER_SEL).filter_map(first_anchor).collect();
        let anchors = html.select(&ANCHOR_SEL).filter_map(Anchor::from_element).collect();
        let list_items = html
            .select(&LI_SEL)
            .map(|li| ListItem {
                anchors: li.select(&ANCHOR_SEL).filter_map(Anchor::from_element).collect(),
                text: stripped_text(li),
            })
            .collect();

        let images = html
            .select(&IMG_SEL)
            .filter_map(|img| {
                let src = img.value().attr("src")?.trim();
                if src.is_empty() {
                    return None;
                }
                Some(ImageTag {
                    src: src.to_string(),
                    alt: img.value().attr("alt").unwrap_or_default().to_string(),
                })
            })
            .collect();

        let pictures = html
            .select(&PICTURE_SEL)
            .map(|pic| PictureTag {
                source: pic
                    .select(&SOURCE_SEL)
                    .next()
                    .and_then(|s| s.value().attr("srcset"))
                    .and_then(|set| set.split_whitespace().next())
                    .map(str::to_string),
                img_src: pic
                    .select(&IMG_SEL)
                    .next()
                    .and_then(|i| i.value().attr("src"))
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            })
            .collect();

        let title = html
            .select(&TITLE_SEL)
            .next()
            .map(stripped_text)
            .filter(|t| !t.is_empty());

        Self { url, title, catalog_links, server_links, anchors, list_items, images, pictures }
    }

    /// Resolve an href found on this page against the page's origin.
    pub fn absolute(&self, href: &str) -> Option<Url> {
        absolutize(&self.url, href)
    }
}

/// Scheme and host of `url`, with an empty path.
pub fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

/// Turn an href into an absolute URL against the origin of `base`.
/// Non-web schemes (`javascript:`, `mailto:`) and empty hrefs yield `None`.
pub fn absolutize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let url = origin_of(base).join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Text content with every text node trimmed and concatenated.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Document {
        Document::parse(Url::parse("https://moviesda15.com/leo-2023-tamil-movie/").unwrap(), body)
    }

    #[test]
    fn relative_hrefs_resolve_against_origin() {
        let base = Url::parse("https://isaidub.love/movie/some/deep/page/").unwrap();
        assert_eq!(
            absolutize(&base, "download/page/12/").unwrap().as_str(),
            "https://isaidub.love/download/page/12/"
        );
        assert_eq!(
            absolutize(&base, "/movie/42/").unwrap().as_str(),
            "https://isaidub.love/movie/42/"
        );
        assert_eq!(
            absolutize(&base, "https://cdn.example/a.mp4").unwrap().as_str(),
            "https://cdn.example/a.mp4"
        );
        assert!(absolutize(&base, "javascript:void(0)").is_none());
        assert!(absolutize(&base, "").is_none());
    }

    #[test]
    fn collects_catalog_and_server_containers() {
        let doc = page(
            r#"<html><head><title> Leo (2023) Tamil Movie </title></head><body>
            <div class="f"><a href="/leo-2023-original-movie/">Leo Original</a><a href="/other/">x</a></div>
            <div class="f">no link</div>
            <div class="dlink"><a href="https://download.moviespage.site/x">Server 1</a></div>
            <ul><li><a class="coral" href="/download/leo-hd/"><b>Leo</b> HD</a></li><li>File Size: 1.2 GB</li></ul>
            </body></html>"#,
        );
        assert_eq!(doc.title.as_deref(), Some("Leo (2023) Tamil Movie"));
        assert_eq!(doc.catalog_links.len(), 1);
        assert_eq!(doc.catalog_links[0].href, "/leo-2023-original-movie/");
        assert_eq!(doc.server_links[0].text, "Server 1");
        assert_eq!(doc.list_items.len(), 2);
        let first = &doc.list_items[0].anchors[0];
        assert!(first.has_class("coral"));
        assert_eq!(first.text, "LeoHD");
        assert!(doc.list_items[1].anchors.is_empty());
        assert_eq!(doc.list_items[1].text, "File Size: 1.2 GB");
    }

    #[test]
    fn picture_takes_first_srcset_candidate() {
        let doc = page(
            r#"<picture><source srcset="/uploads/posters/leo.webp 1x, /x.webp 2x"><img src="/uploads/posters/leo.jpg"></picture>"#,
        );
        assert_eq!(doc.pictures[0].source.as_deref(), Some("/uploads/posters/leo.webp"));
        assert_eq!(doc.pictures[0].img_src.as_deref(), Some("/uploads/posters/leo.jpg"));
        assert_eq!(doc.images.len(), 1);
    }
}
