use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use tracing::{debug, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::document::Document;
use crate::error::FetchError;

const UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Source of parsed pages. Every pipeline stage goes through this.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Document, FetchError>;
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(UA));
    headers.insert(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(HeaderName::from_static("upgrade-insecure-requests"), HeaderValue::from_static("1"));
    headers
}

/// reqwest-backed fetcher. Sleeps `config.delay` before every request.
pub struct HttpFetcher {
    client: reqwest::Client,
    config: ScraperConfig,
}

impl HttpFetcher {
    pub fn new(config: ScraperConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers())
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport { url: url.clone(), source };
        let resp = self.client.get(url.clone()).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.clone(), status: status.as_u16() });
        }
        resp.text().await.map_err(transport)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Document, FetchError> {
        tokio::time::sleep(self.config.delay).await;
        debug!(%url, "fetching");
        match self.get_text(url).await {
            Ok(body) => Ok(Document::parse(url.clone(), &body)),
            Err(e) => {
                if e.is_timeout() {
                    warn!("timed out fetching {}", e.url());
                } else {
                    warn!("error fetching {}: {}", url, e);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory site: URL -> HTML. Unknown URLs answer 404. Records every fetch.
    #[derive(Default)]
    pub struct FakeSite {
        pages: HashMap<String, String>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSite {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            let key = Url::parse(url).expect("test url").to_string();
            self.pages.insert(key, html.to_string());
            self
        }

        pub fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }

        pub fn fetch_count(&self) -> usize {
            self.fetched.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Fetch for FakeSite {
        async fn fetch(&self, url: &Url) -> Result<Document, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            match self.pages.get(url.as_str()) {
                Some(html) => Ok(Document::parse(url.clone(), html)),
                None => Err(FetchError::Status { url: url.clone(), status: 404 }),
            }
        }
    }

    pub fn url(s: &str) -> Url {
        Url::parse(s).expect("test url")
    }
}
