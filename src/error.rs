use thiserror::Error;
use url::Url;

/// A page that could not be turned into a document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: Url, status: u16 },
}

impl FetchError {
    pub fn url(&self) -> &Url {
        match self {
            Self::Transport { url, .. } | Self::Status { url, .. } => url,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }

    /// The server answered and said the page is not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == 404 || *status == 410)
    }
}

/// Why a redirect chain ended without a media URL.
#[derive(Debug, Error)]
pub enum Unresolved {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no media or redirect links on {0}")]
    NoLinks(Url),
    #[error("redirect chain still unresolved at {0} after the hop limit")]
    DepthExceeded(Url),
}
