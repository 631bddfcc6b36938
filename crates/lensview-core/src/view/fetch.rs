//! Lens scope fetchers used by the poll controller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;

use crate::graph::Lens;
use crate::scope::{ScopeError, SubgraphScoper};

/// Errors while fetching a lens scope for the view.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode lens scope: {0}")]
    Decode(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Source of normalized lens snapshots.
#[async_trait]
pub trait ScopeFetcher: Send + Sync {
    /// Current scope of `lens_name`; `Ok(None)` when the lens does not exist.
    async fn fetch_scope(&self, lens_name: &str) -> Result<Option<Lens>, FetchError>;
}

#[async_trait]
impl ScopeFetcher for SubgraphScoper {
    async fn fetch_scope(&self, lens_name: &str) -> Result<Option<Lens>, FetchError> {
        Ok(self.scope_lens(lens_name).await?)
    }
}

/// Fetches lens scopes from a running resolver server.
pub struct HttpScopeFetcher {
    base_url: Url,
    client: Client,
}

impl HttpScopeFetcher {
    /// Creates a fetcher for the server at `base_url` (e.g. `http://localhost:3333`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    /// URL of the lens scope endpoint, with the name percent-encoded.
    pub fn lens_url(&self, lens_name: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["api", "lens", lens_name]);
        }
        url
    }
}

#[async_trait]
impl ScopeFetcher for HttpScopeFetcher {
    async fn fetch_scope(&self, lens_name: &str) -> Result<Option<Lens>, FetchError> {
        let response = self.client.get(self.lens_url(lens_name)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<Option<Lens>>().await?)
    }
}
