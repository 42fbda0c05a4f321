//! Document fetching over HTTP or from disk.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ViewError;

/// Loads a JSON document by location.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch and parse the document at `location`.
    async fn fetch(&self, location: &str) -> Result<Value, ViewError>;
}

/// Whether a location is fetched over the network rather than read from disk.
pub fn is_remote(location: &str) -> bool {
    Url::parse(location)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Fetcher that uses `reqwest` for `http(s)` locations and the filesystem
/// for everything else.
#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ViewError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ViewError::Http)?;
        Ok(Self { http })
    }

    async fn fetch_remote(&self, location: &str) -> Result<Value, ViewError> {
        debug!("GET {}", location);
        let response = self.http.get(location).send().await?;

        if !response.status().is_success() {
            return Err(ViewError::Status {
                location: location.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_local(&self, location: &str) -> Result<Value, ViewError> {
        debug!("Reading {}", location);
        let body = tokio::fs::read_to_string(location)
            .await
            .map_err(|error| ViewError::Io {
                location: location.to_string(),
                error,
            })?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<Value, ViewError> {
        if is_remote(location) {
            self.fetch_remote(location).await
        } else {
            self.fetch_local(location).await
        }
    }
}

/// Fetch the first source that loads, trying them in order.
///
/// Returns the last error when every source fails.
pub async fn fetch_first(
    fetcher: &dyn DocumentFetcher,
    sources: &[String],
) -> Result<Value, ViewError> {
    let mut last_error = None;
    for source in sources {
        match fetcher.fetch(source).await {
            Ok(document) => return Ok(document),
            Err(e) => {
                warn!("Failed to load {}: {}", source, e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| ViewError::NoSources("geometry".to_string())))
}
