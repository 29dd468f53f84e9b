//! Manifest transport.

use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Loads a manifest document from a url.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Fetch and decode the manifest at `url`.
    async fn fetch(&self, url: &str) -> Result<Value>;
}

/// [`ManifestFetcher`] over HTTP(S).
pub struct HttpManifestFetcher {
    client: Client,
}

impl fmt::Debug for HttpManifestFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpManifestFetcher").finish_non_exhaustive()
    }
}

impl HttpManifestFetcher {
    /// Create a fetcher with its own connection pool.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cubx-resolver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::transport("", format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Create a fetcher reusing an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, url: &str) -> Result<Value> {
        debug!(%url, "Fetching manifest");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::transport(url, format!("HTTP {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| Error::transport(url, format!("Failed to decode manifest: {e}")))
    }
}
