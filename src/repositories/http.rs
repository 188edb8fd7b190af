//! HTTP-backed catalogue store

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::CatalogueStore;
use crate::catalogue::Catalogue;
use crate::errors::{CatalogueError, CatalogueResult};
use crate::sources::{self, SourceFormat};
use crate::utils::url::UrlUtils;

const USER_AGENT: &str = concat!("tvstream/", env!("CARGO_PKG_VERSION"));

/// Store that fetches a JSON or M3U document over HTTP(S) on every load
#[derive(Clone)]
pub struct HttpCatalogueStore {
    client: Client,
    url: String,
    format: SourceFormat,
}

impl HttpCatalogueStore {
    /// Create a store with a total request timeout
    pub fn new(
        url: impl Into<String>,
        format: SourceFormat,
        request_timeout: Duration,
    ) -> CatalogueResult<Self> {
        let url = url.into();
        UrlUtils::parse_and_validate(&url).map_err(|e| CatalogueError::http(&url, e.to_string()))?;

        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CatalogueError::http(&url, format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, url, format })
    }

    async fn fetch_text(&self) -> CatalogueResult<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CatalogueError::http(&self.url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Catalogue fetch from {} returned {}",
                UrlUtils::obfuscate_credentials(&self.url),
                status
            );
            return Err(CatalogueError::http(
                &self.url,
                format!(
                    "HTTP error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| CatalogueError::http(&self.url, format!("failed to read response: {e}")))
    }
}

#[async_trait]
impl CatalogueStore for HttpCatalogueStore {
    async fn load_catalogue(&self) -> CatalogueResult<Catalogue> {
        let content = self.fetch_text().await?;
        debug!(
            "Fetched {} bytes from {}",
            content.len(),
            UrlUtils::obfuscate_credentials(&self.url)
        );

        sources::decode(&self.url, &content, self.format)
    }

    fn describe(&self) -> String {
        format!("http {}", UrlUtils::obfuscate_credentials(&self.url))
    }
}

impl fmt::Debug for HttpCatalogueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCatalogueStore")
            .field("url", &UrlUtils::obfuscate_credentials(&self.url))
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
