//! Downloading images found by keyword search

use crate::error::{CollageError, Result};
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Default per-image download timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieves and decodes a remote image
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// # Errors
    /// - Network failures and non-success status codes
    /// - Undecodable bodies
    async fn fetch(&self, url: &str) -> Result<DynamicImage>;
}

#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CollageError::network_error("Failed to create HTTP client", e))?;
        Ok(Self { client })
    }

    pub fn with_default_timeout() -> Result<Self> {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<DynamicImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CollageError::network_error(format!("Failed to fetch {}", url), e))?;

        if !response.status().is_success() {
            return Err(CollageError::Network(format!(
                "HTTP error {} for {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CollageError::network_error(format!("Failed to read {}", url), e))?;
        debug!(url = %url, bytes = bytes.len(), "📥 Image downloaded");

        // Format comes from the content, hosts often lie about the extension
        Ok(image::load_from_memory(&bytes)?)
    }
}
