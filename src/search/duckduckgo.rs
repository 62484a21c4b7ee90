//! DuckDuckGo image search
//!
//! Image search is a two step exchange: the HTML search page embeds a `vqd`
//! token for the query, and the `i.js` endpoint returns JSON results for the
//! same query when that token is supplied.

use super::{ImageSearchProvider, SearchHit};
use crate::{
    config::SearchSettings,
    error::{CollageError, Result},
};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

const BASE_URL: &str = "https://duckduckgo.com";
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    results: Vec<ImageResult>,
}

#[derive(Debug, Deserialize)]
struct ImageResult {
    image: String,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

impl From<ImageResult> for SearchHit {
    fn from(result: ImageResult) -> Self {
        Self {
            image_url: result.image,
            thumbnail_url: result.thumbnail,
            title: result.title,
            width: result.width,
            height: result.height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    base_url: String,
    region: String,
    delay: Duration,
}

impl DuckDuckGoSearch {
    pub fn new(settings: &SearchSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CollageError::network_error("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            region: settings.region.clone(),
            delay: Duration::from_millis(settings.delay_ms),
        })
    }

    /// Point the provider at another host (used for local test servers)
    #[must_use]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_vqd(&self, keyword: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("q", keyword), ("iax", "images"), ("ia", "images")])
            .send()
            .await
            .map_err(|e| CollageError::network_error("DuckDuckGo token request failed", e))?;

        if !response.status().is_success() {
            return Err(CollageError::Network(format!(
                "DuckDuckGo token request returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CollageError::network_error("Failed to read DuckDuckGo page", e))?;
        extract_vqd(&body).ok_or_else(|| {
            CollageError::search(format!("no search token found for '{}'", keyword))
        })
    }
}

#[async_trait]
impl ImageSearchProvider for DuckDuckGoSearch {
    #[instrument(level = "debug", skip(self))]
    async fn search_images(&self, keyword: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let vqd = self.fetch_vqd(keyword).await?;
        debug!(vqd = %vqd, "Obtained search token");

        let response = self
            .client
            .get(format!("{}/i.js", self.base_url))
            .header(header::REFERER, format!("{}/", self.base_url))
            .query(&[
                ("l", self.region.as_str()),
                ("o", "json"),
                ("q", keyword),
                ("vqd", vqd.as_str()),
                ("f", ",,,,,"),
                ("p", "1"),
            ])
            .send()
            .await
            .map_err(|e| CollageError::network_error("DuckDuckGo image request failed", e))?;

        if !response.status().is_success() {
            return Err(CollageError::Network(format!(
                "DuckDuckGo image request returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CollageError::network_error("Failed to read DuckDuckGo results", e))?;
        let hits = parse_results(&body, max_results)?;
        debug!(count = hits.len(), "Image search finished");
        Ok(hits)
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

/// Pull the `vqd` token out of the search page markup
///
/// The page embeds it either as `vqd="4-123..."`, `vqd='4-123...'` or as a
/// query parameter `vqd=4-123...&`.
fn extract_vqd(html: &str) -> Option<String> {
    let start = html.find("vqd=")? + "vqd=".len();
    let rest = html.get(start..)?;
    let token: String = match rest.chars().next()? {
        quote @ ('"' | '\'') => rest
            .get(1..)?
            .chars()
            .take_while(|&c| c != quote)
            .collect(),
        _ => rest
            .chars()
            .take_while(|&c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            .collect(),
    };
    (!token.is_empty()).then_some(token)
}

fn parse_results(body: &[u8], max_results: usize) -> Result<Vec<SearchHit>> {
    let response: ImageResponse = serde_json::from_slice(body)
        .map_err(|e| CollageError::search(format!("malformed image search response: {}", e)))?;
    Ok(response
        .results
        .into_iter()
        .filter(|result| !result.image.is_empty())
        .take(max_results)
        .map(SearchHit::from)
        .collect())
}
