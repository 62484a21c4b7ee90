//! Keyword image search

pub mod duckduckgo;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use duckduckgo::DuckDuckGoSearch;

/// One candidate image returned by a search provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Full-size image URL
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub title: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Keyword in, candidate image URLs out
#[async_trait]
pub trait ImageSearchProvider: Send + Sync {
    /// Search for up to `max_results` images matching `keyword`
    ///
    /// An empty vector means the provider answered but found nothing.
    ///
    /// # Errors
    /// - Network failures
    /// - Malformed provider responses
    async fn search_images(&self, keyword: &str, max_results: usize) -> Result<Vec<SearchHit>>;

    fn name(&self) -> &str;
}

/// Split a comma separated keyword list, trimming blanks
///
/// ```rust
/// use collage_maker::search::parse_keywords;
///
/// assert_eq!(parse_keywords(" IU, Hanni ,, Shin-chan "), ["IU", "Hanni", "Shin-chan"]);
/// ```
#[must_use]
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}
