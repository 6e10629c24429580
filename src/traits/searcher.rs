//! Job searcher trait for URL discovery.
//!
//! When the batch scheduler is not handed an explicit URL list, it pulls
//! search-result pages from a searcher one page at a time, feeding each
//! page through the same chunk-batching logic until the provider is
//! exhausted (empty page) or the success threshold is met.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ToolError;

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, ToolError>;

/// Paged job-posting URL discovery.
///
/// Pages are 1-based. An empty page means the provider is exhausted.
#[async_trait]
pub trait JobSearcher: Send + Sync {
    /// Fetch one page of posting URLs for a query.
    async fn search_page(&self, query: &str, pageno: usize) -> SearchResult<Vec<String>>;
}

/// Mock searcher serving predefined pages.
#[derive(Default)]
pub struct MockJobSearcher {
    pages: Vec<Vec<String>>,
}

impl MockJobSearcher {
    /// Create an empty searcher (every page is empty).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page of result URLs.
    pub fn with_page(mut self, urls: &[&str]) -> Self {
        self.pages.push(urls.iter().map(|u| u.to_string()).collect());
        self
    }
}

#[async_trait]
impl JobSearcher for MockJobSearcher {
    async fn search_page(&self, _query: &str, pageno: usize) -> SearchResult<Vec<String>> {
        Ok(self
            .pages
            .get(pageno.saturating_sub(1))
            .cloned()
            .unwrap_or_default())
    }
}

/// SearxNG-backed searcher.
///
/// Talks to a self-hosted SearxNG instance's JSON API. Only the result
/// URLs are kept; titles and snippets are not needed downstream.
pub struct SearxngJobSearcher {
    base_url: String,
    client: reqwest::Client,
}

impl SearxngJobSearcher {
    /// Create a searcher against a SearxNG instance, e.g.
    /// `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl JobSearcher for SearxngJobSearcher {
    async fn search_page(&self, query: &str, pageno: usize) -> SearchResult<Vec<String>> {
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            results: Vec<Hit>,
        }

        #[derive(Deserialize)]
        struct Hit {
            url: String,
        }

        let response = self
            .client
            .get(format!("{}/search", self.base_url.trim_end_matches('/')))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("language", "en"),
                ("pageno", &pageno.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ToolError::Http(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(ToolError::Search(format!(
                "searxng returned {}",
                response.status()
            )));
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|e| ToolError::Search(e.to_string()))?;

        Ok(parsed.results.into_iter().map(|h| h.url).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_searcher_pages_are_one_based() {
        let searcher = MockJobSearcher::new()
            .with_page(&["https://a.test/1", "https://a.test/2"])
            .with_page(&["https://a.test/3"]);

        let first = searcher.search_page("data scientist", 1).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = searcher.search_page("data scientist", 2).await.unwrap();
        assert_eq!(second, vec!["https://a.test/3".to_string()]);

        // Past the last page: exhausted.
        let third = searcher.search_page("data scientist", 3).await.unwrap();
        assert!(third.is_empty());
    }
}
