//! Tool capability provider: the small fixed action set a reasoner may
//! call while working a stage.
//!
//! Sessions are provisioned fresh per pipeline run and torn down when the
//! run completes — never shared across concurrent runs, so one URL's
//! browser state can never bleed into another's. Each action may fail
//! independently; failures surface to the reasoner, not to the engine.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ToolError;

/// Result type alias for tool operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// A fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,

    /// HTTP status code.
    pub status: u16,

    /// Response body.
    pub body: String,
}

/// Result of a reachability probe.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Final URL after redirects.
    pub url: String,

    /// HTTP status code (-1 if the request never completed).
    pub status_code: i32,

    /// True if 200 <= status < 400.
    pub reachable: bool,

    /// Error detail when the probe failed outright.
    pub error: Option<String>,
}

/// One run's tool session.
///
/// The action set is deliberately small: `navigate`, `wait`, `fetch`,
/// `search`, plus the reachability `probe`. Providers that lack an action
/// return [`ToolError::Unsupported`].
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Check reachability with a single timed GET.
    ///
    /// A transport failure is an answer here ("unreachable"), not an
    /// error, so this never returns `Err` for a dead URL.
    async fn probe(&self, url: &str) -> ProbeResult;

    /// Navigate the session to a URL and return the rendered page.
    async fn navigate(&self, url: &str) -> ToolResult<FetchedPage>;

    /// Wait for the page to settle.
    async fn wait(&self, duration: Duration) -> ToolResult<()>;

    /// Fetch a URL without navigation state.
    async fn fetch(&self, url: &str) -> ToolResult<FetchedPage>;

    /// Search the web, returning result URLs.
    async fn search(&self, _query: &str) -> ToolResult<Vec<String>> {
        Err(ToolError::Unsupported { action: "search" })
    }
}

/// Provisions one tool session per pipeline run.
#[async_trait]
pub trait ToolSessionFactory: Send + Sync {
    /// Open a fresh session.
    async fn open(&self) -> ToolResult<Box<dyn ToolSession>>;
}

/// Plain-HTTP tool provider.
///
/// `navigate` and `fetch` are the same timed GET; there is no real
/// browser behind it, which is enough for postings served as static HTML.
pub struct HttpToolSession {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpToolSession {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Create a session with the default timeout.
    pub fn new() -> ToolResult<Self> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Create a session with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> ToolResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; jobscreen)")
            .build()
            .map_err(|e| ToolError::Http(Box::new(e)))?;
        Ok(Self { client, timeout })
    }

    async fn get(&self, url: &str) -> ToolResult<FetchedPage> {
        url::Url::parse(url).map_err(|_| ToolError::InvalidUrl { url: url.into() })?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Timeout { url: url.into() }
            } else {
                ToolError::Http(Box::new(e))
            }
        })?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Http(Box::new(e)))?;

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }
}

#[async_trait]
impl ToolSession for HttpToolSession {
    async fn probe(&self, url: &str) -> ProbeResult {
        match self.get(url).await {
            Ok(page) => ProbeResult {
                reachable: page.status < 400,
                url: page.url,
                status_code: page.status as i32,
                error: None,
            },
            Err(e) => ProbeResult {
                url: url.to_string(),
                status_code: -1,
                reachable: false,
                error: Some(e.to_string()),
            },
        }
    }

    async fn navigate(&self, url: &str) -> ToolResult<FetchedPage> {
        self.get(url).await
    }

    async fn wait(&self, duration: Duration) -> ToolResult<()> {
        // Cap waits at the session timeout so a confused reasoner cannot
        // stall the run.
        tokio::time::sleep(duration.min(self.timeout)).await;
        Ok(())
    }

    async fn fetch(&self, url: &str) -> ToolResult<FetchedPage> {
        self.get(url).await
    }
}

/// Factory for [`HttpToolSession`].
pub struct HttpToolSessionFactory {
    timeout: Duration,
}

impl HttpToolSessionFactory {
    /// Create a factory with the default timeout.
    pub fn new() -> Self {
        Self {
            timeout: HttpToolSession::DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for HttpToolSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolSessionFactory for HttpToolSessionFactory {
    async fn open(&self) -> ToolResult<Box<dyn ToolSession>> {
        Ok(Box::new(HttpToolSession::with_timeout(self.timeout)?))
    }
}

/// Mock tool session for testing.
///
/// Pages are keyed by URL; anything not registered probes unreachable.
#[derive(Default)]
pub struct MockToolSession {
    pages: std::collections::HashMap<String, FetchedPage>,
    search_results: std::collections::HashMap<String, Vec<String>>,
}

impl MockToolSession {
    /// Create an empty mock session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page at a URL.
    pub fn with_page(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                url: url.to_string(),
                status,
                body: body.to_string(),
            },
        );
        self
    }

    /// Register search results for a query.
    pub fn with_search(mut self, query: &str, urls: &[&str]) -> Self {
        self.search_results.insert(
            query.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl ToolSession for MockToolSession {
    async fn probe(&self, url: &str) -> ProbeResult {
        match self.pages.get(url) {
            Some(page) => ProbeResult {
                url: page.url.clone(),
                status_code: page.status as i32,
                reachable: page.status < 400,
                error: None,
            },
            None => ProbeResult {
                url: url.to_string(),
                status_code: -1,
                reachable: false,
                error: Some("connection refused".to_string()),
            },
        }
    }

    async fn navigate(&self, url: &str) -> ToolResult<FetchedPage> {
        self.fetch(url).await
    }

    async fn wait(&self, _duration: Duration) -> ToolResult<()> {
        Ok(())
    }

    async fn fetch(&self, url: &str) -> ToolResult<FetchedPage> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ToolError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no mock page for {url}"),
            ))))
    }

    async fn search(&self, query: &str) -> ToolResult<Vec<String>> {
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }
}

/// Factory producing empty [`MockToolSession`]s.
///
/// Enough for tests whose reasoner never touches the session. Set
/// `fail_after` to make provisioning fail from the nth `open` onwards.
#[derive(Default)]
pub struct MockToolSessionFactory {
    fail_after: Option<usize>,
    opened: std::sync::atomic::AtomicUsize,
}

impl MockToolSessionFactory {
    /// Create a factory that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `open` after the first `n` successes.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// How many sessions have been opened.
    pub fn opened(&self) -> usize {
        self.opened.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolSessionFactory for MockToolSessionFactory {
    async fn open(&self) -> ToolResult<Box<dyn ToolSession>> {
        let n = self
            .opened
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(limit) = self.fail_after {
            if n >= limit {
                return Err(ToolError::Http(Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "mock session provisioning failed",
                ))));
            }
        }
        Ok(Box::new(MockToolSession::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_probe_reports_unregistered_urls_unreachable() {
        let session = MockToolSession::new().with_page("https://ok.test/job", 200, "<html>");

        let hit = session.probe("https://ok.test/job").await;
        assert!(hit.reachable);
        assert_eq!(hit.status_code, 200);

        let miss = session.probe("https://gone.test/job").await;
        assert!(!miss.reachable);
        assert_eq!(miss.status_code, -1);
        assert!(miss.error.is_some());
    }

    #[tokio::test]
    async fn mock_probe_treats_4xx_as_unreachable() {
        let session = MockToolSession::new().with_page("https://gone.test/job", 404, "not found");
        let result = session.probe("https://gone.test/job").await;
        assert!(!result.reachable);
        assert_eq!(result.status_code, 404);
    }

    #[tokio::test]
    async fn http_session_rejects_invalid_urls() {
        let session = HttpToolSession::new().unwrap();
        let result = session.fetch("not a url").await;
        assert!(matches!(result, Err(ToolError::InvalidUrl { .. })));
    }
}
