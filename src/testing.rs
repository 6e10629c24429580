//! Testing utilities including a scripted mock reasoner.
//!
//! Useful for testing pipeline and batch behavior without real LLM or
//! network calls. The mock answers with a configurable outcome per stage,
//! falls back to a coherent happy path, and records every invocation so
//! tests can assert stage ordering.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::ReasonerError;
use crate::pipeline::stage::{branch, Stage, StageResult};
use crate::traits::reasoner::{Reasoner, StageRequest};
use crate::types::payload::{
    FitScore, InspectionResult, JobDescription, StagePayload, UrlResult,
};

/// Record of one invocation of the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// URL of the run the invocation belonged to.
    pub url: String,

    /// Stage that was invoked.
    pub stage: Stage,
}

/// A scripted mock reasoner.
///
/// Unscripted stages take the happy path: reachable, a single job
/// posting, a fixed extraction, and a default fit score. Scripts can
/// override individual stages or fail whole URLs.
#[derive(Default)]
pub struct MockReasoner {
    by_stage: Arc<RwLock<HashMap<Stage, StageResult>>>,
    failing_stages: Arc<RwLock<HashMap<Stage, String>>>,
    failing_urls: Arc<RwLock<HashSet<String>>>,
    default_score: Arc<RwLock<u8>>,
    calls: Arc<RwLock<Vec<MockCall>>>,
}

impl MockReasoner {
    /// Create a mock that succeeds every stage.
    pub fn new() -> Self {
        Self {
            default_score: Arc::new(RwLock::new(3)),
            ..Default::default()
        }
    }

    /// Script a fixed outcome for a stage.
    pub fn on(self, stage: Stage, result: StageResult) -> Self {
        self.by_stage.write().unwrap().insert(stage, result);
        self
    }

    /// Make a stage fail with a reasoner error.
    pub fn failing_at(self, stage: Stage, message: impl Into<String>) -> Self {
        self.failing_stages
            .write()
            .unwrap()
            .insert(stage, message.into());
        self
    }

    /// Make every invocation for a URL fail with a reasoner error.
    pub fn failing_for_url(self, url: impl Into<String>) -> Self {
        self.failing_urls.write().unwrap().insert(url.into());
        self
    }

    /// Set the default fit score for unscripted screener invocations.
    pub fn with_default_score(self, score: u8) -> Self {
        *self.default_score.write().unwrap() = score;
        self
    }

    /// Stages invoked so far, in order.
    pub fn invocations(&self) -> Vec<Stage> {
        self.calls.read().unwrap().iter().map(|c| c.stage).collect()
    }

    /// Full call log.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.read().unwrap().clone()
    }

    fn happy_path(&self, stage: Stage, url: &str) -> StageResult {
        match stage {
            Stage::UrlChecker => StageResult::branch(
                branch::REACHABLE,
                StagePayload::Url(UrlResult {
                    url: url.to_string(),
                    status_code: 200,
                    reachable: true,
                }),
            ),
            Stage::PageInspector => StageResult::branch(
                branch::IS_JOB_POSTING,
                StagePayload::Inspection(InspectionResult {
                    is_job_posting: true,
                    notes: None,
                }),
            ),
            Stage::Extractor => StageResult::branch(
                branch::EXTRACTED,
                StagePayload::Job(JobDescription {
                    company: "Acme".into(),
                    title: "Engineer".into(),
                    description: "Builds data pipelines in Rust.".into(),
                }),
            ),
            Stage::Screener => StageResult::branch(
                branch::SCORED,
                StagePayload::Fit(FitScore {
                    score: *self.default_score.read().unwrap(),
                    reason: "Default mock score".into(),
                }),
            ),
            Stage::Summarizer => StageResult::failure("summarizer should not be invoked"),
        }
    }
}

#[async_trait]
impl Reasoner for MockReasoner {
    async fn invoke(&self, request: StageRequest<'_>) -> Result<StageResult, ReasonerError> {
        self.calls.write().unwrap().push(MockCall {
            url: request.context.url.clone(),
            stage: request.stage,
        });

        if self.failing_urls.read().unwrap().contains(&request.context.url) {
            return Err(ReasonerError::Service(
                format!("scripted failure for {}", request.context.url).into(),
            ));
        }

        if let Some(message) = self.failing_stages.read().unwrap().get(&request.stage) {
            return Err(ReasonerError::MalformedOutput {
                reason: message.clone(),
            });
        }

        if let Some(result) = self.by_stage.read().unwrap().get(&request.stage) {
            return Ok(result.clone());
        }

        Ok(self.happy_path(request.stage, &request.context.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::context::ScreenContext;

    #[tokio::test]
    async fn unscripted_mock_walks_the_happy_path() {
        let reasoner = MockReasoner::new();
        let ctx = ScreenContext::new("https://a.test/job");

        let request = StageRequest {
            stage: Stage::UrlChecker,
            prompt: String::new(),
            context: &ctx,
            branches: Stage::UrlChecker.branches(),
            tools: None,
        };

        match reasoner.invoke(request).await.unwrap() {
            StageResult::Branch { branch: name, .. } => assert_eq!(name, branch::REACHABLE),
            other => panic!("expected branch, got {other:?}"),
        }
        assert_eq!(reasoner.invocations(), vec![Stage::UrlChecker]);
    }

    #[tokio::test]
    async fn failing_url_fails_every_stage() {
        let reasoner = MockReasoner::new().failing_for_url("https://bad.test/job");
        let ctx = ScreenContext::new("https://bad.test/job");

        let request = StageRequest {
            stage: Stage::Screener,
            prompt: String::new(),
            context: &ctx,
            branches: Stage::Screener.branches(),
            tools: None,
        };

        assert!(reasoner.invoke(request).await.is_err());
    }
}
