//! Typed branch payloads handed between stages.
//!
//! Every branch a stage can take declares exactly one payload shape.
//! The reasoner produces these as structured output; the engine validates
//! the kind against the transition table before any merge runs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::pipeline::stage::PayloadKind;

/// Result of the reachability check.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UrlResult {
    /// The URL after any redirects.
    pub url: String,

    /// HTTP status code of the GET request (-1 if the request failed).
    pub status_code: i32,

    /// True if 200 <= status < 400.
    pub reachable: bool,
}

/// Result of the page inspection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InspectionResult {
    /// Whether the page contains exactly one job description.
    pub is_job_posting: bool,

    /// Short note on what the page actually contains.
    pub notes: Option<String>,
}

/// Structured job data produced by the extraction stage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobDescription {
    /// Company name.
    pub company: String,

    /// Job title.
    pub title: String,

    /// Condensed description: requirements, responsibilities,
    /// qualifications, tools. No boilerplate.
    pub description: String,
}

/// Fit score produced by the screening stage.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FitScore {
    /// Fit score between 1 and 5 (0 is reserved for failed runs).
    pub score: u8,

    /// Short explanation of the score.
    pub reason: String,
}

/// Error carried to the failure sink.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorMessage {
    /// Human-readable reason the run cannot proceed.
    pub message: String,
}

impl ErrorMessage {
    /// Create an error payload.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Tagged union over all branch payloads.
///
/// The discriminant ([`StagePayload::kind`]) is what the engine checks
/// against the branch's declared [`PayloadKind`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StagePayload {
    Url(UrlResult),
    Inspection(InspectionResult),
    Job(JobDescription),
    Fit(FitScore),
    Error(ErrorMessage),
}

impl StagePayload {
    /// The payload's kind discriminant.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::Url(_) => PayloadKind::Url,
            Self::Inspection(_) => PayloadKind::Inspection,
            Self::Job(_) => PayloadKind::Job,
            Self::Fit(_) => PayloadKind::Fit,
            Self::Error(_) => PayloadKind::Error,
        }
    }
}

impl From<ErrorMessage> for StagePayload {
    fn from(e: ErrorMessage) -> Self {
        Self::Error(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let payload = StagePayload::Fit(FitScore {
            score: 4,
            reason: "strong match".into(),
        });
        assert_eq!(payload.kind(), PayloadKind::Fit);

        let payload = StagePayload::Error(ErrorMessage::new("404"));
        assert_eq!(payload.kind(), PayloadKind::Error);
    }
}
