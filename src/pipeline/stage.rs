//! Stages, branches, and stage outcomes.
//!
//! The pipeline is a bounded state machine: each stage declares up front
//! the branches it may take and the payload shape each branch carries.
//! The declarations here are what the transition table is validated
//! against at startup.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::payload::StagePayload;

/// Branch name constants, shared between stage declarations and the
/// transition table so the two cannot drift apart silently.
pub mod branch {
    pub const REACHABLE: &str = "reachable";
    pub const UNREACHABLE: &str = "unreachable";
    pub const IS_JOB_POSTING: &str = "is_job_posting";
    pub const NOT_JOB_POSTING: &str = "not_job_posting";
    pub const EXTRACTED: &str = "extracted";
    pub const SCORED: &str = "scored";
}

/// The five stages of the screening pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Checks URL reachability with a single timed GET.
    UrlChecker,

    /// Verifies the page contains a single job description.
    PageInspector,

    /// Extracts company, title, and job description.
    Extractor,

    /// Scores fit against resume and preferences.
    Screener,

    /// Terminal stage and failure sink; reads the accumulated context.
    Summarizer,
}

impl Stage {
    /// The branches this stage may take, with their payload shapes.
    ///
    /// Each stage must choose exactly one of its declared branches on every
    /// invocation; a stage with no branches is terminal. The extractor has
    /// no typed failure branch: an extraction error surfaces as a generic
    /// `Failure` and is routed through the failure sink.
    pub fn branches(&self) -> &'static [BranchSpec] {
        match self {
            Self::UrlChecker => &[
                BranchSpec {
                    name: branch::REACHABLE,
                    payload: PayloadKind::Url,
                    description: "the URL responded with a 2xx/3xx status",
                },
                BranchSpec {
                    name: branch::UNREACHABLE,
                    payload: PayloadKind::Error,
                    description: "the URL could not be fetched",
                },
            ],
            Self::PageInspector => &[
                BranchSpec {
                    name: branch::IS_JOB_POSTING,
                    payload: PayloadKind::Inspection,
                    description: "the page contains a single job description",
                },
                BranchSpec {
                    name: branch::NOT_JOB_POSTING,
                    payload: PayloadKind::Error,
                    description: "the page is not a single job description",
                },
            ],
            Self::Extractor => &[BranchSpec {
                name: branch::EXTRACTED,
                payload: PayloadKind::Job,
                description: "company, title, and description were extracted",
            }],
            Self::Screener => &[BranchSpec {
                name: branch::SCORED,
                payload: PayloadKind::Fit,
                description: "the job was scored against the resume",
            }],
            Self::Summarizer => &[],
        }
    }

    /// Terminal stages end the run.
    pub fn is_terminal(&self) -> bool {
        self.branches().is_empty()
    }

    /// Whether invocations of this stage get a tool session.
    ///
    /// The checker probes reachability, the inspector and extractor drive
    /// the browser session; scoring and summarizing are pure reasoning.
    pub fn uses_tools(&self) -> bool {
        matches!(self, Self::UrlChecker | Self::PageInspector | Self::Extractor)
    }

    /// Look up a declared branch by name.
    pub fn branch(&self, name: &str) -> Option<&'static BranchSpec> {
        self.branches().iter().find(|b| b.name == name)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UrlChecker => "UrlChecker",
            Self::PageInspector => "PageInspector",
            Self::Extractor => "Extractor",
            Self::Screener => "Screener",
            Self::Summarizer => "Summarizer",
        };
        f.write_str(name)
    }
}

/// Discriminant for branch payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Url,
    Inspection,
    Job,
    Fit,
    Error,
}

/// Declaration of one branch a stage may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchSpec {
    /// Branch name the reasoner must answer with.
    pub name: &'static str,

    /// Payload shape the branch carries.
    pub payload: PayloadKind,

    /// When to take this branch (surfaced to the reasoner).
    pub description: &'static str,
}

/// Outcome of one stage invocation.
///
/// A stage either commits to exactly one of its declared branches with a
/// validated payload, or fails. There is no "bare answer" outcome: the
/// available-actions contract forces a handoff every invocation, so the
/// engine always makes progress.
#[derive(Debug, Clone)]
pub enum StageResult {
    /// The stage chose a branch.
    Branch {
        /// Name of the chosen branch.
        branch: String,

        /// Payload for that branch.
        payload: StagePayload,
    },

    /// The stage failed outright (reasoner or tool error it could not
    /// express as a typed branch).
    Failure {
        /// Human-readable error detail.
        message: String,
    },
}

impl StageResult {
    /// Convenience constructor for a branch outcome.
    pub fn branch(name: impl Into<String>, payload: StagePayload) -> Self {
        Self::Branch {
            branch: name.into(),
            payload,
        }
    }

    /// Convenience constructor for a failure outcome.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}
