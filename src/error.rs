//! Typed errors for the screening library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! The error taxonomy mirrors the propagation policy:
//! - [`ConfigError`] is fatal: a malformed transition table or bad batch
//!   settings indicate a programming error, so startup aborts.
//! - [`PipelineError`] is per-run: the engine folds it into a failed
//!   `SummaryRecord`; it never crosses into another URL's run.
//! - [`ReasonerError`] and [`ToolError`] come from the external
//!   collaborators and are converted at the engine's top-level guard.

use thiserror::Error;

use crate::pipeline::stage::{PayloadKind, Stage};

/// Fatal configuration errors, detected at startup.
///
/// These are never recoverable per-run: a missing transition registration
/// means the state machine itself is wrong.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A stage declares a branch with no registered transition.
    #[error("no transition registered for {stage} branch '{branch}'")]
    MissingTransition { stage: Stage, branch: &'static str },

    /// A registered transition's payload kind disagrees with the branch
    /// declaration on the stage.
    #[error("transition for {stage} branch '{branch}' expects {registered:?}, stage declares {declared:?}")]
    PayloadKindMismatch {
        stage: Stage,
        branch: &'static str,
        declared: PayloadKind,
        registered: PayloadKind,
    },

    /// Batch settings are invalid (e.g. `batch_size == 0`).
    #[error("invalid batch config: {reason}")]
    InvalidBatch { reason: String },

    /// Required input could not be loaded (resume, preferences, credentials).
    #[error("config error: {0}")]
    Input(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur within a single pipeline run.
///
/// These never escape `PipelineEngine::run`; they are converted into a
/// `SummaryRecord` with `failed = true`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The table turned out to be miswired mid-run.
    ///
    /// The engine validates at construction, so hitting this means the
    /// state machine itself is broken; it is re-raised past the per-run
    /// guard and halts the batch.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The reasoner failed (timeout, malformed output, service error).
    #[error("reasoner error: {0}")]
    Reasoner(#[from] ReasonerError),

    /// The reasoner chose a branch the current stage does not declare.
    #[error("{stage} returned undeclared branch '{branch}'")]
    UndeclaredBranch { stage: Stage, branch: String },

    /// The branch payload did not validate against the declared schema.
    #[error("{stage} branch '{branch}' carried {got:?}, expected {expected:?}")]
    PayloadMismatch {
        stage: Stage,
        branch: String,
        expected: PayloadKind,
        got: PayloadKind,
    },

    /// A merge function rejected its payload.
    ///
    /// Routed through the failure sink like any stage failure. Unreachable
    /// in practice once the engine has validated the payload kind; kept so
    /// merges stay total functions.
    #[error("merge rejected payload: {reason}")]
    Merge { reason: String },

    /// The run exceeded its step budget without reaching a terminal stage.
    #[error("step budget exhausted after {steps} steps at {stage}")]
    StepBudgetExhausted { stage: Stage, steps: usize },

    /// Provisioning the per-run tool session failed.
    #[error("tool session error: {0}")]
    Session(#[from] ToolError),
}

/// Errors from the external reasoning service.
#[derive(Debug, Error)]
pub enum ReasonerError {
    /// The reasoner timed out.
    #[error("reasoner timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// A tool invocation inside the reasoner failed.
    #[error("tool invocation failed: {0}")]
    Tool(#[from] ToolError),

    /// The reasoner's output did not match the requested schema.
    #[error("malformed reasoner output: {reason}")]
    MalformedOutput { reason: String },

    /// Transport or service-level failure.
    #[error("reasoner service error: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from tool capability providers (browser session, web search,
/// reachability probe).
#[derive(Debug, Error)]
pub enum ToolError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format.
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// The session does not support the requested action.
    #[error("unsupported tool action: {action}")]
    Unsupported { action: &'static str },

    /// Search provider returned an unusable response.
    #[error("search provider error: {0}")]
    Search(String),
}

/// Result type alias for per-run pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for startup/configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
