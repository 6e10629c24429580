//! The terminal, immutable output of one pipeline run.

use serde::{Deserialize, Serialize};

use crate::types::context::ScreenContext;

/// Final result for one screened URL.
///
/// Produced by the engine when the run reaches the summarizer; owned by
/// the batch scheduler and consumed read-only by the report aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// The screened URL.
    pub url: String,

    /// Company name (empty if never extracted).
    pub company: String,

    /// Job title (empty if never extracted).
    pub title: String,

    /// Fit score 0-5; always 0 when `failed`.
    pub fit_score: u8,

    /// Reason for the score, or for the failure.
    pub reason: String,

    /// Whether the run failed.
    pub failed: bool,

    /// Error message when failed.
    pub error_message: Option<String>,
}

impl SummaryRecord {
    /// Extract the record from a completed run's context.
    pub fn from_context(ctx: &ScreenContext) -> Self {
        let reason = if ctx.failed {
            ctx.error_message
                .clone()
                .unwrap_or_else(|| "screening failed".to_string())
        } else {
            ctx.reason.clone().unwrap_or_default()
        };

        Self {
            url: ctx.url.clone(),
            company: ctx.company.clone().unwrap_or_default(),
            title: ctx.title.clone().unwrap_or_default(),
            fit_score: ctx.effective_fit_score(),
            reason,
            failed: ctx.failed,
            error_message: ctx.error_message.clone(),
        }
    }

    /// Build a failed record directly, bypassing the context.
    ///
    /// Used when a run dies before (or outside of) the engine loop, e.g.
    /// the tool session could not be provisioned.
    pub fn failure(url: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            url: url.into(),
            company: String::new(),
            title: String::new(),
            fit_score: 0,
            reason: format!("Processing failed: {message}"),
            failed: true,
            error_message: Some(message),
        }
    }
}
