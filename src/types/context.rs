//! The shared context threaded through one pipeline run.
//!
//! One `ScreenContext` exists per URL. Stages never touch it directly:
//! every write goes through a transition's merge function, which keeps
//! the mutation points explicit and independently testable.

use serde::{Deserialize, Serialize};

/// Mutable record shared across all stages of one pipeline run.
///
/// Fields are written incrementally as the run progresses; everything
/// except `url` is optional until the owning stage has run.
///
/// # Invariants
///
/// - Once `failed` becomes true it is never reset within the same run
///   ([`ScreenContext::fail`] is the only way to set it).
/// - `fit_score` is only meaningful when `failed` is false; a failed run
///   always summarizes with score 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenContext {
    /// The job posting URL being screened (set at entry).
    pub url: String,

    /// Resume text for the screening stage.
    pub resume: Option<String>,

    /// Free-form preferences text for the screening stage.
    pub preferences: Option<String>,

    /// Whether the inspection stage confirmed a single job posting.
    pub inspection_passed: Option<bool>,

    /// Company name, written by the extraction stage.
    pub company: Option<String>,

    /// Job title, written by the extraction stage.
    pub title: Option<String>,

    /// Condensed job description, written by the extraction stage.
    pub job_description: Option<String>,

    /// Fit score 0-5; 0 is reserved for "not scored / failed".
    pub fit_score: Option<u8>,

    /// Short explanation of the fit score.
    pub reason: Option<String>,

    /// Whether the run has failed. Monotonic: never reset to false.
    pub failed: bool,

    /// Error message recorded on failure.
    pub error_message: Option<String>,
}

impl ScreenContext {
    /// Create a fresh context for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            resume: None,
            preferences: None,
            inspection_passed: None,
            company: None,
            title: None,
            job_description: None,
            fit_score: None,
            reason: None,
            failed: false,
            error_message: None,
        }
    }

    /// Attach resume text.
    pub fn with_resume(mut self, resume: impl Into<String>) -> Self {
        self.resume = Some(resume.into());
        self
    }

    /// Attach preferences text.
    pub fn with_preferences(mut self, preferences: impl Into<String>) -> Self {
        self.preferences = Some(preferences.into());
        self
    }

    /// Mark the run failed with a message.
    ///
    /// The first recorded message wins; later failures do not overwrite it,
    /// so the report always shows the original cause.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.failed = true;
        if self.error_message.is_none() {
            self.error_message = Some(message.into());
        }
    }

    /// The fit score for reporting: 0 unless scored and not failed.
    pub fn effective_fit_score(&self) -> u8 {
        if self.failed {
            0
        } else {
            self.fit_score.unwrap_or(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_is_monotonic_and_keeps_first_message() {
        let mut ctx = ScreenContext::new("https://example.com/job");
        ctx.fail("connection refused");
        ctx.fail("second error");

        assert!(ctx.failed);
        assert_eq!(ctx.error_message.as_deref(), Some("connection refused"));
    }

    #[test]
    fn failed_context_reports_zero_score() {
        let mut ctx = ScreenContext::new("https://example.com/job");
        ctx.fit_score = Some(4);
        ctx.fail("page vanished mid-run");

        assert_eq!(ctx.effective_fit_score(), 0);
    }

    #[test]
    fn unscored_context_reports_zero() {
        let ctx = ScreenContext::new("https://example.com/job");
        assert_eq!(ctx.effective_fit_score(), 0);
    }
}
