//! Configuration for screening runs and batches.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Configuration for the batch scheduler.
///
/// Chunk size is the single concurrency knob: within a chunk runs execute
/// concurrently, chunks themselves are strictly sequential, so at most
/// `batch_size` tool sessions are ever open at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// URLs screened concurrently per chunk. Must be >= 1.
    pub batch_size: usize,

    /// Stop scheduling further chunks once this many runs have succeeded.
    ///
    /// `None` (or any value <= 0 on the CLI) means run to exhaustion.
    pub desired_success_count: Option<usize>,

    /// Only consider the first N URLs of the input.
    pub top_n: Option<usize>,

    /// Step budget per pipeline run.
    pub max_steps: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            desired_success_count: None,
            top_n: None,
            max_steps: 8,
        }
    }
}

impl BatchConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the success threshold. Values of 0 disable the threshold.
    pub fn with_desired_success_count(mut self, count: usize) -> Self {
        self.desired_success_count = if count == 0 { None } else { Some(count) };
        self
    }

    /// Limit screening to the first N URLs.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }

    /// Set the per-run step budget.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Validate the config. Called by the scheduler at startup.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatch {
                reason: "batch_size must be >= 1".into(),
            });
        }
        if self.max_steps == 0 {
            return Err(ConfigError::InvalidBatch {
                reason: "max_steps must be >= 1".into(),
            });
        }
        Ok(())
    }
}

/// Per-run screening inputs shared by every URL in a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenInputs {
    /// Resume text for the screening stage.
    pub resume: Option<String>,

    /// Preferences text for the screening stage.
    pub preferences: Option<String>,
}

impl ScreenInputs {
    /// Create empty inputs.
    pub fn new() -> Self {
        Self::default()
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
}
