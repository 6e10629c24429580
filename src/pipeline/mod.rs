//! The screening pipeline: stages, transitions, and the engine.
//!
//! - [`stage`] - the stage machine's vocabulary (stages, branches, outcomes)
//! - [`transitions`] - branch wiring and the only write path into context
//! - [`engine`] - the sequential per-URL driver
//! - [`prompts`] - stage instruction text

pub mod engine;
pub mod prompts;
pub mod stage;
pub mod transitions;

pub use engine::PipelineEngine;
pub use prompts::prompt_for;
pub use stage::{branch, BranchSpec, PayloadKind, Stage, StageResult};
pub use transitions::{
    merge_error, merge_fit, merge_inspection, merge_job, merge_url, MergeFn, Transition,
    TransitionTable,
};
