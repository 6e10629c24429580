//! Job-Posting Screening Pipeline
//!
//! Screens job postings for a single user doing job-search triage: given
//! a URL, determine whether the page is reachable, whether it holds a
//! single job description, extract the structured job data, score fit
//! against a resume and preferences, and summarize the result. Batches of
//! URLs run through the pipeline concurrently in bounded chunks.
//!
//! # Design
//!
//! The core is a bounded state machine with typed transition payloads:
//!
//! - Each stage declares its branches and their payload shapes up front;
//!   the transition table is validated for completeness at startup, so a
//!   miswired pipeline fails fast instead of surfacing as per-URL noise.
//! - All context mutation goes through one pure merge function per
//!   transition — there is no other write path.
//! - Any stage can short-circuit to the summarizer (the failure sink);
//!   a run always produces a `SummaryRecord`, never an escaped error.
//! - The language understanding inside each stage is delegated to a
//!   [`Reasoner`]; browser/search capabilities to a
//!   [`ToolSession`](traits::ToolSession) provisioned fresh per run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jobscreen::{
//!     BatchConfig, BatchScheduler, PipelineEngine, TransitionTable,
//!     report, testing::MockReasoner, traits::MockToolSessionFactory,
//! };
//!
//! let engine = PipelineEngine::new(TransitionTable::job_screening())?;
//! let scheduler = BatchScheduler::new(
//!     engine,
//!     Arc::new(MockReasoner::new()),
//!     Arc::new(MockToolSessionFactory::new()),
//!     BatchConfig::new().with_batch_size(3),
//! )?;
//!
//! let records = scheduler.run_batch(&urls).await?;
//! println!("{}", report::compile(&records).render_text());
//! ```
//!
//! # Modules
//!
//! - [`pipeline`] - stages, transition table, and the per-URL engine
//! - [`batch`] - chunked concurrent scheduling with early stop
//! - [`report`] - pure aggregation over batch results
//! - [`traits`] - seams to the reasoner, tool, and search collaborators
//! - [`types`] - context, payloads, records, configuration
//! - [`testing`] - scripted mock reasoner for tests

pub mod batch;
pub mod error;
pub mod pipeline;
pub mod reasoners;
pub mod report;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ConfigError, PipelineError, ReasonerError, ToolError};
pub use pipeline::{
    BranchSpec, PayloadKind, PipelineEngine, Stage, StageResult, TransitionTable,
};
pub use traits::{JobSearcher, Reasoner, StageRequest, ToolSession, ToolSessionFactory};
pub use types::{
    BatchConfig, ErrorMessage, FitScore, InspectionResult, JobDescription, ScreenContext,
    ScreenInputs, StagePayload, SummaryRecord, UrlResult,
};

// Re-export the scheduler and report entry points
pub use batch::BatchScheduler;
pub use report::{compile, Report};

#[cfg(feature = "openai")]
pub use reasoners::OpenAiReasoner;
