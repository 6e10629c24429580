//! Reasoner trait: the external language-understanding service.
//!
//! Each stage's "thinking" is delegated to a reasoner. The engine hands it
//! a rendered prompt, a snapshot of the run context, the declared branch
//! set, and (for tool-using stages) the run's tool session. The reasoner
//! must answer with exactly one declared branch or fail — it never returns
//! a bare answer with no handoff.

use async_trait::async_trait;

use crate::error::ReasonerError;
use crate::pipeline::stage::{BranchSpec, Stage, StageResult};
use crate::traits::tools::ToolSession;
use crate::types::context::ScreenContext;

/// One stage invocation's inputs.
pub struct StageRequest<'a> {
    /// The stage being invoked.
    pub stage: Stage,

    /// Rendered instruction prompt for this stage.
    pub prompt: String,

    /// Read-only snapshot of the run's context.
    pub context: &'a ScreenContext,

    /// Branches the reasoner may choose between.
    pub branches: &'static [BranchSpec],

    /// Tool session for stages that drive external capabilities.
    pub tools: Option<&'a dyn ToolSession>,
}

/// The external reasoning service.
///
/// Implementations wrap a specific LLM provider and handle prompting,
/// tool routing, and structured-output parsing. The scripted
/// [`MockReasoner`](crate::testing::MockReasoner) implements this for
/// tests.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Run one stage of reasoning.
    ///
    /// Fails with [`ReasonerError`] on timeout, tool-invocation error, or
    /// schema-validation failure of its own output.
    async fn invoke(&self, request: StageRequest<'_>) -> Result<StageResult, ReasonerError>;
}
