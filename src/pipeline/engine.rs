//! The pipeline engine: drives one URL through the stage machine.
//!
//! The loop is strictly sequential — at most one reasoner invocation is in
//! flight per run — and every per-run error is folded into a failed
//! [`SummaryRecord`] at the top of [`PipelineEngine::run`]. The only error
//! that escapes a run is a [`ConfigError`], which indicates a miswired
//! table and is allowed to halt the whole batch.

use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use crate::error::{ConfigError, ConfigResult, PipelineError, Result};
use crate::pipeline::prompts::prompt_for;
use crate::pipeline::stage::{Stage, StageResult};
use crate::pipeline::transitions::TransitionTable;
use crate::traits::reasoner::{Reasoner, StageRequest};
use crate::traits::tools::ToolSession;
use crate::types::context::ScreenContext;
use crate::types::payload::{ErrorMessage, StagePayload};
use crate::types::summary::SummaryRecord;

/// Default step budget.
///
/// The standard wiring needs four reasoner invocations; the budget only
/// exists as a backstop against a miswired variant looping.
const DEFAULT_MAX_STEPS: usize = 8;

/// Drives one pipeline run from entry stage to summary.
#[derive(Clone)]
pub struct PipelineEngine {
    table: TransitionTable,
    max_steps: usize,
}

impl PipelineEngine {
    /// Create an engine over a transition table.
    ///
    /// Validates the table for completeness; a dangling branch aborts
    /// startup rather than surfacing as per-URL failures mid-batch.
    pub fn new(table: TransitionTable) -> ConfigResult<Self> {
        table.validate()?;
        Ok(Self {
            table,
            max_steps: DEFAULT_MAX_STEPS,
        })
    }

    /// Override the per-run step budget.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// The table this engine runs.
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Run one URL through the pipeline.
    ///
    /// Always produces a record: reasoner errors, tool errors, payload
    /// mismatches, and budget exhaustion all become `failed = true`
    /// records. Only configuration errors propagate.
    pub async fn run(
        &self,
        reasoner: &dyn Reasoner,
        session: Option<&dyn ToolSession>,
        context: ScreenContext,
    ) -> ConfigResult<SummaryRecord> {
        let run_id = Uuid::new_v4();
        let url = context.url.clone();
        let span = tracing::info_span!("screen", %run_id, url = %url);

        match self
            .step_loop(reasoner, session, context)
            .instrument(span)
            .await
        {
            Ok(record) => Ok(record),
            Err(PipelineError::Config(e)) => Err(e),
            Err(e) => {
                warn!(url = %url, error = %e, "run failed outside the failure sink");
                Ok(SummaryRecord::failure(url, e.to_string()))
            }
        }
    }

    async fn step_loop(
        &self,
        reasoner: &dyn Reasoner,
        session: Option<&dyn ToolSession>,
        mut ctx: ScreenContext,
    ) -> Result<SummaryRecord> {
        let mut stage = self.table.entry();
        let mut steps = 0usize;

        while !stage.is_terminal() {
            steps += 1;
            if steps > self.max_steps {
                return Err(PipelineError::StepBudgetExhausted {
                    stage,
                    steps: steps - 1,
                });
            }

            let request = StageRequest {
                stage,
                prompt: prompt_for(stage, &ctx),
                context: &ctx,
                branches: stage.branches(),
                tools: if stage.uses_tools() { session } else { None },
            };

            // A reasoner error is handled like an explicit Failure result:
            // both route through the failure sink so the record keeps the
            // URL and whatever the earlier stages already established.
            let outcome = match reasoner.invoke(request).await {
                Ok(outcome) => outcome,
                Err(e) => StageResult::Failure {
                    message: e.to_string(),
                },
            };

            let outcome = self.validate_outcome(stage, outcome);

            let failure = match outcome {
                StageResult::Branch { branch, payload } => {
                    let transition = self.table.transition(stage, &branch).ok_or(
                        // Declared branch without a transition: unreachable
                        // after validate(), but never silently swallowed.
                        ConfigError::MissingTransition {
                            stage,
                            // Lookup succeeded in validate_outcome, so the
                            // static name exists.
                            branch: stage.branch(&branch).map(|b| b.name).unwrap_or("?"),
                        },
                    )?;

                    // The merge consumes the context, so keep a copy to
                    // fall back on if it rejects the payload.
                    match (transition.merge)(ctx.clone(), payload) {
                        Ok(merged) => {
                            debug!(%stage, %branch, to = %transition.to, "handoff");
                            ctx = merged;
                            stage = transition.to;
                            continue;
                        }
                        Err(e) => e.to_string(),
                    }
                }
                StageResult::Failure { message } => message,
            };

            // A rejected merge and an explicit failure route the same way:
            // through the failure sink, keeping whatever the earlier stages
            // already established in the context.
            match self.table.failure_sink(stage) {
                Some(sink) => {
                    debug!(%stage, to = %sink, error = %failure, "failure handoff");
                    ctx = crate::pipeline::transitions::merge_error(
                        ctx,
                        StagePayload::Error(ErrorMessage::new(failure)),
                    )?;
                    stage = sink;
                }
                None => {
                    // No sink registered for this stage: abort the run
                    // with whatever context we have.
                    warn!(%stage, error = %failure, "failure with no sink registered");
                    ctx.fail(failure);
                    return Ok(SummaryRecord::from_context(&ctx));
                }
            }
        }

        Ok(SummaryRecord::from_context(&ctx))
    }

    /// Check a branch outcome against the stage's declarations.
    ///
    /// An undeclared branch name or a payload of the wrong kind is
    /// reasoner misbehavior, not a configuration error: it is downgraded
    /// to a `Failure` and takes the failure sink.
    fn validate_outcome(&self, stage: Stage, outcome: StageResult) -> StageResult {
        let StageResult::Branch { branch, payload } = outcome else {
            return outcome;
        };

        let Some(spec) = stage.branch(&branch) else {
            return StageResult::failure(
                PipelineError::UndeclaredBranch {
                    stage,
                    branch: branch.clone(),
                }
                .to_string(),
            );
        };

        if payload.kind() != spec.payload {
            return StageResult::failure(
                PipelineError::PayloadMismatch {
                    stage,
                    branch,
                    expected: spec.payload,
                    got: payload.kind(),
                }
                .to_string(),
            );
        }

        StageResult::Branch { branch, payload }
    }
}
