//! The transition table: per-stage branch wiring and merge functions.
//!
//! A transition maps `(from stage, branch name)` to a target stage, the
//! payload kind the branch carries, and a pure merge function. Merge
//! functions are the only write path into [`ScreenContext`]; everything
//! else in the engine treats the context as read-only.
//!
//! Tables are validated for completeness at startup: an unregistered
//! branch is a fatal configuration error, never a runtime data error.

use indexmap::IndexMap;

use crate::error::{ConfigError, ConfigResult, PipelineError, Result};
use crate::pipeline::stage::{branch, PayloadKind, Stage};
use crate::types::context::ScreenContext;
use crate::types::payload::StagePayload;

/// Pure merge function applied on a handoff.
pub type MergeFn = fn(ScreenContext, StagePayload) -> Result<ScreenContext>;

/// One registered transition.
#[derive(Clone)]
pub struct Transition {
    /// The stage the branch hands off to.
    pub to: Stage,

    /// Payload kind the branch must carry.
    pub payload: PayloadKind,

    /// Merge function applied before entering `to`.
    pub merge: MergeFn,
}

/// The full wiring of a pipeline variant.
///
/// Construct with [`TransitionTable::job_screening`] (or a variant
/// constructor) and hand to `PipelineEngine::new`, which validates it.
#[derive(Clone)]
pub struct TransitionTable {
    entry: Stage,
    transitions: IndexMap<(Stage, &'static str), Transition>,
    failure_sinks: IndexMap<Stage, Stage>,
}

impl TransitionTable {
    /// Create an empty table with the given entry stage.
    pub fn new(entry: Stage) -> Self {
        Self {
            entry,
            transitions: IndexMap::new(),
            failure_sinks: IndexMap::new(),
        }
    }

    /// The stage a run starts at.
    pub fn entry(&self) -> Stage {
        self.entry
    }

    /// Register a transition.
    pub fn register(
        mut self,
        from: Stage,
        branch: &'static str,
        to: Stage,
        payload: PayloadKind,
        merge: MergeFn,
    ) -> Self {
        self.transitions
            .insert((from, branch), Transition { to, payload, merge });
        self
    }

    /// Register the failure sink for a stage.
    ///
    /// A generic `Failure` from that stage routes here with an
    /// `ErrorMessage` payload merged via [`merge_error`].
    pub fn with_failure_sink(mut self, from: Stage, sink: Stage) -> Self {
        self.failure_sinks.insert(from, sink);
        self
    }

    /// Look up the transition for a stage's branch.
    pub fn transition(&self, from: Stage, branch: &str) -> Option<&Transition> {
        // Branch names come back from the reasoner as owned strings, so
        // resolve through the stage's static declaration first.
        let spec = from.branch(branch)?;
        self.transitions.get(&(from, spec.name))
    }

    /// The failure sink registered for a stage, if any.
    pub fn failure_sink(&self, from: Stage) -> Option<Stage> {
        self.failure_sinks.get(&from).copied()
    }

    /// Every stage reachable from the entry via registered transitions.
    fn wired_stages(&self) -> Vec<Stage> {
        let mut stages = vec![self.entry];
        for ((from, _), t) in &self.transitions {
            for stage in [*from, t.to] {
                if !stages.contains(&stage) {
                    stages.push(stage);
                }
            }
        }
        stages
    }

    /// Check the table for completeness.
    ///
    /// Every declared branch of every wired stage must have a registered
    /// transition whose payload kind matches the declaration. This runs at
    /// startup so that a miswired table fails fast and loudly instead of
    /// surfacing as per-URL "failures" mid-batch.
    pub fn validate(&self) -> ConfigResult<()> {
        for stage in self.wired_stages() {
            for spec in stage.branches() {
                match self.transitions.get(&(stage, spec.name)) {
                    None => {
                        return Err(ConfigError::MissingTransition {
                            stage,
                            branch: spec.name,
                        })
                    }
                    Some(t) if t.payload != spec.payload => {
                        return Err(ConfigError::PayloadKindMismatch {
                            stage,
                            branch: spec.name,
                            declared: spec.payload,
                            registered: t.payload,
                        })
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// The standard five-stage screening wiring.
    ///
    /// vet -> inspect -> extract -> score -> summarize, with every
    /// non-terminal stage routed to the summarizer on failure. The
    /// extractor has no typed failure branch; its errors surface as
    /// generic failures and take the failure sink.
    pub fn job_screening() -> Self {
        Self::new(Stage::UrlChecker)
            .register(
                Stage::UrlChecker,
                branch::REACHABLE,
                Stage::PageInspector,
                PayloadKind::Url,
                merge_url,
            )
            .register(
                Stage::UrlChecker,
                branch::UNREACHABLE,
                Stage::Summarizer,
                PayloadKind::Error,
                merge_error,
            )
            .register(
                Stage::PageInspector,
                branch::IS_JOB_POSTING,
                Stage::Extractor,
                PayloadKind::Inspection,
                merge_inspection,
            )
            .register(
                Stage::PageInspector,
                branch::NOT_JOB_POSTING,
                Stage::Summarizer,
                PayloadKind::Error,
                merge_error,
            )
            .register(
                Stage::Extractor,
                branch::EXTRACTED,
                Stage::Screener,
                PayloadKind::Job,
                merge_job,
            )
            .register(
                Stage::Screener,
                branch::SCORED,
                Stage::Summarizer,
                PayloadKind::Fit,
                merge_fit,
            )
            .with_failure_sink(Stage::UrlChecker, Stage::Summarizer)
            .with_failure_sink(Stage::PageInspector, Stage::Summarizer)
            .with_failure_sink(Stage::Extractor, Stage::Summarizer)
            .with_failure_sink(Stage::Screener, Stage::Summarizer)
    }

    /// Variant without the inspection stage: vet -> extract -> score.
    ///
    /// Trusts the extractor to reject non-posting pages via a generic
    /// failure instead of a dedicated inspection pass.
    pub fn job_screening_direct() -> Self {
        Self::new(Stage::UrlChecker)
            .register(
                Stage::UrlChecker,
                branch::REACHABLE,
                Stage::Extractor,
                PayloadKind::Url,
                merge_url,
            )
            .register(
                Stage::UrlChecker,
                branch::UNREACHABLE,
                Stage::Summarizer,
                PayloadKind::Error,
                merge_error,
            )
            .register(
                Stage::Extractor,
                branch::EXTRACTED,
                Stage::Screener,
                PayloadKind::Job,
                merge_job,
            )
            .register(
                Stage::Screener,
                branch::SCORED,
                Stage::Summarizer,
                PayloadKind::Fit,
                merge_fit,
            )
            .with_failure_sink(Stage::UrlChecker, Stage::Summarizer)
            .with_failure_sink(Stage::Extractor, Stage::Summarizer)
            .with_failure_sink(Stage::Screener, Stage::Summarizer)
    }
}

fn merge_mismatch(expected: PayloadKind, got: &StagePayload) -> PipelineError {
    PipelineError::Merge {
        reason: format!("expected {expected:?} payload, got {:?}", got.kind()),
    }
}

/// Merge the reachability result: store the post-redirect URL.
pub fn merge_url(mut ctx: ScreenContext, payload: StagePayload) -> Result<ScreenContext> {
    match payload {
        StagePayload::Url(url) => {
            ctx.url = url.url;
            Ok(ctx)
        }
        other => Err(merge_mismatch(PayloadKind::Url, &other)),
    }
}

/// Merge the inspection result: bookkeeping only.
pub fn merge_inspection(mut ctx: ScreenContext, payload: StagePayload) -> Result<ScreenContext> {
    match payload {
        StagePayload::Inspection(inspection) => {
            ctx.inspection_passed = Some(inspection.is_job_posting);
            Ok(ctx)
        }
        other => Err(merge_mismatch(PayloadKind::Inspection, &other)),
    }
}

/// Merge extracted job data.
pub fn merge_job(mut ctx: ScreenContext, payload: StagePayload) -> Result<ScreenContext> {
    match payload {
        StagePayload::Job(job) => {
            ctx.company = Some(job.company);
            ctx.title = Some(job.title);
            ctx.job_description = Some(job.description);
            Ok(ctx)
        }
        other => Err(merge_mismatch(PayloadKind::Job, &other)),
    }
}

/// Merge the fit score and its reason.
pub fn merge_fit(mut ctx: ScreenContext, payload: StagePayload) -> Result<ScreenContext> {
    match payload {
        StagePayload::Fit(fit) => {
            ctx.fit_score = Some(fit.score.min(5));
            ctx.reason = Some(fit.reason);
            Ok(ctx)
        }
        other => Err(merge_mismatch(PayloadKind::Fit, &other)),
    }
}

/// The standard error merge: mark the run failed.
///
/// Used both by the typed failure branches (`unreachable`,
/// `not_job_posting`) and by the engine's synthetic failure-sink handoff.
pub fn merge_error(mut ctx: ScreenContext, payload: StagePayload) -> Result<ScreenContext> {
    match payload {
        StagePayload::Error(error) => {
            ctx.fail(error.message);
            Ok(ctx)
        }
        other => Err(merge_mismatch(PayloadKind::Error, &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::payload::{ErrorMessage, FitScore, JobDescription, UrlResult};

    #[test]
    fn standard_wiring_validates() {
        TransitionTable::job_screening().validate().unwrap();
    }

    #[test]
    fn direct_wiring_validates() {
        TransitionTable::job_screening_direct().validate().unwrap();
    }

    #[test]
    fn dangling_branch_is_a_config_error() {
        // Wire the checker's happy path into the inspector but forget
        // every inspector branch.
        let table = TransitionTable::new(Stage::UrlChecker)
            .register(
                Stage::UrlChecker,
                branch::REACHABLE,
                Stage::PageInspector,
                PayloadKind::Url,
                merge_url,
            )
            .register(
                Stage::UrlChecker,
                branch::UNREACHABLE,
                Stage::Summarizer,
                PayloadKind::Error,
                merge_error,
            );

        match table.validate() {
            Err(ConfigError::MissingTransition { stage, .. }) => {
                assert_eq!(stage, Stage::PageInspector);
            }
            other => panic!("expected MissingTransition, got {other:?}"),
        }
    }

    #[test]
    fn payload_kind_drift_is_a_config_error() {
        let table = TransitionTable::new(Stage::Screener).register(
            Stage::Screener,
            branch::SCORED,
            Stage::Summarizer,
            PayloadKind::Error, // declared kind is Fit
            merge_error,
        );

        assert!(matches!(
            table.validate(),
            Err(ConfigError::PayloadKindMismatch { .. })
        ));
    }

    #[test]
    fn merge_error_sets_failed_and_keeps_it() {
        let ctx = ScreenContext::new("https://example.com/job");
        let ctx = merge_error(ctx, StagePayload::Error(ErrorMessage::new("404"))).unwrap();
        assert!(ctx.failed);

        // A later merge must not clear the failure.
        let ctx = merge_fit(
            ctx,
            StagePayload::Fit(FitScore {
                score: 5,
                reason: "n/a".into(),
            }),
        )
        .unwrap();
        assert!(ctx.failed);
        assert_eq!(ctx.effective_fit_score(), 0);
    }

    #[test]
    fn merge_url_stores_redirected_url() {
        let ctx = ScreenContext::new("https://example.com/job");
        let ctx = merge_url(
            ctx,
            StagePayload::Url(UrlResult {
                url: "https://example.com/careers/job".into(),
                status_code: 200,
                reachable: true,
            }),
        )
        .unwrap();
        assert_eq!(ctx.url, "https://example.com/careers/job");
    }

    #[test]
    fn merge_job_stores_all_fields() {
        let ctx = ScreenContext::new("https://example.com/job");
        let ctx = merge_job(
            ctx,
            StagePayload::Job(JobDescription {
                company: "Acme".into(),
                title: "Engineer".into(),
                description: "Builds things".into(),
            }),
        )
        .unwrap();
        assert_eq!(ctx.company.as_deref(), Some("Acme"));
        assert_eq!(ctx.title.as_deref(), Some("Engineer"));
        assert_eq!(ctx.job_description.as_deref(), Some("Builds things"));
    }

    #[test]
    fn merge_rejects_wrong_payload_kind() {
        let ctx = ScreenContext::new("https://example.com/job");
        let result = merge_fit(ctx, StagePayload::Error(ErrorMessage::new("oops")));
        assert!(result.is_err());
    }

    #[test]
    fn merge_fit_clamps_score_to_five() {
        let ctx = ScreenContext::new("https://example.com/job");
        let ctx = merge_fit(
            ctx,
            StagePayload::Fit(FitScore {
                score: 9,
                reason: "overenthusiastic".into(),
            }),
        )
        .unwrap();
        assert_eq!(ctx.fit_score, Some(5));
    }
}
