//! Batch scheduler: fans URLs out to independent pipeline runs.
//!
//! URLs are partitioned into consecutive chunks of `batch_size`; within a
//! chunk runs execute concurrently, each with a private context and a
//! fresh tool session; chunks themselves are strictly sequential. That
//! chunk boundary is the only backpressure mechanism — at most
//! `batch_size` tool sessions are ever open — and the only checkpoint for
//! the early-stop threshold, so no in-flight cancellation is needed.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::pipeline::engine::PipelineEngine;
use crate::traits::reasoner::Reasoner;
use crate::traits::searcher::JobSearcher;
use crate::traits::tools::ToolSessionFactory;
use crate::types::config::{BatchConfig, ScreenInputs};
use crate::types::context::ScreenContext;
use crate::types::summary::SummaryRecord;

/// Schedules pipeline runs over a URL list or a paged search source.
pub struct BatchScheduler<R, F> {
    engine: PipelineEngine,
    reasoner: Arc<R>,
    sessions: Arc<F>,
    inputs: ScreenInputs,
    config: BatchConfig,
}

impl<R, F> BatchScheduler<R, F>
where
    R: Reasoner + 'static,
    F: ToolSessionFactory + 'static,
{
    /// Create a scheduler. Validates the batch config at startup.
    pub fn new(
        engine: PipelineEngine,
        reasoner: Arc<R>,
        sessions: Arc<F>,
        config: BatchConfig,
    ) -> ConfigResult<Self> {
        config.validate()?;
        let engine = engine.with_max_steps(config.max_steps);
        Ok(Self {
            engine,
            reasoner,
            sessions,
            inputs: ScreenInputs::default(),
            config,
        })
    }

    /// Attach per-run inputs (resume, preferences).
    pub fn with_inputs(mut self, inputs: ScreenInputs) -> Self {
        self.inputs = inputs;
        self
    }

    /// Screen an explicit URL list.
    ///
    /// Records come back in input order, one per scheduled URL. URLs past
    /// the success threshold's chunk are never scheduled and produce no
    /// record.
    pub async fn run_batch(&self, urls: &[String]) -> ConfigResult<Vec<SummaryRecord>> {
        let limit = self.config.top_n.unwrap_or(urls.len()).min(urls.len());
        let urls = &urls[..limit];

        let mut records = Vec::with_capacity(urls.len());
        let mut successes = 0usize;
        self.run_chunks(urls, &mut records, &mut successes).await?;
        Ok(records)
    }

    /// Screen URLs pulled page-by-page from a search provider.
    ///
    /// Pulls one page per iteration and feeds it through the same chunk
    /// logic, until the provider returns an empty page or the success
    /// threshold is met. A provider error stops the pull but keeps the
    /// records gathered so far.
    pub async fn run_search(
        &self,
        searcher: &dyn JobSearcher,
        query: &str,
    ) -> ConfigResult<Vec<SummaryRecord>> {
        let mut records = Vec::new();
        let mut successes = 0usize;
        let mut pageno = 1usize;
        let mut scheduled = 0usize;

        loop {
            if self.threshold_met(successes) {
                break;
            }

            let mut page = match searcher.search_page(query, pageno).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(pageno, error = %e, "search provider failed; stopping pull");
                    break;
                }
            };
            if page.is_empty() {
                info!(pageno, "search provider exhausted");
                break;
            }

            if let Some(top_n) = self.config.top_n {
                let remaining = top_n.saturating_sub(scheduled);
                page.truncate(remaining);
                if page.is_empty() {
                    break;
                }
            }
            scheduled += page.len();

            self.run_chunks(&page, &mut records, &mut successes).await?;
            pageno += 1;
        }

        Ok(records)
    }

    /// Feed URLs through sequential chunks, updating the success count.
    ///
    /// Stops scheduling once the threshold is met; the chunk in which the
    /// threshold is crossed still completes in full.
    async fn run_chunks(
        &self,
        urls: &[String],
        records: &mut Vec<SummaryRecord>,
        successes: &mut usize,
    ) -> ConfigResult<()> {
        for chunk in urls.chunks(self.config.batch_size) {
            if self.threshold_met(*successes) {
                info!(
                    successes = *successes,
                    "success threshold met; not scheduling further chunks"
                );
                break;
            }

            let handles: Vec<_> = chunk
                .iter()
                .map(|url| {
                    let engine = self.engine.clone();
                    let reasoner = Arc::clone(&self.reasoner);
                    let sessions = Arc::clone(&self.sessions);
                    let context = self.fresh_context(url);
                    tokio::spawn(screen_one(engine, reasoner, sessions, context))
                })
                .collect();

            for (url, handle) in chunk.iter().zip(join_all(handles).await) {
                let record = match handle {
                    Ok(result) => result?,
                    // Defensive second layer: a panicking run becomes a
                    // failed record instead of aborting the batch.
                    Err(e) => {
                        warn!(url = %url, error = %e, "run task panicked");
                        SummaryRecord::failure(url.clone(), format!("run task failed: {e}"))
                    }
                };
                if !record.failed {
                    *successes += 1;
                }
                records.push(record);
            }
            info!(
                processed = records.len(),
                successes = *successes,
                "chunk complete"
            );
        }
        Ok(())
    }

    fn threshold_met(&self, successes: usize) -> bool {
        self.config
            .desired_success_count
            .map(|k| successes >= k)
            .unwrap_or(false)
    }

    fn fresh_context(&self, url: &str) -> ScreenContext {
        let mut ctx = ScreenContext::new(url);
        ctx.resume = self.inputs.resume.clone();
        ctx.preferences = self.inputs.preferences.clone();
        ctx
    }
}

/// Run one URL with a freshly provisioned tool session.
///
/// The session is dropped (torn down) when the run completes, so nothing
/// is ever shared across concurrent runs. A provisioning failure becomes
/// a failed record, not a batch error.
async fn screen_one<R, F>(
    engine: PipelineEngine,
    reasoner: Arc<R>,
    sessions: Arc<F>,
    context: ScreenContext,
) -> ConfigResult<SummaryRecord>
where
    R: Reasoner,
    F: ToolSessionFactory,
{
    let url = context.url.clone();
    let session = match sessions.open().await {
        Ok(session) => session,
        Err(e) => {
            warn!(url = %url, error = %e, "could not provision tool session");
            return Ok(SummaryRecord::failure(
                url,
                format!("tool session unavailable: {e}"),
            ));
        }
    };

    engine
        .run(reasoner.as_ref(), Some(session.as_ref()), context)
        .await
}

/// Convenience: `ConfigError` when the URL list is empty in a context
/// that requires one.
pub fn require_urls(urls: &[String]) -> ConfigResult<()> {
    if urls.is_empty() {
        return Err(ConfigError::InvalidBatch {
            reason: "no URLs to screen".into(),
        });
    }
    Ok(())
}
