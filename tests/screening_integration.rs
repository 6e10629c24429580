//! Integration tests for the full screening flow.
//!
//! These drive the batch scheduler end to end with a scripted reasoner:
//! 1. Vet reachability
//! 2. Inspect the page
//! 3. Extract job data
//! 4. Score fit
//! 5. Summarize per URL, aggregate per batch

use std::sync::Arc;

use jobscreen::pipeline::{branch, Stage, StageResult, TransitionTable};
use jobscreen::report;
use jobscreen::testing::MockReasoner;
use jobscreen::traits::MockToolSessionFactory;
use jobscreen::types::{ErrorMessage, FitScore, JobDescription, StagePayload};
use jobscreen::{BatchConfig, BatchScheduler, PipelineEngine, ScreenContext, ScreenInputs};

fn scheduler(
    reasoner: MockReasoner,
    config: BatchConfig,
) -> BatchScheduler<MockReasoner, MockToolSessionFactory> {
    let engine = PipelineEngine::new(TransitionTable::job_screening()).unwrap();
    BatchScheduler::new(
        engine,
        Arc::new(reasoner),
        Arc::new(MockToolSessionFactory::new()),
        config,
    )
    .unwrap()
}

#[tokio::test]
async fn unreachable_url_never_reaches_extraction() {
    // Scenario: the URL fails reachability at the first stage.
    let reasoner = MockReasoner::new().on(
        Stage::UrlChecker,
        StageResult::branch(
            branch::UNREACHABLE,
            StagePayload::Error(ErrorMessage::new("HTTP 404")),
        ),
    );

    let engine = PipelineEngine::new(TransitionTable::job_screening()).unwrap();
    let record = engine
        .run(&reasoner, None, ScreenContext::new("https://gone.test/job"))
        .await
        .unwrap();

    assert!(record.failed);
    assert_eq!(record.fit_score, 0);
    assert_eq!(record.error_message.as_deref(), Some("HTTP 404"));
    assert!(!reasoner.invocations().contains(&Stage::Extractor));
}

#[tokio::test]
async fn successful_screening_carries_extraction_through_to_the_record() {
    // Scenario: full pipeline pass with concrete extraction and score.
    let reasoner = MockReasoner::new()
        .on(
            Stage::Extractor,
            StageResult::branch(
                branch::EXTRACTED,
                StagePayload::Job(JobDescription {
                    company: "Acme".into(),
                    title: "Engineer".into(),
                    description: "Ships Rust services.".into(),
                }),
            ),
        )
        .on(
            Stage::Screener,
            StageResult::branch(
                branch::SCORED,
                StagePayload::Fit(FitScore {
                    score: 4,
                    reason: "Strong skills match".into(),
                }),
            ),
        );

    let engine = PipelineEngine::new(TransitionTable::job_screening()).unwrap();
    let record = engine
        .run(&reasoner, None, ScreenContext::new("https://acme.test/job"))
        .await
        .unwrap();

    assert!(!record.failed);
    assert_eq!(record.fit_score, 4);
    assert_eq!(record.company, "Acme");
    assert_eq!(record.title, "Engineer");
    assert_eq!(record.reason, "Strong skills match");

    // The run walked the stages in order, exactly once each.
    assert_eq!(
        reasoner.invocations(),
        vec![
            Stage::UrlChecker,
            Stage::PageInspector,
            Stage::Extractor,
            Stage::Screener,
        ]
    );
}

#[tokio::test]
async fn five_urls_with_batch_size_two_come_back_in_input_order() {
    // Scenario: 3 chunks of sizes [2, 2, 1]; scheduler output preserves
    // input order even though runs within a chunk race.
    let urls: Vec<String> = (0..5).map(|i| format!("https://jobs.test/{i}")).collect();
    let scheduler = scheduler(MockReasoner::new(), BatchConfig::new().with_batch_size(2));

    let records = scheduler.run_batch(&urls).await.unwrap();

    assert_eq!(records.len(), 5);
    let returned: Vec<_> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(returned, urls.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn batch_isolation_one_poisoned_url_among_many() {
    let urls: Vec<String> = (0..7).map(|i| format!("https://jobs.test/{i}")).collect();

    // Same scenario at several batch sizes: always exactly one failure.
    for batch_size in [1, 3, 7] {
        let reasoner = MockReasoner::new().failing_for_url("https://jobs.test/4");
        let scheduler = scheduler(reasoner, BatchConfig::new().with_batch_size(batch_size));

        let records = scheduler.run_batch(&urls).await.unwrap();
        let failed: Vec<_> = records.iter().filter(|r| r.failed).collect();

        assert_eq!(records.len(), 7, "batch_size {batch_size}");
        assert_eq!(failed.len(), 1, "batch_size {batch_size}");
        assert_eq!(failed[0].url, "https://jobs.test/4");
    }
}

#[tokio::test]
async fn failed_runs_are_never_scored() {
    let reasoner = MockReasoner::new().failing_at(Stage::PageInspector, "page timed out");
    let engine = PipelineEngine::new(TransitionTable::job_screening()).unwrap();

    let record = engine
        .run(&reasoner, None, ScreenContext::new("https://slow.test/job"))
        .await
        .unwrap();

    assert!(record.failed);
    assert_eq!(record.fit_score, 0);
    assert!(!reasoner.invocations().contains(&Stage::Screener));
}

#[tokio::test]
async fn resume_and_preferences_reach_the_screener_prompt() {
    let reasoner = MockReasoner::new();
    let scheduler = scheduler(reasoner, BatchConfig::new().with_batch_size(1)).with_inputs(
        ScreenInputs::new()
            .with_resume("Ten years of Rust")
            .with_preferences("Remote only"),
    );

    let records = scheduler
        .run_batch(&["https://acme.test/job".to_string()])
        .await
        .unwrap();
    assert!(!records[0].failed);
}

#[tokio::test]
async fn report_over_a_mixed_batch() {
    let urls: Vec<String> = (0..6).map(|i| format!("https://jobs.test/{i}")).collect();
    let reasoner = MockReasoner::new()
        .with_default_score(4)
        .failing_for_url("https://jobs.test/1")
        .failing_for_url("https://jobs.test/5");
    let scheduler = scheduler(reasoner, BatchConfig::new().with_batch_size(3));

    let records = scheduler.run_batch(&urls).await.unwrap();
    let compiled = report::compile(&records);

    assert_eq!(compiled.total, 6);
    assert_eq!(compiled.success_count, 4);
    assert_eq!(compiled.failed_count, 2);
    assert_eq!(compiled.average_fit_score, 4.0);
    assert_eq!(compiled.high_fit, 4);
    assert_eq!(compiled.unreachable, 2);

    let text = compiled.render_text();
    assert!(text.contains("FAILURES"));
    assert!(text.contains("https://jobs.test/1"));
}

#[tokio::test]
async fn direct_wiring_skips_the_inspection_stage() {
    let reasoner = MockReasoner::new();
    let engine = PipelineEngine::new(TransitionTable::job_screening_direct()).unwrap();

    let record = engine
        .run(&reasoner, None, ScreenContext::new("https://acme.test/job"))
        .await
        .unwrap();

    assert!(!record.failed);
    assert_eq!(
        reasoner.invocations(),
        vec![Stage::UrlChecker, Stage::Extractor, Stage::Screener]
    );
}
