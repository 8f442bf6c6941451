use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use ingest_engine::{
    run_pipeline, simulated_shape, AnalysisError, AnalysisOutcome, Analyzer, Clock, EngineEvent,
    FailureKind, IngestFile, PipelineContext, PipelineOutcome, PipelineSettings, ProgressSink,
    RecordId, SimulatedAnalyzer, Stage, StageProgress, TokioClock,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Records requested sleeps and only yields, so pipelines finish without waiting.
#[derive(Default)]
struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

#[async_trait::async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

struct NeverAnalyzer;

#[async_trait::async_trait]
impl Analyzer for NeverAnalyzer {
    async fn analyze(&self, _file: &IngestFile) -> Result<AnalysisOutcome, AnalysisError> {
        std::future::pending().await
    }
}

fn init_logging() {
    ingest_logging::initialize_for_tests();
}

fn csv(name: &str, size_bytes: u64) -> IngestFile {
    IngestFile {
        name: name.to_string(),
        size_bytes,
        mime_hint: "text/csv".to_string(),
    }
}

fn context(settings: PipelineSettings, sink: Arc<TestSink>) -> PipelineContext {
    let clock: Arc<dyn Clock> = Arc::new(TokioClock);
    let analyzer = Arc::new(SimulatedAnalyzer::new(clock.clone(), settings.analysis_delay));
    PipelineContext::new(settings, clock, analyzer, sink)
}

fn progress(record_id: RecordId, stage: Stage, progress: Option<u8>) -> EngineEvent {
    EngineEvent::Progress(StageProgress {
        record_id,
        stage,
        progress,
    })
}

fn is_finished(event: &EngineEvent) -> bool {
    matches!(event, EngineEvent::Finished { .. })
}

#[tokio::test(start_paused = true)]
async fn single_file_runs_every_stage_in_order() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let ctx = context(PipelineSettings::default(), sink.clone());

    let outcome = run_pipeline(&ctx, 1, &csv("a.csv", 1024), &CancellationToken::new()).await;
    assert_eq!(outcome, PipelineOutcome::Finished);

    let mut expected: Vec<_> = (0..=100)
        .step_by(10)
        .map(|p| progress(1, Stage::Transferring, Some(p as u8)))
        .collect();
    expected.push(progress(1, Stage::Analyzing, None));
    expected.push(EngineEvent::Finished {
        record_id: 1,
        result: Ok(simulated_shape("a.csv", 1024)),
    });
    assert_eq!(sink.events(), expected);

    let shape = simulated_shape("a.csv", 1024);
    assert!(shape.rows > 0);
    assert!(shape.columns > 0);
}

#[tokio::test(start_paused = true)]
async fn empty_file_fails_during_analysis() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let ctx = context(PipelineSettings::default(), sink.clone());

    run_pipeline(&ctx, 7, &csv("empty.csv", 0), &CancellationToken::new()).await;

    let events = sink.events();
    assert_eq!(events[events.len() - 2], progress(7, Stage::Analyzing, None));
    match events.last() {
        Some(EngineEvent::Finished {
            record_id: 7,
            result: Err(err),
        }) => {
            assert_eq!(err.kind(), FailureKind::AnalysisFailed);
            assert!(matches!(err, AnalysisError::EmptyFile { .. }));
        }
        other => panic!("unexpected last event {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_transfer_stops_all_updates() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let ctx = context(PipelineSettings::default(), sink.clone());
    let cancel = CancellationToken::new();

    let task = {
        let ctx = ctx.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { run_pipeline(&ctx, 3, &csv("a.csv", 1024), &cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(350)).await;
    cancel.cancel();
    assert_eq!(task.await.unwrap(), PipelineOutcome::Cancelled);

    let seen = sink.events();
    assert!(!seen.is_empty());
    assert!(seen
        .iter()
        .all(|e| matches!(e, EngineEvent::Progress(p) if p.stage == Stage::Transferring
            && p.progress.unwrap_or(0) < 100)));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(sink.events(), seen);
}

#[tokio::test(start_paused = true)]
async fn concurrent_files_interleave() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let ctx = context(PipelineSettings::default(), sink.clone());
    let cancel = CancellationToken::new();
    let a = csv("a.csv", 1024);
    let b = csv("b.csv", 2048);

    let outcomes = tokio::join!(
        run_pipeline(&ctx, 1, &a, &cancel),
        run_pipeline(&ctx, 2, &b, &cancel),
    );
    assert_eq!(outcomes, (PipelineOutcome::Finished, PipelineOutcome::Finished));

    let events = sink.events();
    let finished: Vec<_> = events.iter().filter(|e| is_finished(e)).collect();
    assert_eq!(finished.len(), 2);

    // b starts transferring long before a finishes.
    let first_b = events.iter().position(|e| e.record_id() == 2).unwrap();
    let last_a_transfer = events
        .iter()
        .rposition(|e| e.record_id() == 1 && matches!(e, EngineEvent::Progress(p) if p.stage == Stage::Transferring))
        .unwrap();
    assert!(first_b < last_a_transfer);

    for id in [1, 2] {
        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                EngineEvent::Progress(p) if p.record_id == id => p.progress,
                _ => None,
            })
            .collect();
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(progress.last(), Some(&100));
    }
}

#[tokio::test(start_paused = true)]
async fn many_files_all_reach_a_terminal_state() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let ctx = context(PipelineSettings::default(), sink.clone());
    let cancel = CancellationToken::new();
    let files: Vec<_> = (0..20u64)
        .map(|i| csv(&format!("file-{i}.csv"), i * 100))
        .collect();

    let outcomes = join_all(
        files
            .iter()
            .enumerate()
            .map(|(i, file)| run_pipeline(&ctx, i as RecordId + 1, file, &cancel)),
    )
    .await;
    assert!(outcomes.iter().all(|o| *o == PipelineOutcome::Finished));

    let events = sink.events();
    for id in 1..=20 {
        let terminal = events
            .iter()
            .filter(|e| e.record_id() == id && is_finished(e))
            .count();
        assert_eq!(terminal, 1, "record {id}");
    }
    // file-0.csv has zero bytes.
    assert!(events.iter().any(|e| matches!(
        e,
        EngineEvent::Finished {
            record_id: 1,
            result: Err(_)
        }
    )));
}

#[tokio::test(start_paused = true)]
async fn analysis_timeout_fails_the_record() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let settings = PipelineSettings {
        analysis_timeout: Some(Duration::from_secs(5)),
        ..PipelineSettings::default()
    };
    let ctx = PipelineContext::new(
        settings,
        Arc::new(TokioClock),
        Arc::new(NeverAnalyzer),
        sink.clone(),
    );

    run_pipeline(&ctx, 1, &csv("a.csv", 1024), &CancellationToken::new()).await;

    assert_eq!(
        sink.events().last(),
        Some(&EngineEvent::Finished {
            record_id: 1,
            result: Err(AnalysisError::Timeout {
                after: Duration::from_secs(5)
            }),
        })
    );
}

#[tokio::test(start_paused = true)]
async fn analysis_without_timeout_stays_analyzing() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let ctx = PipelineContext::new(
        PipelineSettings::default(),
        Arc::new(TokioClock),
        Arc::new(NeverAnalyzer),
        sink.clone(),
    );

    let waited = tokio::time::timeout(
        Duration::from_secs(3600),
        run_pipeline(&ctx, 1, &csv("a.csv", 1024), &CancellationToken::new()),
    )
    .await;
    assert!(waited.is_err());
    assert_eq!(sink.events().last(), Some(&progress(1, Stage::Analyzing, None)));
}

#[tokio::test(start_paused = true)]
async fn concurrency_cap_keeps_later_files_queued() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let settings = PipelineSettings {
        max_concurrent: Some(1),
        ..PipelineSettings::default()
    };
    let ctx = context(settings, sink.clone());
    let cancel = CancellationToken::new();
    let a = csv("a.csv", 1024);
    let b = csv("b.csv", 1024);

    tokio::join!(
        run_pipeline(&ctx, 1, &a, &cancel),
        run_pipeline(&ctx, 2, &b, &cancel),
    );

    let events = sink.events();
    let a_done = events
        .iter()
        .position(|e| e.record_id() == 1 && is_finished(e))
        .unwrap();
    let b_start = events.iter().position(|e| e.record_id() == 2).unwrap();
    assert!(a_done < b_start);
}

#[tokio::test(start_paused = true)]
async fn cancel_while_waiting_for_a_slot_emits_nothing() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let settings = PipelineSettings {
        max_concurrent: Some(1),
        ..PipelineSettings::default()
    };
    let ctx = context(settings, sink.clone());
    let first_cancel = CancellationToken::new();
    let waiting_cancel = CancellationToken::new();

    let first = {
        let ctx = ctx.clone();
        let cancel = first_cancel.clone();
        tokio::spawn(async move { run_pipeline(&ctx, 1, &csv("a.csv", 1024), &cancel).await })
    };
    let waiting = {
        let ctx = ctx.clone();
        let cancel = waiting_cancel.clone();
        tokio::spawn(async move { run_pipeline(&ctx, 2, &csv("b.csv", 1024), &cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, EngineEvent::Progress(p) if p.record_id == 1
            && p.stage == Stage::Transferring)));
    waiting_cancel.cancel();

    assert_eq!(waiting.await.unwrap(), PipelineOutcome::Cancelled);
    assert_eq!(first.await.unwrap(), PipelineOutcome::Finished);

    let events = sink.events();
    assert!(events.iter().all(|e| e.record_id() == 1));
    assert!(events.last().is_some_and(is_finished));
}

#[tokio::test]
async fn injected_clock_sees_every_suspension_point() {
    init_logging();
    let sink = Arc::new(TestSink::default());
    let clock = Arc::new(RecordingClock::default());
    let settings = PipelineSettings {
        progress_step: 30,
        ..PipelineSettings::default()
    };
    let analyzer = Arc::new(SimulatedAnalyzer::new(clock.clone(), settings.analysis_delay));
    let ctx = PipelineContext::new(settings, clock.clone(), analyzer, sink.clone());

    run_pipeline(&ctx, 1, &csv("a.csv", 1024), &CancellationToken::new()).await;

    let transfer: Vec<u8> = sink
        .events()
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Progress(p) if p.stage == Stage::Transferring => p.progress,
            _ => None,
        })
        .collect();
    assert_eq!(transfer, vec![0, 30, 60, 90, 100]);

    let sleeps = clock.sleeps.lock().unwrap().clone();
    let mut expected = vec![Duration::from_millis(100); 4];
    expected.push(Duration::from_millis(1500));
    assert_eq!(sleeps, expected);
}

#[test]
fn simulated_shape_is_deterministic_and_in_range() {
    for (name, size) in [("a.csv", 1024), ("b.xlsx", 1), ("sales.xls", 9_999_999)] {
        let shape = simulated_shape(name, size);
        assert_eq!(shape, simulated_shape(name, size));
        assert!((500..=5499).contains(&shape.rows));
        assert!((5..=14).contains(&shape.columns));
    }
}
