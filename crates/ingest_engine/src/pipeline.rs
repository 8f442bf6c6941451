use std::sync::Arc;

use ingest_logging::{ingest_debug, ingest_info, ingest_warn};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::{
    AnalysisError, Analyzer, Clock, EngineEvent, IngestFile, PipelineSettings, RecordId, Stage,
    StageProgress,
};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Finished,
    Cancelled,
}

/// Everything a single file's pipeline needs; shared by all pipelines of one engine.
#[derive(Clone)]
pub struct PipelineContext {
    pub settings: PipelineSettings,
    pub clock: Arc<dyn Clock>,
    pub analyzer: Arc<dyn Analyzer>,
    pub sink: Arc<dyn ProgressSink>,
    permits: Option<Arc<Semaphore>>,
}

impl PipelineContext {
    pub fn new(
        settings: PipelineSettings,
        clock: Arc<dyn Clock>,
        analyzer: Arc<dyn Analyzer>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        let permits = settings
            .max_concurrent
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));
        Self {
            settings,
            clock,
            analyzer,
            sink,
            permits,
        }
    }

    fn emit_stage(&self, record_id: RecordId, stage: Stage, progress: Option<u8>) {
        ingest_debug!(
            "record_id={} stage={:?} progress={:?}",
            record_id,
            stage,
            progress
        );
        self.sink.emit(EngineEvent::Progress(StageProgress {
            record_id,
            stage,
            progress,
        }));
    }
}

/// Drives one file from transfer through analysis.
///
/// Every event is emitted before the next suspension point. Once `cancel` fires
/// the pipeline returns at its next suspension point without emitting anything else.
pub async fn run_pipeline(
    ctx: &PipelineContext,
    record_id: RecordId,
    file: &IngestFile,
    cancel: &CancellationToken,
) -> PipelineOutcome {
    let _permit = match &ctx.permits {
        Some(permits) => {
            let acquired = tokio::select! {
                biased;
                _ = cancel.cancelled() => return cancelled(record_id),
                permit = permits.clone().acquire_owned() => permit,
            };
            match acquired {
                Ok(permit) => Some(permit),
                Err(_) => return cancelled(record_id),
            }
        }
        None => None,
    };
    if cancel.is_cancelled() {
        return cancelled(record_id);
    }

    let step = ctx.settings.effective_step();
    let mut progress = 0u8;
    ctx.emit_stage(record_id, Stage::Transferring, Some(progress));

    while progress < 100 {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return cancelled(record_id),
            _ = ctx.clock.sleep(ctx.settings.tick_interval) => {}
        }
        progress = progress.saturating_add(step).min(100);
        ctx.emit_stage(record_id, Stage::Transferring, Some(progress));
    }

    ctx.emit_stage(record_id, Stage::Analyzing, None);

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return cancelled(record_id),
        result = analyze_with_timeout(ctx, file) => result,
    };

    match &result {
        Ok(outcome) => ingest_info!(
            "record_id={} name={:?} analyzed rows={} columns={}",
            record_id,
            file.name,
            outcome.rows,
            outcome.columns
        ),
        Err(err) => ingest_warn!(
            "record_id={} name={:?} analysis failed ({:?}): {}",
            record_id,
            file.name,
            err.kind(),
            err
        ),
    }
    ctx.sink.emit(EngineEvent::Finished { record_id, result });
    PipelineOutcome::Finished
}

async fn analyze_with_timeout(
    ctx: &PipelineContext,
    file: &IngestFile,
) -> Result<crate::AnalysisOutcome, AnalysisError> {
    match ctx.settings.analysis_timeout {
        Some(after) => tokio::select! {
            result = ctx.analyzer.analyze(file) => result,
            _ = ctx.clock.sleep(after) => Err(AnalysisError::Timeout { after }),
        },
        None => ctx.analyzer.analyze(file).await,
    }
}

fn cancelled(record_id: RecordId) -> PipelineOutcome {
    ingest_info!("record_id={} pipeline cancelled", record_id);
    PipelineOutcome::Cancelled
}
