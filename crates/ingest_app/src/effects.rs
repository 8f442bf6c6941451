use std::sync::{mpsc, Arc};

use ingest_core::{AnalysisResultKind, Dimensions, Effect, FileDescriptor, Msg, Status};
use ingest_engine::{
    Analyzer, Clock, EngineError, EngineEvent, EngineHandle, EngineParts, IngestFile,
    PipelineSettings, ProgressSink, SimulatedAnalyzer, Stage, TokioClock,
};
use ingest_logging::{ingest_info, ingest_warn};

use crate::app::AppEvent;

/// Forwards engine events into the app's message channel, in emission order.
struct MsgSink {
    tx: mpsc::Sender<AppEvent>,
}

impl ProgressSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(AppEvent::Msg(map_event(event)));
    }
}

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(
        settings: PipelineSettings,
        tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self, EngineError> {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock);
        let analyzer: Arc<dyn Analyzer> =
            Arc::new(SimulatedAnalyzer::new(clock.clone(), settings.analysis_delay));
        let engine = EngineHandle::spawn(EngineParts {
            settings,
            clock,
            analyzer,
            sink: Arc::new(MsgSink { tx }),
        })?;
        Ok(Self { engine })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartPipeline { id, file } => {
                    ingest_info!(
                        "StartPipeline id={} name={:?} size={}",
                        id,
                        file.name,
                        file.size_bytes
                    );
                    self.engine.submit(id, to_ingest_file(file));
                }
                Effect::CancelPipeline { id } => {
                    ingest_info!("CancelPipeline id={}", id);
                    self.engine.cancel(id);
                }
            }
        }
    }
}

fn to_ingest_file(file: FileDescriptor) -> IngestFile {
    IngestFile {
        name: file.name,
        size_bytes: file.size_bytes,
        mime_hint: file.mime_hint,
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress(progress) => Msg::StageChanged {
            id: progress.record_id,
            status: map_stage(progress.stage),
            progress: progress.progress,
        },
        EngineEvent::Finished { record_id, result } => Msg::AnalysisFinished {
            id: record_id,
            result: match result {
                Ok(outcome) => AnalysisResultKind::Completed(Dimensions {
                    rows: outcome.rows,
                    columns: outcome.columns,
                }),
                Err(err) => {
                    ingest_warn!("Record {} failed: {}", record_id, err);
                    AnalysisResultKind::Failed
                }
            },
        },
    }
}

fn map_stage(stage: Stage) -> Status {
    match stage {
        Stage::Transferring => Status::Transferring,
        Stage::Analyzing => Status::Analyzing,
    }
}
