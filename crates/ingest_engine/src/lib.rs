//! Ingest engine: asynchronous per-file pipeline and its worker thread.
mod analyze;
mod clock;
mod engine;
mod pipeline;
mod settings;
mod types;

pub use analyze::{simulated_shape, Analyzer, SimulatedAnalyzer};
pub use clock::{Clock, TokioClock};
pub use engine::{EngineError, EngineHandle, EngineParts};
pub use pipeline::{run_pipeline, ChannelProgressSink, PipelineContext, PipelineOutcome, ProgressSink};
pub use settings::PipelineSettings;
pub use types::{
    AnalysisError, AnalysisOutcome, EngineEvent, FailureKind, IngestFile, RecordId, Stage,
    StageProgress,
};
