use std::time::Duration;

use thiserror::Error;

pub type RecordId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transferring,
    Analyzing,
}

/// A file handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_hint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageProgress {
    pub record_id: RecordId,
    pub stage: Stage,
    /// Transfer percentage; `None` for stages without a progress signal.
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub rows: u64,
    pub columns: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(StageProgress),
    Finished {
        record_id: RecordId,
        result: Result<AnalysisOutcome, AnalysisError>,
    },
}

impl EngineEvent {
    pub fn record_id(&self) -> RecordId {
        match self {
            EngineEvent::Progress(progress) => progress.record_id,
            EngineEvent::Finished { record_id, .. } => *record_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("{name} is empty; nothing to analyze")]
    EmptyFile { name: String },
    #[error("analysis did not finish within {after:?}")]
    Timeout { after: Duration },
    #[error("analysis failed: {0}")]
    Other(String),
}

impl AnalysisError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AnalysisError::Timeout { .. } => FailureKind::AnalysisTimeout,
            AnalysisError::EmptyFile { .. } | AnalysisError::Other(_) => FailureKind::AnalysisFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    AnalysisFailed,
    AnalysisTimeout,
}
