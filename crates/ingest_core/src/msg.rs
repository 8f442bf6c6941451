#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User dropped or picked files.
    FilesSubmitted(Vec<crate::FileDescriptor>),
    /// User clicked the remove button on a row.
    RemoveClicked { name: String },
    /// User asked to drop every finished row.
    ClearFinished,
    /// Pipeline moved a record to `status`, optionally with new transfer progress.
    StageChanged {
        id: crate::RecordId,
        status: crate::Status,
        progress: Option<u8>,
    },
    /// Pipeline finished analysis for a record.
    AnalysisFinished {
        id: crate::RecordId,
        result: crate::AnalysisResultKind,
    },
    /// Render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
