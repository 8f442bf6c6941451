#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartPipeline {
        id: crate::RecordId,
        file: crate::FileDescriptor,
    },
    CancelPipeline { id: crate::RecordId },
}
