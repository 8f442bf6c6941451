//! Ingest core: file record store, pure state machine and view-model helpers.
mod effect;
mod msg;
mod policy;
mod record;
mod state;
mod store;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use policy::{RejectReason, SubmissionPolicy, DEFAULT_MAX_SIZE_BYTES};
pub use record::{Dimensions, FileDescriptor, FileRecord, RecordId, RecordPatch, Status};
pub use state::{AnalysisResultKind, AppState, Notice};
pub use store::{FileStore, StoreError};
pub use update::update;
pub use view_model::{format_file_size, status_label, AppViewModel, FileRowView, SubmissionStats};
