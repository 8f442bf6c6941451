use crate::{FileRecord, RecordId, Status};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionStats {
    pub accepted: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub files: Vec<FileRowView>,
    pub total: usize,
    pub queued: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub failed: usize,
    pub last_submission: Option<SubmissionStats>,
    pub dirty: bool,
}

impl AppViewModel {
    /// The cleaning summary panel is only shown once something has completed.
    pub fn show_summary(&self) -> bool {
        self.completed > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub id: RecordId,
    pub name: String,
    pub size_label: String,
    pub status: Status,
    pub status_label: &'static str,
    /// Present only while the progress bar is visible.
    pub progress: Option<u8>,
    pub rows: Option<u64>,
    pub columns: Option<u32>,
}

impl FileRowView {
    pub(crate) fn from_record(record: &FileRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            size_label: format_file_size(record.size_bytes),
            status: record.status,
            status_label: status_label(record.status),
            progress: record.status.is_in_flight().then_some(record.progress),
            rows: record.row_count,
            columns: record.column_count,
        }
    }
}

pub fn status_label(status: Status) -> &'static str {
    match status {
        Status::Queued => "Queued",
        Status::Transferring => "Uploading...",
        Status::Analyzing => "Processing...",
        Status::Completed => "Completed",
        Status::Failed => "Failed",
    }
}

/// `512 B`, `1.5 KB`, `2.0 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}
