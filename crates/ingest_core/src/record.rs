pub type RecordId = u64;

/// What the presentation layer knows about a file at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub mime_hint: String,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, size_bytes: u64, mime_hint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_hint: mime_hint.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Queued,
    Transferring,
    Analyzing,
    Completed,
    Failed,
}

impl Status {
    /// Position along Queued -> Transferring -> Analyzing -> terminal.
    /// Both terminal states share the last rank.
    fn rank(self) -> u8 {
        match self {
            Status::Queued => 0,
            Status::Transferring => 1,
            Status::Analyzing => 2,
            Status::Completed | Status::Failed => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, Status::Transferring | Status::Analyzing)
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic: at most one
    /// stage forward, never backward. Staying put is allowed for non-terminal stages
    /// (repeated progress ticks).
    pub fn can_advance_to(self, next: Status) -> bool {
        if self.is_terminal() {
            return false;
        }
        let (from, to) = (self.rank(), next.rank());
        to == from || to == from + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub rows: u64,
    pub columns: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: RecordId,
    pub name: String,
    pub size_bytes: u64,
    pub mime_hint: String,
    pub status: Status,
    pub progress: u8,
    pub row_count: Option<u64>,
    pub column_count: Option<u32>,
}

impl FileRecord {
    pub(crate) fn queued(id: RecordId, file: FileDescriptor) -> Self {
        Self {
            id,
            name: file.name,
            size_bytes: file.size_bytes,
            mime_hint: file.mime_hint,
            status: Status::Queued,
            progress: 0,
            row_count: None,
            column_count: None,
        }
    }

    /// Merges `patch` while holding the lifecycle invariants; returns whether anything changed.
    pub(crate) fn merge(&mut self, patch: &RecordPatch) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        let next_status = match patch.status {
            Some(next) if !self.status.can_advance_to(next) => return false,
            // Completed always carries the analyzed dimensions.
            Some(Status::Completed) if patch.dimensions.is_none() => return false,
            Some(next) if next != self.status => Some(next),
            _ => None,
        };

        let mut changed = false;

        if let Some(progress) = patch.progress {
            let clamped = progress.min(100).max(self.progress);
            if clamped != self.progress {
                self.progress = clamped;
                changed = true;
            }
        }

        if let Some(next) = next_status {
            self.status = next;
            changed = true;
        }

        if let Some(dims) = patch.dimensions {
            if self.status == Status::Completed {
                self.row_count = Some(dims.rows);
                self.column_count = Some(dims.columns);
                changed = true;
            }
        }

        changed
    }
}

/// Partial update merged into a [`FileRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordPatch {
    pub status: Option<Status>,
    pub progress: Option<u8>,
    pub dimensions: Option<Dimensions>,
}

impl RecordPatch {
    pub fn stage(status: Status, progress: Option<u8>) -> Self {
        Self {
            status: Some(status),
            progress,
            dimensions: None,
        }
    }

    pub fn completed(dimensions: Dimensions) -> Self {
        Self {
            status: Some(Status::Completed),
            progress: Some(100),
            dimensions: Some(dimensions),
        }
    }

    pub fn failed() -> Self {
        Self {
            status: Some(Status::Failed),
            progress: None,
            dimensions: None,
        }
    }
}
