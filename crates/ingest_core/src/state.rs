use ingest_logging::{ingest_debug, ingest_info};

use crate::view_model::{AppViewModel, FileRowView, SubmissionStats};
use crate::{
    Dimensions, FileDescriptor, FileRecord, FileStore, RecordId, RecordPatch, RejectReason,
    Status, StoreError, SubmissionPolicy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisResultKind {
    Completed(Dimensions),
    Failed,
}

/// Toast-style message for the presentation layer, drained with [`AppState::take_notices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Processed { name: String },
    Failed { name: String },
    Rejected { name: String, reason: RejectReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    store: FileStore,
    policy: SubmissionPolicy,
    last_submission: Option<SubmissionStats>,
    notices: Vec<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: SubmissionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn policy(&self) -> &SubmissionPolicy {
        &self.policy
    }

    pub fn view(&self) -> AppViewModel {
        let files: Vec<FileRowView> = self.store.iter().map(FileRowView::from_record).collect();
        let count = |pred: fn(Status) -> bool| files.iter().filter(|f| pred(f.status)).count();
        AppViewModel {
            total: files.len(),
            queued: count(|s| s == Status::Queued),
            in_flight: count(Status::is_in_flight),
            completed: count(|s| s == Status::Completed),
            failed: count(|s| s == Status::Failed),
            files,
            last_submission: self.last_submission.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Whether any record still has pipeline work ahead of it.
    pub fn has_pending_work(&self) -> bool {
        self.store.iter().any(|record| !record.status.is_terminal())
    }

    /// Validates and stores each file; returns the accepted ones with their new ids.
    pub(crate) fn submit_files(
        &mut self,
        files: Vec<FileDescriptor>,
    ) -> Vec<(RecordId, FileDescriptor)> {
        let mut accepted = Vec::with_capacity(files.len());
        let mut rejected = 0usize;

        for file in files {
            let added = self.policy.check(&file).and_then(|()| {
                self.store
                    .add(file.clone())
                    .map_err(|StoreError::DuplicateName(_)| RejectReason::DuplicateName)
            });
            match added {
                Ok(id) => accepted.push((id, file)),
                Err(reason) => {
                    ingest_info!("Rejected submission name={:?}: {}", file.name, reason);
                    rejected += 1;
                    self.notices.push(Notice::Rejected {
                        name: file.name,
                        reason,
                    });
                }
            }
        }

        self.last_submission = Some(SubmissionStats {
            accepted: accepted.len(),
            rejected,
        });
        self.mark_dirty();
        accepted
    }

    pub(crate) fn remove_file(&mut self, name: &str) -> Option<FileRecord> {
        let removed = self.store.remove(name)?;
        ingest_debug!(
            "Removed record id={} name={:?} status={:?}",
            removed.id,
            removed.name,
            removed.status
        );
        self.mark_dirty();
        Some(removed)
    }

    pub(crate) fn clear_finished(&mut self) -> Vec<FileRecord> {
        let removed = self.store.remove_where(|record| record.status.is_terminal());
        if !removed.is_empty() {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn apply_stage(&mut self, id: RecordId, status: Status, progress: Option<u8>) {
        if self.store.apply(id, RecordPatch::stage(status, progress)) {
            self.mark_dirty();
        } else {
            ingest_debug!("Ignored stage update id={} status={:?}", id, status);
        }
    }

    pub(crate) fn apply_finished(&mut self, id: RecordId, result: AnalysisResultKind) {
        let patch = match result {
            AnalysisResultKind::Completed(dims) => RecordPatch::completed(dims),
            AnalysisResultKind::Failed => RecordPatch::failed(),
        };
        if !self.store.apply(id, patch) {
            ingest_debug!("Ignored analysis result for id={}", id);
            return;
        }
        if let Some(record) = self.store.get_by_id(id) {
            let name = record.name.clone();
            self.notices.push(match result {
                AnalysisResultKind::Completed(_) => Notice::Processed { name },
                AnalysisResultKind::Failed => Notice::Failed { name },
            });
        }
        self.mark_dirty();
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
