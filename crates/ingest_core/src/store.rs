use thiserror::Error;

use crate::{FileDescriptor, FileRecord, RecordId, RecordPatch};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("a file named {0:?} is already tracked")]
    DuplicateName(String),
}

/// In-memory collection of file records, kept in insertion order.
///
/// Names are unique among the records currently held. Ids are never reused,
/// so an update addressed to a removed record cannot land on a newer record
/// that happens to share its name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileStore {
    records: Vec<FileRecord>,
    next_id: RecordId,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: FileDescriptor) -> Result<RecordId, StoreError> {
        if self.contains(&file.name) {
            return Err(StoreError::DuplicateName(file.name));
        }
        self.next_id += 1;
        let id = self.next_id;
        self.records.push(FileRecord::queued(id, file));
        Ok(id)
    }

    /// Merges `patch` into the record called `name`. Missing records are ignored.
    pub fn update(&mut self, name: &str, patch: RecordPatch) -> bool {
        self.records
            .iter_mut()
            .find(|record| record.name == name)
            .is_some_and(|record| record.merge(&patch))
    }

    /// Merges `patch` into the record with `id`. Missing records are ignored.
    pub fn apply(&mut self, id: RecordId, patch: RecordPatch) -> bool {
        self.records
            .iter_mut()
            .find(|record| record.id == id)
            .is_some_and(|record| record.merge(&patch))
    }

    pub fn remove(&mut self, name: &str) -> Option<FileRecord> {
        let pos = self.records.iter().position(|record| record.name == name)?;
        Some(self.records.remove(pos))
    }

    /// Removes every record matching `predicate`, returning them in store order.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&FileRecord) -> bool) -> Vec<FileRecord> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.records).into_iter().partition(|r| predicate(r));
        self.records = kept;
        removed
    }

    pub fn list(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    pub fn get_by_id(&self, id: RecordId) -> Option<&FileRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
