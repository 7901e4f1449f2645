//! Record Ledger
//!
//! Ordered list of [`FileRecord`]s and its persisted JSON form. Mutations do
//! not save on their own; callers call [`Ledger::save`] once per batch.

mod record;

pub use record::{resolve_path, size_label, FileRecord, STATUS_COMPLETED, STATUS_IMPORTED};

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, SortifyError};

#[derive(Debug, Clone)]
pub struct Ledger {
    records: Vec<FileRecord>,
    path: PathBuf,
}

impl Ledger {
    /// Empty ledger persisted at `path`
    pub fn new(path: &Path) -> Self {
        Self {
            records: Vec::new(),
            path: path.to_path_buf(),
        }
    }

    /// Load the ledger from `path`.
    ///
    /// A missing file gives an empty ledger. An unreadable or corrupt file is
    /// moved aside to `<path>.corrupt` when possible, reported as a warning,
    /// and the ledger starts empty.
    pub fn load(path: &Path) -> (Self, Option<String>) {
        let mut ledger = Self::new(path);

        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return (ledger, None),
            Err(e) => {
                let err = SortifyError::persistence(path, e);
                warn!("{}", err);
                return (ledger, Some(err.to_string()));
            }
        };

        // Non-UTF-8 content counts as corrupt
        match serde_json::from_slice::<Vec<FileRecord>>(&content) {
            Ok(records) => {
                debug!(count = records.len(), path = %path.display(), "loaded ledger");
                ledger.records = records;
                (ledger, None)
            }
            Err(e) => {
                let backup = corrupt_backup_path(path);
                let mut message = format!("Ledger {} is corrupt ({}), starting empty", path.display(), e);
                if fs::rename(path, &backup).is_ok() {
                    message.push_str(&format!("; kept a copy at {}", backup.display()));
                }
                warn!("{}", message);
                (ledger, Some(message))
            }
        }
    }

    /// Rewrite the whole persisted file.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SortifyError::persistence(parent, e))?;
        }
        let content = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, content).map_err(|e| SortifyError::persistence(&self.path, e))?;
        debug!(count = self.records.len(), path = %self.path.display(), "saved ledger");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FileRecord> {
        self.records.get(index)
    }

    pub fn append(&mut self, record: FileRecord) {
        self.records.push(record);
    }

    pub fn remove_at(&mut self, index: usize) -> Result<FileRecord> {
        if index >= self.records.len() {
            return Err(SortifyError::RecordIndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(index))
    }

    /// Remove the rows at `indices` (any order, duplicates allowed).
    /// Validates every index first so a bad one leaves the ledger untouched.
    pub fn remove_indices(&mut self, indices: &[usize]) -> Result<usize> {
        let unique: BTreeSet<usize> = indices.iter().copied().collect();
        if let Some(&bad) = unique.iter().find(|i| **i >= self.records.len()) {
            return Err(SortifyError::RecordIndexOutOfRange {
                index: bad,
                len: self.records.len(),
            });
        }
        for index in unique.iter().rev() {
            self.records.remove(*index);
        }
        Ok(unique.len())
    }

    /// Remove every record matching `predicate`; returns how many went.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&FileRecord) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|r| !predicate(r));
        before - self.records.len()
    }

    /// Remove records stored at `dir` or anywhere below it.
    pub fn remove_under(&mut self, dir: &Path) -> usize {
        self.remove_where(|r| r.is_under(dir))
    }

    /// Number of records stored at `dir` or below it.
    pub fn count_under(&self, dir: &Path) -> usize {
        self.records.iter().filter(|r| r.is_under(dir)).count()
    }

    /// Remove every record whose status is exactly "Completed".
    pub fn remove_completed(&mut self) -> usize {
        self.remove_where(FileRecord::is_completed)
    }
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}
