use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Status written by the import engine
pub const STATUS_IMPORTED: &str = "Imported";
/// Status swept by [`super::Ledger::remove_completed`]
pub const STATUS_COMPLETED: &str = "Completed";

const NOT_APPLICABLE: &str = "N/A";

/// One row of the ledger. Field order is the persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_name: String,
    pub size_label: String,
    pub status: String,
    pub time_left: String,
    pub transfer_rate: String,
    pub last_try_date: String,
    pub description: String,
    /// Storage location; not part of the user-facing columns
    pub absolute_path: String,
}

impl FileRecord {
    /// Record for a file copied into `category` at `destination`.
    pub fn imported(file_name: &str, size: u64, category: &str, destination: &Path) -> Self {
        Self {
            file_name: file_name.to_string(),
            size_label: size_label(size),
            status: STATUS_IMPORTED.to_string(),
            time_left: NOT_APPLICABLE.to_string(),
            transfer_rate: NOT_APPLICABLE.to_string(),
            last_try_date: Local::now().format("%Y-%m-%d %H:%M").to_string(),
            description: format!("Imported from local file | Category: {}", category),
            absolute_path: destination.display().to_string(),
        }
    }

    /// Record with only a name and a status; the remaining columns are "N/A"
    /// and the path is empty.
    pub fn new(file_name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            size_label: NOT_APPLICABLE.to_string(),
            status: status.into(),
            time_left: NOT_APPLICABLE.to_string(),
            transfer_rate: NOT_APPLICABLE.to_string(),
            last_try_date: NOT_APPLICABLE.to_string(),
            description: String::new(),
            absolute_path: String::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }

    /// Whether the record's path is `dir` itself or lies below it.
    pub fn is_under(&self, dir: &Path) -> bool {
        !self.absolute_path.is_empty() && Path::new(&self.absolute_path).starts_with(dir)
    }
}

/// Absolute form of `path`. Existing paths are canonicalized; others are
/// joined onto the current directory.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    match path.canonicalize() {
        Ok(resolved) => Ok(resolved),
        Err(_) if path.is_absolute() => Ok(path.to_path_buf()),
        Err(_) => Ok(std::env::current_dir()?.join(path)),
    }
}

pub fn size_label(bytes: u64) -> String {
    format!("{} bytes", bytes)
}
