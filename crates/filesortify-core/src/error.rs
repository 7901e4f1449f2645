use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SortifyError {
    #[error("A category named '{name}' already exists here")]
    DuplicateCategory { name: String },

    #[error("Cannot delete '{name}': {reason}")]
    DeleteForbidden { name: String, reason: &'static str },

    #[error("Category not found: {name}")]
    CategoryNotFound { name: String },

    #[error("Invalid category name: '{name}' - must be non-empty, single-line, without path separators")]
    InvalidCategoryName { name: String },

    #[error("Failed to delete {path} ({} path(s) already removed): {source}", .removed.len())]
    PartialDeleteFailure {
        path: PathBuf,
        removed: Vec<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to import {file}: {message}")]
    CopyFailure { file: PathBuf, message: String },

    #[error("Record index {index} out of range (ledger has {len} record(s))")]
    RecordIndexOutOfRange { index: usize, len: usize },

    #[error("Failed to access {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error in {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value '{value}' for {key}")]
    ConfigValue { key: String, value: String },

    #[error("Home directory not found")]
    HomeNotFound,

    #[error("Worker stopped: {0}")]
    Worker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SortifyError>;

impl SortifyError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DuplicateCategory { .. } => 2,
            Self::DeleteForbidden { .. } => 3,
            Self::CategoryNotFound { .. } => 4,
            Self::InvalidCategoryName { .. } => 5,
            Self::PartialDeleteFailure { .. } => 6,
            Self::CopyFailure { .. } => 7,
            Self::RecordIndexOutOfRange { .. } => 8,
            Self::Persistence { .. } => 9,
            _ => 1,
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}
