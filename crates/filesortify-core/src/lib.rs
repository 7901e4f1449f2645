pub mod category;
pub mod config;
pub mod delete;
pub mod error;
pub mod import;
pub mod ledger;
pub mod organizer;
pub mod worker;

pub use category::{
    classify, classify_path, CategoryId, CategoryKind, CategoryNode, CategoryStore, CategoryTree,
    Predefined, ALL_DOWNLOADS, BUILTIN_CATEGORIES, PLACEHOLDER,
};
pub use config::{Config, ConflictPolicy, Layout};
pub use delete::{DeleteReport, DeletionCoordinator, DeletionPlan};
pub use error::{Result, SortifyError};
pub use import::{
    choose_or_create, CategoryChoice, CategoryChooser, ChooserAction, ConflictCallback,
    FileCallback, ImportConflict, ImportEngine, ImportMode, ImportReport,
};
pub use ledger::{resolve_path, FileRecord, Ledger, STATUS_COMPLETED, STATUS_IMPORTED};
pub use organizer::Organizer;
pub use worker::{Snapshot, Worker, WorkerHandle};
