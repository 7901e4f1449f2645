//! Import Engine
//!
//! Copies external files into category directories and records each copy in
//! the ledger.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::category::{classify_path, CategoryId, CategoryStore};
use crate::error::{Result, SortifyError};
use crate::ledger::{FileRecord, Ledger};

/// Callback type for per-file progress reporting: `(tag, file name)` where
/// tag is one of `OK`, `SKIP`, `FAIL`.
pub type FileCallback<'a> = Option<&'a dyn Fn(&str, &str)>;

/// Decides whether an existing destination file may be overwritten.
pub type ConflictCallback<'a> = &'a mut dyn FnMut(&ImportConflict<'_>) -> bool;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportMode {
    /// Each file goes to the category its extension maps to
    ByExtension,
    /// Every file goes to the named category under "All Downloads"
    SingleCategory(String),
}

/// An import whose destination file already exists
#[derive(Debug)]
pub struct ImportConflict<'a> {
    pub source: &'a Path,
    pub destination: &'a Path,
    pub category: &'a str,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    /// Destinations written, in import order
    pub destinations: Vec<PathBuf>,
    /// One `CopyFailure` per file that could not be imported
    pub failures: Vec<SortifyError>,
}

impl ImportReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

pub struct ImportEngine<'a> {
    store: &'a mut CategoryStore,
    ledger: &'a mut Ledger,
}

impl<'a> ImportEngine<'a> {
    pub fn new(store: &'a mut CategoryStore, ledger: &'a mut Ledger) -> Self {
        Self { store, ledger }
    }

    /// Import `files` according to `mode`.
    ///
    /// Per-file problems are collected in the report and the remaining files
    /// continue. The ledger is saved once at the end if anything was
    /// imported; a save failure is returned as the error.
    pub fn run(
        &mut self,
        files: &[PathBuf],
        mode: &ImportMode,
        on_conflict: ConflictCallback<'_>,
        on_file: FileCallback<'_>,
    ) -> Result<ImportReport> {
        let fixed_target = match mode {
            ImportMode::ByExtension => None,
            ImportMode::SingleCategory(name) => {
                let id = self
                    .store
                    .resolve(name)
                    .ok_or_else(|| SortifyError::CategoryNotFound { name: name.clone() })?;
                Some(self.target(id)?)
            }
        };

        let mut report = ImportReport::default();

        for source in files {
            let target = match &fixed_target {
                Some(t) => t.clone(),
                None => {
                    let label = classify_path(source);
                    match self
                        .store
                        .ensure_predefined(label)
                        .and_then(|id| self.target(id))
                    {
                        Ok(t) => t,
                        Err(e) => {
                            fail(&mut report, source, e.to_string(), on_file);
                            continue;
                        }
                    }
                }
            };
            self.import_one(source, &target, on_conflict, on_file, &mut report);
        }

        if report.imported > 0 {
            self.ledger.save()?;
        }
        info!(
            imported = report.imported,
            skipped = report.skipped,
            failed = report.failed(),
            "import finished"
        );
        Ok(report)
    }

    fn target(&self, id: CategoryId) -> Result<Target> {
        let name = self
            .store
            .get(id)
            .map(|n| n.name.clone())
            .ok_or_else(|| SortifyError::CategoryNotFound {
                name: id.to_string(),
            })?;
        let dir = self.store.ensure_dir(id)?;
        Ok(Target { name, dir })
    }

    fn import_one(
        &mut self,
        source: &Path,
        target: &Target,
        on_conflict: ConflictCallback<'_>,
        on_file: FileCallback<'_>,
        report: &mut ImportReport,
    ) {
        let Some(file_name) = source.file_name().map(|n| n.to_string_lossy().to_string()) else {
            fail(report, source, "path has no file name".to_string(), on_file);
            return;
        };
        if !source.is_file() {
            fail(report, source, "not a regular file".to_string(), on_file);
            return;
        }

        let destination = target.dir.join(&file_name);
        if destination.exists() {
            if is_same_file(source, &destination) {
                fail(
                    report,
                    source,
                    "source and destination are the same file".to_string(),
                    on_file,
                );
                return;
            }

            let conflict = ImportConflict {
                source,
                destination: &destination,
                category: &target.name,
            };
            if !on_conflict(&conflict) {
                debug!(file = %file_name, category = %target.name, "kept existing file");
                if let Some(f) = on_file {
                    f("SKIP", &file_name);
                }
                report.skipped += 1;
                return;
            }
        }

        match fs::copy(source, &destination) {
            Ok(bytes) => {
                self.ledger.append(FileRecord::imported(
                    &file_name,
                    bytes,
                    &target.name,
                    &destination,
                ));
                debug!(file = %file_name, category = %target.name, bytes, "imported");
                if let Some(f) = on_file {
                    f("OK", &file_name);
                }
                report.imported += 1;
                report.destinations.push(destination);
            }
            Err(e) => fail(report, source, e.to_string(), on_file),
        }
    }
}

#[derive(Debug, Clone)]
struct Target {
    name: String,
    dir: PathBuf,
}

fn fail(report: &mut ImportReport, source: &Path, message: String, on_file: FileCallback<'_>) {
    let err = SortifyError::CopyFailure {
        file: source.to_path_buf(),
        message,
    };
    warn!("{}", err);
    if let Some(f) = on_file {
        f("FAIL", &source.display().to_string());
    }
    report.failures.push(err);
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// What the user picked in one round of the category prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChooserAction {
    Select(String),
    CreateNew,
    Cancel,
}

/// Outcome of [`choose_or_create`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryChoice {
    Selected(String),
    Created(String),
    Cancelled,
}

impl CategoryChoice {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Selected(n) | Self::Created(n) => Some(n),
            Self::Cancelled => None,
        }
    }
}

/// Prompting side of the "choose or create" interaction.
pub trait CategoryChooser {
    /// Pick one of `choices`, ask for a new category, or cancel.
    fn choose(&mut self, choices: &[String]) -> ChooserAction;

    /// Name for the new category; `None` abandons creation.
    fn new_name(&mut self) -> Option<String>;

    /// A selection or creation was rejected; the list is offered again.
    fn rejected(&mut self, _error: &SortifyError) {}
}

/// Let `chooser` select an existing import target or create one under
/// "All Downloads".
///
/// Abandoned or rejected creation re-offers the list instead of aborting;
/// only an explicit cancel on the list ends the interaction.
pub fn choose_or_create(
    store: &mut CategoryStore,
    chooser: &mut dyn CategoryChooser,
) -> Result<CategoryChoice> {
    loop {
        let choices = store.choices();
        match chooser.choose(&choices) {
            ChooserAction::Cancel => return Ok(CategoryChoice::Cancelled),
            ChooserAction::Select(name) => match store.resolve(&name) {
                Some(id) => {
                    let name = store.get(id).map(|n| n.name.clone()).unwrap_or(name);
                    return Ok(CategoryChoice::Selected(name));
                }
                None => chooser.rejected(&SortifyError::CategoryNotFound { name }),
            },
            ChooserAction::CreateNew => {
                let Some(name) = chooser.new_name() else {
                    continue;
                };
                if name.trim().is_empty() {
                    continue;
                }
                let downloads = store.downloads_group();
                match store.add_category(Some(downloads), &name) {
                    Ok(id) => {
                        let name = store
                            .get(id)
                            .map(|n| n.name.clone())
                            .unwrap_or_else(|| name.trim().to_string());
                        return Ok(CategoryChoice::Created(name));
                    }
                    Err(
                        e @ (SortifyError::DuplicateCategory { .. }
                        | SortifyError::InvalidCategoryName { .. }),
                    ) => chooser.rejected(&e),
                    Err(e) => return Err(e),
                }
            }
        }
    }
}
