//! Organizer
//!
//! Single-writer facade over one [`CategoryStore`] and one [`Ledger`]. Front
//! ends talk to this type (directly or through [`crate::worker`]) rather than
//! to the import engine or deletion coordinator.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::category::{CategoryId, CategoryStore};
use crate::config::{Config, Layout};
use crate::delete::{DeleteReport, DeletionCoordinator, DeletionPlan};
use crate::error::{Result, SortifyError};
use crate::import::{
    choose_or_create, CategoryChoice, CategoryChooser, ConflictCallback, FileCallback,
    ImportEngine, ImportMode, ImportReport,
};
use crate::ledger::{resolve_path, FileRecord, Ledger};

#[derive(Debug)]
pub struct Organizer {
    store: CategoryStore,
    ledger: Ledger,
    layout: Layout,
    warnings: Vec<String>,
}

impl Organizer {
    /// Open the organizer rooted at `base_dir`, resolved to an absolute path.
    ///
    /// Only failing to create or resolve `base_dir` is an error. Problems with the
    /// persisted category list or ledger are collected in [`warnings`] and
    /// the affected state starts empty.
    ///
    /// [`warnings`]: Organizer::warnings
    pub fn open(base_dir: &Path, config: &Config) -> Result<Self> {
        fs::create_dir_all(base_dir).map_err(|e| SortifyError::persistence(base_dir, e))?;
        let base_dir =
            resolve_path(base_dir).map_err(|e| SortifyError::persistence(base_dir, e))?;
        let layout = config.layout(&base_dir);

        let (store, mut warnings) = CategoryStore::load(&layout.base_dir, &layout.categories_file);
        let (ledger, ledger_warning) = Ledger::load(&layout.records_file);
        warnings.extend(ledger_warning);

        if !warnings.is_empty() {
            warn!(count = warnings.len(), "loaded with warnings");
        }
        info!(
            base = %layout.base_dir.display(),
            custom = store.custom_names().len(),
            records = ledger.len(),
            "opened organizer"
        );

        Ok(Self {
            store,
            ledger,
            layout,
            warnings,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn base_dir(&self) -> &Path {
        &self.layout.base_dir
    }

    /// Problems found while loading persisted state
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn categories(&self) -> &CategoryStore {
        &self.store
    }

    pub fn records(&self) -> &[FileRecord] {
        self.ledger.records()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Find a category by name: file categories under "All Downloads" first,
    /// then top-level folders, then anywhere in the tree.
    pub fn find_category(&self, name: &str) -> Option<CategoryId> {
        self.store
            .resolve(name)
            .or_else(|| {
                self.store
                    .tree()
                    .child_by_name(None, name.trim())
                    .filter(|id| self.store.dir_of(*id).is_some())
            })
            .or_else(|| self.store.find_by_name(name))
    }

    /// Disk path of the category called `name`
    pub fn category_dir(&self, name: &str) -> Result<PathBuf> {
        self.find_category(name)
            .and_then(|id| self.store.dir_of(id))
            .ok_or_else(|| SortifyError::CategoryNotFound {
                name: name.to_string(),
            })
    }

    /// Append `record` and persist the ledger.
    pub fn add_record(&mut self, record: FileRecord) -> Result<()> {
        info!(file = %record.file_name, status = %record.status, "adding record");
        self.ledger.append(record);
        self.ledger.save()
    }

    /// Create a category under `parent`; `None` makes a top-level folder.
    pub fn add_category(&mut self, parent: Option<CategoryId>, name: &str) -> Result<CategoryId> {
        self.store.add_category(parent, name)
    }

    /// Create a file category under "All Downloads".
    pub fn add_file_category(&mut self, name: &str) -> Result<CategoryId> {
        let downloads = self.store.downloads_group();
        self.store.add_category(Some(downloads), name)
    }

    pub fn import_files(
        &mut self,
        files: &[PathBuf],
        mode: &ImportMode,
        on_conflict: ConflictCallback<'_>,
        on_file: FileCallback<'_>,
    ) -> Result<ImportReport> {
        ImportEngine::new(&mut self.store, &mut self.ledger).run(files, mode, on_conflict, on_file)
    }

    pub fn choose_or_create(&mut self, chooser: &mut dyn CategoryChooser) -> Result<CategoryChoice> {
        choose_or_create(&mut self.store, chooser)
    }

    /// What deleting `id` would remove, for confirmation prompts
    pub fn plan_delete(&mut self, id: CategoryId) -> Result<DeletionPlan> {
        DeletionCoordinator::new(&mut self.store, &mut self.ledger).plan(id)
    }

    /// Carry out a plan from [`Organizer::plan_delete`].
    pub fn execute_delete(&mut self, plan: DeletionPlan) -> Result<DeleteReport> {
        DeletionCoordinator::new(&mut self.store, &mut self.ledger).execute(plan)
    }

    pub fn delete_category(&mut self, id: CategoryId) -> Result<DeleteReport> {
        DeletionCoordinator::new(&mut self.store, &mut self.ledger).delete_category(id)
    }

    pub fn delete_category_named(&mut self, name: &str) -> Result<DeleteReport> {
        let id = self
            .find_category(name)
            .ok_or_else(|| SortifyError::CategoryNotFound {
                name: name.to_string(),
            })?;
        self.delete_category(id)
    }

    /// Remove the given ledger rows and persist. An empty selection is a
    /// no-op; a bad index removes nothing.
    pub fn delete_records(&mut self, indices: &[usize]) -> Result<usize> {
        if indices.is_empty() {
            return Ok(0);
        }
        let removed = self.ledger.remove_indices(indices)?;
        info!(removed, "deleted records");
        self.ledger.save()?;
        Ok(removed)
    }

    /// Drop every "Completed" record; persists only when something changed.
    pub fn remove_completed(&mut self) -> Result<usize> {
        let removed = self.ledger.remove_completed();
        if removed > 0 {
            info!(removed, "cleaned completed records");
            self.ledger.save()?;
        }
        Ok(removed)
    }

    /// Write both persisted files. Both are attempted; the first error wins.
    pub fn flush(&self) -> Result<()> {
        let store = self.store.save();
        let ledger = self.ledger.save();
        store.and(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::STATUS_COMPLETED;
    use tempfile::TempDir;

    fn open(tmp: &TempDir) -> Organizer {
        Organizer::open(tmp.path(), &Config::default()).unwrap()
    }

    /// `path` spelled relative to the current directory (`../..` up to the root)
    fn relative_to_cwd(path: &Path) -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        let mut rel = PathBuf::new();
        for _ in cwd.ancestors().skip(1) {
            rel.push("..");
        }
        rel.join(path.strip_prefix("/").unwrap())
    }

    #[test]
    fn test_open_creates_base_and_reports_corrupt_ledger() {
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("nested/base");
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("downloads.json"), "[{]").unwrap();

        let organizer = Organizer::open(&base, &Config::default()).unwrap();
        assert_eq!(organizer.warnings().len(), 1);
        assert!(organizer.records().is_empty());
    }

    #[test]
    fn test_custom_file_names_from_config() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.set("storage.records_file", "ledger.json").unwrap();

        let mut organizer = Organizer::open(tmp.path(), &config).unwrap();
        organizer
            .add_record(FileRecord::new("x.iso", "Queued"))
            .unwrap();
        assert!(tmp.path().join("ledger.json").is_file());
        assert!(!tmp.path().join("downloads.json").exists());
    }

    #[test]
    fn test_delete_records_empty_and_out_of_range() {
        let tmp = TempDir::new().unwrap();
        let mut organizer = open(&tmp);
        organizer.add_record(FileRecord::new("a", "Imported")).unwrap();

        assert_eq!(organizer.delete_records(&[]).unwrap(), 0);
        assert!(matches!(
            organizer.delete_records(&[0, 1]),
            Err(SortifyError::RecordIndexOutOfRange { index: 1, .. })
        ));
        assert_eq!(organizer.records().len(), 1);

        assert_eq!(organizer.delete_records(&[0, 0]).unwrap(), 1);
        let reopened = open(&tmp);
        assert!(reopened.records().is_empty());
    }

    #[test]
    fn test_remove_completed_twice() {
        let tmp = TempDir::new().unwrap();
        let mut organizer = open(&tmp);
        organizer
            .add_record(FileRecord::new("done.iso", STATUS_COMPLETED))
            .unwrap();
        organizer
            .add_record(FileRecord::new("queued.iso", "Queued"))
            .unwrap();

        assert_eq!(organizer.remove_completed().unwrap(), 1);
        assert_eq!(organizer.remove_completed().unwrap(), 0);
        assert_eq!(open(&tmp).records().len(), 1);
    }

    #[test]
    fn test_delete_category_named_and_lookup() {
        let tmp = TempDir::new().unwrap();
        let mut organizer = open(&tmp);
        organizer.add_category(None, "Projects").unwrap();
        organizer.add_file_category("Games").unwrap();

        let base = organizer.base_dir().to_path_buf();
        assert_eq!(organizer.category_dir("projects").unwrap(), base.join("Projects"));
        assert_eq!(
            organizer.category_dir("GAMES").unwrap(),
            base.join("All Downloads/Games")
        );

        let report = organizer.delete_category_named("games").unwrap();
        assert_eq!(report.category, "Games");
        assert!(matches!(
            organizer.delete_category_named("Games"),
            Err(SortifyError::CategoryNotFound { .. })
        ));
        assert!(matches!(
            organizer.delete_category_named("Queues"),
            Err(SortifyError::DeleteForbidden { .. })
        ));
    }

    #[test]
    fn test_relative_base_cascades_across_spellings() {
        let tmp = TempDir::new().unwrap();
        let inbox = tmp.path().join("inbox");
        fs::create_dir_all(&inbox).unwrap();
        let clip = inbox.join("clip.mp4");
        fs::write(&clip, "mp4").unwrap();

        let rel = relative_to_cwd(tmp.path()).join("base");

        let dotted = Path::new(".").join(&rel);
        let mut organizer = Organizer::open(&dotted, &Config::default()).unwrap();
        assert!(organizer.base_dir().is_absolute());
        organizer
            .import_files(&[clip], &ImportMode::ByExtension, &mut |_| true, None)
            .unwrap();
        assert!(Path::new(&organizer.records()[0].absolute_path).is_absolute());
        drop(organizer);

        let mut organizer = Organizer::open(&rel, &Config::default()).unwrap();
        let report = organizer.delete_category_named("Video").unwrap();
        assert_eq!(report.removed_records, 1);
        assert!(organizer.records().is_empty());
    }

    #[test]
    fn test_flush_writes_both_files() {
        let tmp = TempDir::new().unwrap();
        let organizer = open(&tmp);
        organizer.flush().unwrap();
        assert!(tmp.path().join("custom_categories.txt").is_file());
        assert!(tmp.path().join("downloads.json").is_file());
    }
}
