//! Deletion Coordinator
//!
//! Removes a category directory and cascades the removal to the category
//! tree and the ledger. Deletion runs in three steps: plan the removals,
//! execute them on disk, and only then commit the tree and ledger changes.

use std::fs;
use std::path::PathBuf;

use tracing::{error, info};
use walkdir::WalkDir;

use crate::category::{protected_reason, CategoryId, CategoryStore};
use crate::error::{Result, SortifyError};
use crate::ledger::Ledger;

#[derive(Debug, Clone)]
pub struct PlannedRemoval {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Everything a category deletion will touch, computed before anything is
/// removed.
#[derive(Debug, Clone)]
pub struct DeletionPlan {
    pub id: CategoryId,
    pub name: String,
    pub folder: PathBuf,
    /// Children before parents; the folder itself comes last
    pub removals: Vec<PlannedRemoval>,
    /// Ledger records stored under `folder`
    pub records: usize,
}

impl DeletionPlan {
    pub fn file_count(&self) -> usize {
        self.removals.iter().filter(|r| !r.is_dir).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub category: String,
    pub folder: PathBuf,
    pub removed_paths: usize,
    pub removed_records: usize,
}

pub struct DeletionCoordinator<'a> {
    store: &'a mut CategoryStore,
    ledger: &'a mut Ledger,
}

impl<'a> DeletionCoordinator<'a> {
    pub fn new(store: &'a mut CategoryStore, ledger: &'a mut Ledger) -> Self {
        Self { store, ledger }
    }

    /// Work out what deleting `id` would remove. Nothing is modified.
    pub fn plan(&self, id: CategoryId) -> Result<DeletionPlan> {
        let node = self
            .store
            .get(id)
            .ok_or_else(|| SortifyError::CategoryNotFound {
                name: id.to_string(),
            })?;
        if node.kind.is_protected() {
            return Err(SortifyError::DeleteForbidden {
                name: node.name.clone(),
                reason: protected_reason(node.kind),
            });
        }
        let name = node.name.clone();
        let folder = self
            .store
            .dir_of(id)
            .ok_or_else(|| SortifyError::CategoryNotFound { name: name.clone() })?;

        let mut removals = Vec::new();
        if fs::symlink_metadata(&folder).is_ok() {
            for entry in WalkDir::new(&folder)
                .contents_first(true)
                .sort_by_file_name()
            {
                let entry = entry.map_err(|e| {
                    let path = e
                        .path()
                        .map(|p| p.to_path_buf())
                        .unwrap_or_else(|| folder.clone());
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    SortifyError::persistence(path, source)
                })?;
                removals.push(PlannedRemoval {
                    path: entry.path().to_path_buf(),
                    is_dir: entry.file_type().is_dir(),
                });
            }
        }

        Ok(DeletionPlan {
            id,
            name,
            records: self.ledger.count_under(&folder),
            folder,
            removals,
        })
    }

    /// Delete category `id` with its directory subtree and ledger records.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<DeleteReport> {
        let plan = self.plan(id)?;
        self.execute(plan)
    }

    /// Carry out `plan`.
    ///
    /// Stops at the first path that cannot be removed and returns
    /// `PartialDeleteFailure` listing what was already removed; the tree and
    /// ledger are left untouched in that case.
    pub fn execute(&mut self, plan: DeletionPlan) -> Result<DeleteReport> {
        if self.store.get(plan.id).is_none() {
            return Err(SortifyError::CategoryNotFound { name: plan.name });
        }

        let mut removed = Vec::with_capacity(plan.removals.len());
        for item in &plan.removals {
            let result = if item.is_dir {
                fs::remove_dir(&item.path)
            } else {
                fs::remove_file(&item.path)
            };
            if let Err(source) = result {
                error!(
                    path = %item.path.display(),
                    removed = removed.len(),
                    "category deletion stopped: {}",
                    source
                );
                return Err(SortifyError::PartialDeleteFailure {
                    path: item.path.clone(),
                    removed,
                    source,
                });
            }
            removed.push(item.path.clone());
        }

        let node = self.store.remove(plan.id)?;
        let removed_records = self.ledger.remove_under(&plan.folder);
        info!(
            category = %plan.name,
            paths = removed.len(),
            records = removed_records,
            "deleted category"
        );

        let store_saved = if node.parent == Some(self.store.downloads_group()) {
            self.store.save()
        } else {
            Ok(())
        };
        let ledger_saved = self.ledger.save();
        store_saved.and(ledger_saved)?;

        Ok(DeleteReport {
            category: plan.name,
            folder: plan.folder,
            removed_paths: removed.len(),
            removed_records,
        })
    }
}
