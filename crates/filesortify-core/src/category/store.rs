//! Category Store
//!
//! Owns the category tree and keeps it in step with the category directories
//! under the base directory and the flat list of custom category names.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::builtin::{Predefined, ALL_DOWNLOADS, PLACEHOLDER, STRUCTURAL_GROUPS};
use super::tree::{CategoryId, CategoryKind, CategoryNode, CategoryTree};
use crate::error::{Result, SortifyError};

#[derive(Debug, Clone)]
pub struct CategoryStore {
    tree: CategoryTree,
    downloads: CategoryId,
    base_dir: PathBuf,
    list_file: PathBuf,
}

impl CategoryStore {
    /// Fixed hierarchy only: "All Downloads" with the predefined categories,
    /// the structural groups, and a placeholder closing each level.
    pub fn builtin(base_dir: &Path, list_file: &Path) -> Self {
        let mut tree = CategoryTree::new();
        let downloads = tree.insert_top_level(ALL_DOWNLOADS, CategoryKind::Group);
        for p in Predefined::ALL {
            tree.insert(Some(downloads), p.name(), CategoryKind::Predefined);
        }
        tree.insert(Some(downloads), PLACEHOLDER, CategoryKind::Placeholder);

        for group in STRUCTURAL_GROUPS {
            tree.insert_top_level(*group, CategoryKind::Group);
        }
        tree.insert_top_level(PLACEHOLDER, CategoryKind::Placeholder);

        Self {
            tree,
            downloads,
            base_dir: base_dir.to_path_buf(),
            list_file: list_file.to_path_buf(),
        }
    }

    /// Build the fixed hierarchy and append the custom categories listed in
    /// `list_file` whose directory still exists.
    ///
    /// Never fails: problems reading the list are returned as warnings and
    /// the store starts without custom categories.
    pub fn load(base_dir: &Path, list_file: &Path) -> (Self, Vec<String>) {
        let mut store = Self::builtin(base_dir, list_file);
        let mut warnings = Vec::new();

        let content = match fs::read_to_string(list_file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return (store, warnings),
            Err(e) => {
                let err = SortifyError::persistence(list_file, e);
                warn!("{}", err);
                warnings.push(err.to_string());
                return (store, warnings);
            }
        };

        for line in content.lines() {
            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            if validate_category_name(name).is_err() {
                warnings.push(format!("Ignoring invalid category name '{}'", name));
                continue;
            }
            if store.exists(Some(store.downloads), name) {
                debug!(category = name, "skipping duplicate category entry");
                continue;
            }

            let dir = store.downloads_dir().join(name);
            if !dir.is_dir() {
                debug!(category = name, path = %dir.display(), "dropping category without directory");
                continue;
            }
            store.tree.insert_before_placeholder(
                Some(store.downloads),
                name,
                CategoryKind::Custom,
            );
        }

        (store, warnings)
    }

    /// Overwrite the persisted list with the current custom categories.
    pub fn save(&self) -> Result<()> {
        let mut content = String::new();
        for name in self.custom_names() {
            content.push_str(&name);
            content.push('\n');
        }

        if let Some(parent) = self.list_file.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SortifyError::persistence(parent, e))?;
        }
        fs::write(&self.list_file, content)
            .map_err(|e| SortifyError::persistence(&self.list_file, e))?;
        debug!(path = %self.list_file.display(), "saved category list");
        Ok(())
    }

    /// Custom categories under "All Downloads", in tree order
    pub fn custom_names(&self) -> Vec<String> {
        self.tree
            .children(Some(self.downloads))
            .iter()
            .filter_map(|id| self.tree.get(*id))
            .filter(|n| n.kind.is_persisted())
            .map(|n| n.name.clone())
            .collect()
    }

    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    /// The "All Downloads" group
    pub fn downloads_group(&self) -> CategoryId {
        self.downloads
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn list_file(&self) -> &Path {
        &self.list_file
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.base_dir.join(ALL_DOWNLOADS)
    }

    pub fn get(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.tree.get(id)
    }

    /// Case-insensitive existence check among the children of `parent`
    pub fn exists(&self, parent: Option<CategoryId>, name: &str) -> bool {
        self.tree.child_by_name(parent, name.trim()).is_some()
    }

    /// Breadth-first lookup by exact label
    pub fn find_by_name(&self, name: &str) -> Option<CategoryId> {
        self.tree.find_by_name(name)
    }

    /// Case-insensitive lookup of a file category under "All Downloads".
    /// The placeholder is never a match.
    pub fn resolve(&self, name: &str) -> Option<CategoryId> {
        self.tree
            .child_by_name(Some(self.downloads), name.trim())
            .filter(|id| {
                self.tree
                    .get(*id)
                    .is_some_and(|n| n.kind != CategoryKind::Placeholder)
            })
    }

    /// Node for a predefined category, re-inserting it if it was deleted
    /// earlier in this session.
    pub fn ensure_predefined(&mut self, label: Predefined) -> Result<CategoryId> {
        if let Some(id) = self.resolve(label.name()) {
            return Ok(id);
        }
        debug!(category = label.name(), "restoring predefined category");
        self.tree
            .insert_before_placeholder(Some(self.downloads), label.name(), CategoryKind::Predefined)
            .ok_or_else(|| SortifyError::CategoryNotFound {
                name: label.name().to_string(),
            })
    }

    /// Create a category under `parent` (`None` for a top-level folder).
    ///
    /// The directory is created before the node is inserted. Categories under
    /// "All Downloads" are persisted immediately; top-level folders are not.
    pub fn add_category(&mut self, parent: Option<CategoryId>, name: &str) -> Result<CategoryId> {
        let name = validate_category_name(name)?;

        if let Some(p) = parent {
            match self.tree.get(p) {
                Some(node) if node.kind != CategoryKind::Placeholder => {}
                _ => {
                    return Err(SortifyError::CategoryNotFound {
                        name: p.to_string(),
                    })
                }
            }
        }

        if self.exists(parent, &name) {
            return Err(SortifyError::DuplicateCategory { name });
        }

        let dir = self.parent_dir(parent).join(&name);
        fs::create_dir_all(&dir).map_err(|e| SortifyError::persistence(&dir, e))?;

        let id = self
            .tree
            .insert_before_placeholder(parent, name.as_str(), CategoryKind::Custom)
            .ok_or_else(|| SortifyError::CategoryNotFound { name: name.clone() })?;
        info!(category = %name, path = %dir.display(), "created category");

        if parent == Some(self.downloads) {
            self.save()?;
        }
        Ok(id)
    }

    fn parent_dir(&self, parent: Option<CategoryId>) -> PathBuf {
        match parent {
            None => self.base_dir.clone(),
            Some(p) => self
                .dir_of(p)
                .unwrap_or_else(|| self.base_dir.clone()),
        }
    }

    /// Disk path of a node: base directory + ancestry. Placeholders and stale
    /// ids have none.
    pub fn dir_of(&self, id: CategoryId) -> Option<PathBuf> {
        let node = self.tree.get(id)?;
        if node.kind == CategoryKind::Placeholder {
            return None;
        }
        let mut path = self.base_dir.clone();
        for name in self.tree.ancestry(id) {
            path.push(name);
        }
        Some(path)
    }

    /// Disk path of a node, creating the directory if it does not exist yet.
    pub fn ensure_dir(&self, id: CategoryId) -> Result<PathBuf> {
        let dir = self.dir_of(id).ok_or_else(|| SortifyError::CategoryNotFound {
            name: id.to_string(),
        })?;
        if !dir.is_dir() {
            fs::create_dir_all(&dir).map_err(|e| SortifyError::persistence(&dir, e))?;
            debug!(path = %dir.display(), "created category directory");
        }
        Ok(dir)
    }

    /// Categories that can receive imported files, in tree order
    pub fn choices(&self) -> Vec<String> {
        self.tree
            .children(Some(self.downloads))
            .iter()
            .filter_map(|id| self.tree.get(*id))
            .filter(|n| matches!(n.kind, CategoryKind::Predefined | CategoryKind::Custom))
            .map(|n| n.name.clone())
            .collect()
    }

    /// Detach a node from the tree. No filesystem or persistence effect.
    pub fn remove(&mut self, id: CategoryId) -> Result<CategoryNode> {
        let node = self.tree.get(id).ok_or_else(|| SortifyError::CategoryNotFound {
            name: id.to_string(),
        })?;
        if node.kind.is_protected() {
            return Err(SortifyError::DeleteForbidden {
                name: node.name.clone(),
                reason: protected_reason(node.kind),
            });
        }
        self.tree
            .remove(id)
            .ok_or_else(|| SortifyError::CategoryNotFound {
                name: id.to_string(),
            })
    }
}

pub(crate) fn protected_reason(kind: CategoryKind) -> &'static str {
    match kind {
        CategoryKind::Placeholder => "the placeholder cannot be deleted",
        _ => "built-in folders cannot be deleted",
    }
}

/// Trim `name` and check it can be a directory name and a single line of the
/// category list.
pub fn validate_category_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed
            .chars()
            .any(|c| matches!(c, '\n' | '\r' | '/' | '\\') || c.is_control());

    if invalid {
        return Err(SortifyError::InvalidCategoryName {
            name: name.to_string(),
        });
    }
    Ok(trimmed.to_string())
}
