//! Category Tree
//!
//! Arena of category nodes addressed by stable [`CategoryId`]s. Pure data:
//! nothing here touches the filesystem.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable handle to a node. Ids of removed nodes are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(usize);

impl CategoryId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryKind {
    /// One of the fixed file categories (Compressed, Documents, ...)
    Predefined,
    /// Created by the user
    Custom,
    /// Fixed container ("All Downloads", "Queues", ...)
    Group,
    /// "Add Folder" sentinel
    Placeholder,
}

impl CategoryKind {
    /// Groups and placeholders are permanent fixtures of the tree.
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Group | Self::Placeholder)
    }

    /// Only user-created categories go to the persisted list.
    pub fn is_persisted(self) -> bool {
        matches!(self, Self::Custom)
    }
}

#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub name: String,
    pub kind: CategoryKind,
    /// `None` for top-level nodes
    pub parent: Option<CategoryId>,
    children: Vec<CategoryId>,
}

impl CategoryNode {
    pub fn children(&self) -> &[CategoryId] {
        &self.children
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: Vec<Option<CategoryNode>>,
    top_level: Vec<CategoryId>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.nodes.get(id.0).and_then(|n| n.as_ref())
    }

    pub fn contains(&self, id: CategoryId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Children of `parent`, or the top-level nodes when `parent` is `None`.
    /// A stale parent has no children.
    pub fn children(&self, parent: Option<CategoryId>) -> &[CategoryId] {
        match parent {
            None => &self.top_level,
            Some(id) => self.get(id).map(|n| n.children()).unwrap_or(&[]),
        }
    }

    fn siblings_mut(&mut self, parent: Option<CategoryId>) -> Option<&mut Vec<CategoryId>> {
        match parent {
            None => Some(&mut self.top_level),
            Some(id) => self
                .nodes
                .get_mut(id.0)
                .and_then(|n| n.as_mut())
                .map(|n| &mut n.children),
        }
    }

    fn insert_at(
        &mut self,
        parent: Option<CategoryId>,
        name: String,
        kind: CategoryKind,
        before_placeholder: bool,
    ) -> Option<CategoryId> {
        if let Some(p) = parent {
            if !self.contains(p) {
                return None;
            }
        }

        let id = CategoryId(self.nodes.len());
        let position = if before_placeholder {
            self.children(parent)
                .iter()
                .position(|c| {
                    self.get(*c)
                        .is_some_and(|n| n.kind == CategoryKind::Placeholder)
                })
        } else {
            None
        };

        self.nodes.push(Some(CategoryNode {
            name,
            kind,
            parent,
            children: Vec::new(),
        }));

        let siblings = self.siblings_mut(parent)?;
        match position {
            Some(pos) => siblings.insert(pos, id),
            None => siblings.push(id),
        }
        Some(id)
    }

    /// Append a node under `parent`. Returns `None` if `parent` is stale.
    pub fn insert(
        &mut self,
        parent: Option<CategoryId>,
        name: impl Into<String>,
        kind: CategoryKind,
    ) -> Option<CategoryId> {
        self.insert_at(parent, name.into(), kind, false)
    }

    /// Append a top-level node
    pub fn insert_top_level(&mut self, name: impl Into<String>, kind: CategoryKind) -> CategoryId {
        let id = CategoryId(self.nodes.len());
        self.nodes.push(Some(CategoryNode {
            name: name.into(),
            kind,
            parent: None,
            children: Vec::new(),
        }));
        self.top_level.push(id);
        id
    }

    /// Insert a node directly before the placeholder among `parent`'s
    /// children, or append when there is none.
    pub fn insert_before_placeholder(
        &mut self,
        parent: Option<CategoryId>,
        name: impl Into<String>,
        kind: CategoryKind,
    ) -> Option<CategoryId> {
        self.insert_at(parent, name.into(), kind, true)
    }

    /// Case-insensitive lookup among the children of `parent`
    pub fn child_by_name(&self, parent: Option<CategoryId>, name: &str) -> Option<CategoryId> {
        self.children(parent).iter().copied().find(|c| {
            self.get(*c)
                .is_some_and(|n| same_name(&n.name, name))
        })
    }

    /// Breadth-first search by exact label
    pub fn find_by_name(&self, name: &str) -> Option<CategoryId> {
        let mut queue: VecDeque<CategoryId> = self.top_level.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            let Some(node) = self.get(id) else {
                continue;
            };
            if node.name == name {
                return Some(id);
            }
            queue.extend(node.children.iter().copied());
        }
        None
    }

    /// Names from the top level down to `id`, inclusive.
    pub fn ancestry(&self, id: CategoryId) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.get(current) else {
                break;
            };
            chain.push(node.name.as_str());
            cursor = node.parent;
        }
        chain.reverse();
        chain
    }

    /// Detach `id` and free its whole subtree. Returns the detached node.
    pub fn remove(&mut self, id: CategoryId) -> Option<CategoryNode> {
        let parent = self.get(id)?.parent;
        if let Some(siblings) = self.siblings_mut(parent) {
            siblings.retain(|c| *c != id);
        }

        let node = self.nodes.get_mut(id.0)?.take()?;
        let mut stack = node.children.clone();
        while let Some(child) = stack.pop() {
            if let Some(freed) = self.nodes.get_mut(child.0).and_then(|n| n.take()) {
                stack.extend(freed.children);
            }
        }
        Some(node)
    }

    /// Depth-first pre-order walk yielding `(depth, id)`; depth 0 is top level.
    pub fn walk(&self) -> Vec<(usize, CategoryId)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, CategoryId)> =
            self.top_level.iter().rev().map(|id| (0, *id)).collect();
        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            out.push((depth, id));
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, *c)));
        }
        out
    }
}

/// Name equality under Unicode lowercase folding
pub fn same_name(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (CategoryTree, CategoryId) {
        let mut tree = CategoryTree::new();
        let group = tree.insert(None, "All Downloads", CategoryKind::Group).unwrap();
        tree.insert(Some(group), "Video", CategoryKind::Predefined);
        tree.insert(Some(group), "Add Folder", CategoryKind::Placeholder);
        tree.insert(None, "Queues", CategoryKind::Group);
        (tree, group)
    }

    fn names(tree: &CategoryTree, parent: Option<CategoryId>) -> Vec<String> {
        tree.children(parent)
            .iter()
            .map(|c| tree.get(*c).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_insert_before_placeholder_keeps_placeholder_last() {
        let (mut tree, group) = sample();
        tree.insert_before_placeholder(Some(group), "Games", CategoryKind::Custom);
        tree.insert_before_placeholder(Some(group), "Books", CategoryKind::Custom);
        assert_eq!(
            names(&tree, Some(group)),
            vec!["Video", "Games", "Books", "Add Folder"]
        );
    }

    #[test]
    fn test_insert_before_placeholder_without_placeholder_appends() {
        let mut tree = CategoryTree::new();
        tree.insert(None, "A", CategoryKind::Group);
        tree.insert_before_placeholder(None, "B", CategoryKind::Custom);
        assert_eq!(names(&tree, None), vec!["A", "B"]);
    }

    #[test]
    fn test_insert_under_stale_parent_fails() {
        let (mut tree, group) = sample();
        let video = tree.child_by_name(Some(group), "video").unwrap();
        tree.remove(video);
        assert!(tree.insert(Some(video), "x", CategoryKind::Custom).is_none());
    }

    #[test]
    fn test_child_by_name_ignores_case() {
        let (tree, group) = sample();
        assert!(tree.child_by_name(Some(group), "VIDEO").is_some());
        assert!(tree.child_by_name(Some(group), "Music").is_none());
        assert!(tree.child_by_name(None, "queues").is_some());
    }

    #[test]
    fn test_child_by_name_folds_non_ascii_case() {
        let (mut tree, group) = sample();
        tree.insert_before_placeholder(Some(group), "Ärzte", CategoryKind::Custom);
        assert!(tree.child_by_name(Some(group), "ärzte").is_some());
        assert!(tree.child_by_name(Some(group), "ÄRZTE").is_some());
        assert!(tree.child_by_name(Some(group), "Arzte").is_none());
    }

    #[test]
    fn test_len_and_is_empty_agree() {
        let mut tree = CategoryTree::new();
        assert!(tree.is_empty());
        let group = tree.insert(None, "All Downloads", CategoryKind::Group).unwrap();
        tree.insert(Some(group), "Video", CategoryKind::Predefined);
        assert!(!tree.is_empty());

        tree.remove(group);
        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_find_by_name_is_exact_and_breadth_first() {
        let (mut tree, group) = sample();
        // Same label nested deeper than a top-level node
        tree.insert_before_placeholder(Some(group), "Queues", CategoryKind::Custom);
        let found = tree.find_by_name("Queues").unwrap();
        assert_eq!(tree.get(found).unwrap().parent, None);
        assert!(tree.find_by_name("queues").is_none());
    }

    #[test]
    fn test_ancestry() {
        let (tree, group) = sample();
        let video = tree.child_by_name(Some(group), "Video").unwrap();
        assert_eq!(tree.ancestry(video), vec!["All Downloads", "Video"]);
    }

    #[test]
    fn test_remove_frees_subtree_and_ids_stay_stale() {
        let (mut tree, group) = sample();
        let custom = tree
            .insert_before_placeholder(Some(group), "Games", CategoryKind::Custom)
            .unwrap();
        let nested = tree.insert(Some(custom), "Retro", CategoryKind::Custom).unwrap();
        let before = tree.len();

        let removed = tree.remove(custom).unwrap();
        assert_eq!(removed.name, "Games");
        assert!(!tree.contains(custom));
        assert!(!tree.contains(nested));
        assert_eq!(tree.len(), before - 2);
        assert!(tree.remove(custom).is_none());

        let fresh = tree.insert(Some(group), "Games", CategoryKind::Custom).unwrap();
        assert_ne!(fresh, custom);
    }

    #[test]
    fn test_walk_is_preorder_with_depth() {
        let (tree, _) = sample();
        let walked: Vec<(usize, String)> = tree
            .walk()
            .into_iter()
            .map(|(d, id)| (d, tree.get(id).unwrap().name.clone()))
            .collect();
        assert_eq!(
            walked,
            vec![
                (0, "All Downloads".to_string()),
                (1, "Video".to_string()),
                (1, "Add Folder".to_string()),
                (0, "Queues".to_string()),
            ]
        );
    }
}
