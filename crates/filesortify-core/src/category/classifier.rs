//! Extension Classifier
//!
//! Maps a file name to the predefined category that should hold it.

use std::path::Path;

use super::builtin::{Predefined, BUILTIN_CATEGORIES};

/// Lowercased extension of `file_name`, if it has one.
///
/// The extension is whatever follows the last `.`. Names without a dot, with
/// a trailing dot, or whose only dot is the leading character (`.bashrc`)
/// have no extension.
pub fn extension_of(file_name: &str) -> Option<String> {
    let index = file_name.rfind('.')?;
    if index == 0 || index + 1 == file_name.len() {
        return None;
    }
    Some(file_name[index + 1..].to_lowercase())
}

/// Classify a file name by its extension. Total: unknown extensions and
/// extension-less names map to [`Predefined::Other`].
pub fn classify(file_name: &str) -> Predefined {
    let Some(ext) = extension_of(file_name) else {
        return Predefined::Other;
    };

    BUILTIN_CATEGORIES
        .iter()
        .find(|b| b.extensions.contains(&ext.as_str()))
        .map(|b| b.label)
        .unwrap_or(Predefined::Other)
}

/// Classify the final component of `path`.
pub fn classify_path(path: &Path) -> Predefined {
    path.file_name()
        .map(|n| classify(&n.to_string_lossy()))
        .unwrap_or(Predefined::Other)
}
