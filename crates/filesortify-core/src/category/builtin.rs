//! Builtin Category Definitions
//!
//! The fixed part of the category tree: predefined file categories with their
//! extension tables, the top-level groups, and the placeholder label.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::tree::same_name;

/// Group that holds every predefined and custom file category.
pub const ALL_DOWNLOADS: &str = "All Downloads";

/// Label of the sentinel node that starts a "create new folder" flow.
pub const PLACEHOLDER: &str = "Add Folder";

/// Top-level containers unrelated to file classification.
pub const STRUCTURAL_GROUPS: &[&str] = &["Unfinished", "Finished", "Grabber Projects", "Queues"];

/// Predefined file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predefined {
    Compressed,
    Documents,
    Images,
    Music,
    Programs,
    Video,
    Other,
}

impl Predefined {
    /// Tree order under "All Downloads".
    pub const ALL: [Predefined; 7] = [
        Predefined::Compressed,
        Predefined::Documents,
        Predefined::Images,
        Predefined::Music,
        Predefined::Programs,
        Predefined::Video,
        Predefined::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Compressed => "Compressed",
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Music => "Music",
            Self::Programs => "Programs",
            Self::Video => "Video",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive lookup by label
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| same_name(p.name(), name))
    }

    pub fn is_predefined(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl fmt::Display for Predefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static definition of a predefined category and the extensions it claims.
#[derive(Debug, Clone)]
pub struct BuiltinCategory {
    pub label: Predefined,
    pub description: &'static str,
    /// Lowercase extensions without the leading dot
    pub extensions: &'static [&'static str],
}

/// Extension table. Each extension appears at most once across the table;
/// anything not listed falls through to [`Predefined::Other`].
pub const BUILTIN_CATEGORIES: &[BuiltinCategory] = &[
    BuiltinCategory {
        label: Predefined::Compressed,
        description: "Archives and compressed bundles",
        extensions: &["zip", "rar", "7z", "tar", "gz"],
    },
    BuiltinCategory {
        label: Predefined::Documents,
        description: "Text, office documents, spreadsheets and slides",
        extensions: &[
            "pdf", "doc", "docx", "txt", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp",
        ],
    },
    BuiltinCategory {
        label: Predefined::Music,
        description: "Audio files",
        extensions: &["mp3", "wav", "flac", "m4a", "aac", "ogg"],
    },
    BuiltinCategory {
        label: Predefined::Programs,
        description: "Installers and executables",
        extensions: &["exe", "msi", "dmg", "deb", "rpm"],
    },
    BuiltinCategory {
        label: Predefined::Video,
        description: "Video files",
        extensions: &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"],
    },
    BuiltinCategory {
        label: Predefined::Images,
        description: "Raster and vector images",
        extensions: &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "svg"],
    },
    BuiltinCategory {
        label: Predefined::Other,
        description: "Everything without a known extension",
        extensions: &[],
    },
];
