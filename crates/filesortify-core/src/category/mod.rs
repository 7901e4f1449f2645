//! # Category Module
//!
//! The folder hierarchy files are sorted into.
//!
//! ## Layout
//!
//! ```text
//! All Downloads          (group)
//!   Compressed .. Other  (predefined, one per extension class)
//!   <custom>             (user-created, persisted in the category list)
//!   Add Folder           (placeholder)
//! Unfinished / Finished / Grabber Projects / Queues   (groups)
//! Add Folder             (placeholder)
//! ```
//!
//! Every non-placeholder node maps to `<base dir>/<ancestry>` on disk.
//!
//! ## Module layout
//!
//! - `builtin`: fixed labels and the extension table
//! - `classifier`: extension to predefined category
//! - `tree`: arena tree with stable ids
//! - `store`: tree + directories + the persisted custom category list
//!
//! ```rust
//! use filesortify_core::category::{classify, Predefined};
//!
//! assert_eq!(classify("holiday.JPG"), Predefined::Images);
//! assert_eq!(classify("notes"), Predefined::Other);
//! ```

mod builtin;
mod classifier;
mod store;
mod tree;

pub use builtin::{
    BuiltinCategory, Predefined, ALL_DOWNLOADS, BUILTIN_CATEGORIES, PLACEHOLDER, STRUCTURAL_GROUPS,
};
pub use classifier::{classify, classify_path, extension_of};
pub(crate) use store::protected_reason;
pub use store::{validate_category_name, CategoryStore};
pub use tree::{CategoryId, CategoryKind, CategoryNode, CategoryTree};
