use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "filesortify")]
#[command(about = "Sort files into categories and keep a ledger of what was imported")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/FileSortifyDemo)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Copy files into category folders and record them
    #[command(group(ArgGroup::new("target").args(["category", "choose"])))]
    #[command(group(ArgGroup::new("conflict").args(["overwrite", "skip_existing"])))]
    Import {
        /// Files to import
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Put every file into this category instead of sorting by extension
        #[arg(short, long)]
        category: Option<String>,

        /// Pick or create the target category interactively
        #[arg(long)]
        choose: bool,

        /// Replace files that already exist in the category
        #[arg(long)]
        overwrite: bool,

        /// Keep files that already exist in the category
        #[arg(long)]
        skip_existing: bool,
    },

    /// Manage the download ledger
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Show which category files would be sorted into
    Classify {
        /// File names or paths
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Show the category tree
    List,

    /// Create a category under "All Downloads"
    Add {
        /// Category name
        name: String,

        /// Create a top-level folder instead (not persisted)
        #[arg(long)]
        top_level: bool,
    },

    /// Delete a category, its folder and its records
    Remove {
        /// Category name
        name: String,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Print the folder of a category
    Path {
        /// Category name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum RecordAction {
    /// List ledger records
    List {
        /// Show the stored path of each record
        #[arg(long)]
        paths: bool,
    },

    /// Append a record
    Add {
        /// File name
        file_name: String,

        /// Size label (e.g., "2048 bytes")
        #[arg(long, default_value = "N/A")]
        size: String,

        /// Status (e.g., Queued, Completed)
        #[arg(long, default_value = "Queued")]
        status: String,

        /// Free-form description
        #[arg(long, default_value = "")]
        description: String,

        /// Where the file is stored
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Delete records by index (as shown by `record list`)
    Remove {
        /// Record indices
        #[arg(required = true)]
        indices: Vec<usize>,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Remove every record with status "Completed"
    Clean,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., import.on_conflict)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., import.on_conflict)
        key: String,

        /// Value to set (e.g., overwrite)
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults and comments
    Init,
}
