use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SortifyError};

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_BASE_DIR: &str = "FileSortifyDemo";
const DEFAULT_CATEGORIES_FILE: &str = "custom_categories.txt";
const DEFAULT_RECORDS_FILE: &str = "downloads.json";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# FileSortify configuration file
# Location: <base dir>/config.toml

[storage]
# Newline-separated list of custom category names (relative to the base dir)
categories_file = "custom_categories.txt"

# JSON ledger of imported and downloaded files (relative to the base dir)
records_file = "downloads.json"

[import]
# What to do when an imported file already exists in its category:
#   ask       - prompt for each file
#   overwrite - replace the existing file
#   skip      - keep the existing file
on_conflict = "ask"

[log]
# Also write logs to <base dir>/logs (daily rotation)
file = false

# Level written to the log file: error, warn, info, debug, trace
# (console output follows --verbose/--quiet or FILESORTIFY_LOG)
level = "info"
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Where persisted state lives, relative to the base directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_categories_file")]
    pub categories_file: String,

    #[serde(default = "default_records_file")]
    pub records_file: String,
}

fn default_categories_file() -> String {
    DEFAULT_CATEGORIES_FILE.to_string()
}

fn default_records_file() -> String {
    DEFAULT_RECORDS_FILE.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            categories_file: default_categories_file(),
            records_file: default_records_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImportConfig {
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

/// Default answer when an imported file already exists at its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Ask,
    Overwrite,
    Skip,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ask => "ask",
            Self::Overwrite => "overwrite",
            Self::Skip => "skip",
        })
    }
}

impl FromStr for ConflictPolicy {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(Self::Ask),
            "overwrite" => Ok(Self::Overwrite),
            "skip" => Ok(Self::Skip),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub file: bool,

    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: false,
            level: default_log_level(),
        }
    }
}

/// Resolved on-disk locations for one base directory
#[derive(Debug, Clone)]
pub struct Layout {
    pub base_dir: PathBuf,
    pub categories_file: PathBuf,
    pub records_file: PathBuf,
}

impl Layout {
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(&path).map_err(|e| SortifyError::persistence(&path, e))?;
        let config: Config = toml::from_str(&content).map_err(|e| SortifyError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self).map_err(|e| SortifyError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content).map_err(|e| SortifyError::persistence(&path, e))?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Default base directory: `~/FileSortifyDemo`
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(DEFAULT_BASE_DIR))
            .ok_or(SortifyError::HomeNotFound)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
                .map_err(|e| SortifyError::persistence(&path, e))?;
        }

        Ok(path)
    }

    /// Resolve persisted file locations against `base_dir`
    pub fn layout(&self, base_dir: &Path) -> Layout {
        Layout {
            base_dir: base_dir.to_path_buf(),
            categories_file: base_dir.join(&self.storage.categories_file),
            records_file: base_dir.join(&self.storage.records_file),
        }
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "storage.categories_file" => Some(self.storage.categories_file.clone()),
            "storage.records_file" => Some(self.storage.records_file.clone()),
            "import.on_conflict" => Some(self.import.on_conflict.to_string()),
            "log.file" => Some(self.log.file.to_string()),
            "log.level" => Some(self.log.level.clone()),
            _ => None,
        }
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || SortifyError::ConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "storage.categories_file" => {
                self.storage.categories_file = parse_file_name(value).ok_or_else(invalid)?;
            }
            "storage.records_file" => {
                self.storage.records_file = parse_file_name(value).ok_or_else(invalid)?;
            }
            "import.on_conflict" => {
                self.import.on_conflict = value.parse().map_err(|_| invalid())?;
            }
            "log.file" => {
                self.log.file = value.trim().parse().map_err(|_| invalid())?;
            }
            "log.level" => {
                let level = value.trim().to_ascii_lowercase();
                if !["error", "warn", "info", "debug", "trace"].contains(&level.as_str()) {
                    return Err(invalid());
                }
                self.log.level = level;
            }
            _ => {
                return Err(SortifyError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        [
            "storage.categories_file",
            "storage.records_file",
            "import.on_conflict",
            "log.file",
            "log.level",
        ]
        .iter()
        .filter_map(|key| self.get(key).map(|v| (key.to_string(), v)))
        .collect()
    }
}

/// Accept a bare file name or a relative path; reject empty values and
/// quotes left over from shell input.
fn parse_file_name(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_matches('"').trim_matches('\'');
    if trimmed.is_empty() || Path::new(trimmed).is_absolute() {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_missing() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.storage.categories_file, "custom_categories.txt");
        assert_eq!(config.storage.records_file, "downloads.json");
        assert_eq!(config.import.on_conflict, ConflictPolicy::Ask);
        assert!(!config.log.file);
    }

    #[test]
    fn test_init_template_parses_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = Config::init(tmp.path()).unwrap();
        assert!(path.exists());
        let config = Config::load(tmp.path()).unwrap();
        assert_eq!(config.list(), Config::default().list());
    }

    #[test]
    fn test_config_get_set() {
        let mut config = Config::default();

        config.set("import.on_conflict", "Overwrite").unwrap();
        assert_eq!(config.import.on_conflict, ConflictPolicy::Overwrite);
        assert_eq!(config.get("import.on_conflict").unwrap(), "overwrite");

        config.set("log.file", "true").unwrap();
        assert!(config.log.file);

        config.set("storage.records_file", "\"ledger.json\"").unwrap();
        assert_eq!(config.storage.records_file, "ledger.json");
    }

    #[test]
    fn test_set_rejects_bad_values_and_keys() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("import.on_conflict", "maybe"),
            Err(SortifyError::ConfigValue { .. })
        ));
        assert!(matches!(
            config.set("log.level", "loud"),
            Err(SortifyError::ConfigValue { .. })
        ));
        assert!(matches!(
            config.set("storage.records_file", "/abs/path.json"),
            Err(SortifyError::ConfigValue { .. })
        ));
        assert!(matches!(
            config.set("nope", "1"),
            Err(SortifyError::ConfigKeyNotFound { .. })
        ));
    }

    #[test]
    fn test_save_round_trip_and_layout() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.set("storage.categories_file", "cats.txt").unwrap();
        config.save(tmp.path()).unwrap();

        let loaded = Config::load(tmp.path()).unwrap();
        let layout = loaded.layout(tmp.path());
        assert_eq!(layout.categories_file, tmp.path().join("cats.txt"));
        assert_eq!(layout.records_file, tmp.path().join("downloads.json"));
        assert_eq!(layout.logs_dir(), tmp.path().join("logs"));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let tmp = TempDir::new().unwrap();
        fs::write(Config::path(tmp.path()), "[import]\non_conflict = 3\n").unwrap();
        assert!(matches!(
            Config::load(tmp.path()),
            Err(SortifyError::ConfigParse { .. })
        ));
    }
}
