use std::path::Path;

use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter, Layer};

use filesortify_core::config::LogConfig;

const LOG_ENV: &str = "FILESORTIFY_LOG";
const LOG_FILE_PREFIX: &str = "filesortify.log";
const KEEP_LOG_FILES: usize = 10;

static GUARD: OnceCell<WorkerGuard> = OnceCell::new(); // keep writer alive

/// Console verbosity picked from the global flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

fn console_filter(verbosity: Verbosity) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return filter;
    }
    let level = match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "debug",
    };
    EnvFilter::new(format!("filesortify_core={level},filesortify={level}"))
}

/// Level of the file layer. Only the file log reads `log.level`.
fn file_level(config: &LogConfig) -> LevelFilter {
    config.level.parse().unwrap_or(LevelFilter::INFO)
}

/// Install the global subscriber. Call once at start.
///
/// The console layer writes to stderr at a level picked from `verbosity`
/// (or `FILESORTIFY_LOG`). When `config.file` is set, a daily
/// rolling file under `logs_dir` also receives everything at `config.level`.
pub fn init(verbosity: Verbosity, config: &LogConfig, logs_dir: &Path) {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .without_time()
        .with_filter(console_filter(verbosity));

    let file_layer = if config.file && std::fs::create_dir_all(logs_dir).is_ok() {
        let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
        let (writer, guard): (non_blocking::NonBlocking, WorkerGuard) =
            tracing_appender::non_blocking(appender);
        let _ = GUARD.set(guard);

        let level = file_level(config);
        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_filter(level),
        )
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(file_layer)
        .with(console)
        .try_init();

    if config.file {
        prune_old_logs(logs_dir);
    }
}

/// Keep the newest rotated log files and delete the rest.
fn prune_old_logs(dir: &Path) {
    use std::fs;

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    let mut files: Vec<_> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|e| e.file_name().to_string_lossy().starts_with(LOG_FILE_PREFIX))
        .collect();

    files.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok()); // oldest first

    if files.len() > KEEP_LOG_FILES {
        let excess = files.len() - KEEP_LOG_FILES;
        for e in files.iter().take(excess) {
            let _ = fs::remove_file(e.path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_quiet_wins() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn test_file_level_reads_config() {
        let mut config = LogConfig::default();
        assert_eq!(file_level(&config), LevelFilter::INFO);
        config.level = "debug".to_string();
        assert_eq!(file_level(&config), LevelFilter::DEBUG);
        config.level = "loud".to_string();
        assert_eq!(file_level(&config), LevelFilter::INFO);
    }

    #[test]
    fn test_console_level_follows_flags() {
        if std::env::var_os(LOG_ENV).is_some() {
            return;
        }
        assert_eq!(
            console_filter(Verbosity::Normal).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            console_filter(Verbosity::Quiet).max_level_hint(),
            Some(LevelFilter::ERROR)
        );
        assert_eq!(
            console_filter(Verbosity::Verbose).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn test_prune_keeps_newest() {
        let tmp = tempfile::TempDir::new().unwrap();
        for i in 0..(KEEP_LOG_FILES + 3) {
            std::fs::write(tmp.path().join(format!("{LOG_FILE_PREFIX}.{i}")), "x").unwrap();
        }
        std::fs::write(tmp.path().join("unrelated.txt"), "x").unwrap();

        prune_old_logs(tmp.path());

        let remaining = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(remaining, KEEP_LOG_FILES + 1);
    }
}
