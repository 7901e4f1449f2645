use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::{ColoredString, Colorize};

use filesortify_core::category::{classify_path, extension_of, CategoryKind};
use filesortify_core::config::{Config, ConflictPolicy};
use filesortify_core::{
    resolve_path, CategoryChoice, CategoryChooser, ChooserAction, FileRecord, ImportMode, Organizer,
    Result, SortifyError, STATUS_COMPLETED, STATUS_IMPORTED,
};

mod args;
mod logging;
use args::{CategoryAction, Cli, Commands, ConfigAction, RecordAction, Shell};
use logging::Verbosity;

const BASE_ENV: &str = "FILESORTIFY_BASE";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let base_dir = resolve_base_dir(cli.base_dir);

    let log_config = Config::load(&base_dir).unwrap_or_default();
    logging::init(
        Verbosity::from_flags(cli.verbose, cli.quiet),
        &log_config.log,
        &log_config.layout(&base_dir).logs_dir(),
    );
    tracing::debug!(base = %base_dir.display(), "resolved base directory");

    let result = match cli.command {
        Some(Commands::Category { action }) => handle_category(action, &base_dir),
        Some(Commands::Import {
            files,
            category,
            choose,
            overwrite,
            skip_existing,
        }) => handle_import(
            &base_dir,
            &files,
            category,
            choose,
            conflict_override(overwrite, skip_existing),
        ),
        Some(Commands::Record { action }) => handle_record(action, &base_dir),
        Some(Commands::Classify { files }) => {
            handle_classify(&files);
            Ok(())
        }
        Some(Commands::Config { action }) => handle_config(action, &base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "filesortify", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var(BASE_ENV) {
        return PathBuf::from(base);
    }

    Config::default_base_dir().unwrap_or_else(|_| PathBuf::from("FileSortifyDemo"))
}

fn conflict_override(overwrite: bool, skip_existing: bool) -> Option<ConflictPolicy> {
    if overwrite {
        Some(ConflictPolicy::Overwrite)
    } else if skip_existing {
        Some(ConflictPolicy::Skip)
    } else {
        None
    }
}

/// Open the organizer and surface load-time problems.
fn open_organizer(base_dir: &Path) -> Result<(Organizer, Config)> {
    let config = Config::load(base_dir)?;
    let organizer = Organizer::open(base_dir, &config)?;
    for warning in organizer.warnings() {
        eprintln!("{} {}", "[WARN]".yellow().bold(), warning);
    }
    Ok((organizer, config))
}

/// Print `message` and read one line. `None` on end of input.
fn prompt(message: &str) -> io::Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn confirm(message: &str) -> Result<bool> {
    let answer = prompt(message)?;
    Ok(answer.is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes")))
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(SortifyError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}

fn handle_category(action: CategoryAction, base_dir: &Path) -> Result<()> {
    let (mut organizer, _) = open_organizer(base_dir)?;

    match action {
        CategoryAction::List => print_tree(&organizer),
        CategoryAction::Add { name, top_level } => {
            let id = if top_level {
                organizer.add_category(None, &name)?
            } else {
                organizer.add_file_category(&name)?
            };
            let dir = organizer
                .categories()
                .dir_of(id)
                .unwrap_or_else(|| base_dir.to_path_buf());
            println!("{} {}", "Created:".green(), dir.display());
            if top_level {
                println!(
                    "{}",
                    "(top-level folders are not remembered after restart)".dimmed()
                );
            }
        }
        CategoryAction::Remove { name, force } => {
            let id = organizer
                .find_category(&name)
                .ok_or_else(|| SortifyError::CategoryNotFound { name: name.clone() })?;
            let plan = organizer.plan_delete(id)?;

            if !force {
                println!();
                println!(
                    "Delete category '{}'? This will remove:",
                    plan.name.yellow()
                );
                println!("  {}", plan.folder.display());
                println!(
                    "  {} file(s) on disk, {} ledger record(s)",
                    plan.file_count(),
                    plan.records
                );
                println!();
                let answer = prompt("Type 'yes' to confirm: ")?;
                if answer.as_deref() != Some("yes") {
                    println!("Aborted.");
                    return Ok(());
                }
            }

            match organizer.execute_delete(plan) {
                Ok(report) => {
                    println!();
                    println!("{} {}", "Removed:".red(), report.folder.display());
                    println!("  Paths: {}", report.removed_paths);
                    println!("  Records: {}", report.removed_records);
                }
                Err(e) => {
                    if let SortifyError::PartialDeleteFailure { removed, .. } = &e {
                        println!("Removed before the failure:");
                        for path in removed {
                            println!("  {} {}", "[DEL]".red(), path.display());
                        }
                    }
                    return Err(e);
                }
            }
        }
        CategoryAction::Path { name } => {
            println!("{}", organizer.category_dir(&name)?.display());
        }
    }

    Ok(())
}

fn print_tree(organizer: &Organizer) {
    let store = organizer.categories();
    let ledger = organizer.ledger();

    println!();
    for (depth, id) in store.tree().walk() {
        let Some(node) = store.get(id) else {
            continue;
        };
        let indent = "  ".repeat(depth + 1);
        let label: ColoredString = match node.kind {
            CategoryKind::Group => node.name.bold(),
            CategoryKind::Predefined => node.name.normal(),
            CategoryKind::Custom => node.name.cyan(),
            CategoryKind::Placeholder => format!("+ {}", node.name).dimmed(),
        };

        let count = match node.kind {
            CategoryKind::Predefined | CategoryKind::Custom => store
                .dir_of(id)
                .map(|dir| ledger.count_under(&dir))
                .unwrap_or(0),
            _ => 0,
        };
        if count > 0 {
            println!("{}{} {}", indent, label, format!("({})", count).dimmed());
        } else {
            println!("{}{}", indent, label);
        }
    }
    println!();
}

/// Reads choices from stdin. End of input cancels.
struct StdinChooser;

impl CategoryChooser for StdinChooser {
    fn choose(&mut self, choices: &[String]) -> ChooserAction {
        println!();
        println!("Choose a category:");
        for (i, choice) in choices.iter().enumerate() {
            println!("  {:>2}) {}", i + 1, choice);
        }
        println!("   {}) New category", "n".cyan());
        println!();

        let input = match prompt("Selection (number, name, n; empty to cancel): ") {
            Ok(Some(input)) => input,
            _ => return ChooserAction::Cancel,
        };

        if input.is_empty() {
            ChooserAction::Cancel
        } else if input.eq_ignore_ascii_case("n") {
            ChooserAction::CreateNew
        } else if let Ok(n) = input.parse::<usize>() {
            match n.checked_sub(1).and_then(|i| choices.get(i)) {
                Some(choice) => ChooserAction::Select(choice.clone()),
                None => ChooserAction::Select(input),
            }
        } else {
            ChooserAction::Select(input)
        }
    }

    fn new_name(&mut self) -> Option<String> {
        prompt("New category name (empty to go back): ")
            .ok()
            .flatten()
            .filter(|name| !name.is_empty())
    }

    fn rejected(&mut self, error: &SortifyError) {
        eprintln!("{} {}", "[WARN]".yellow().bold(), error);
    }
}

fn handle_import(
    base_dir: &Path,
    files: &[PathBuf],
    category: Option<String>,
    choose: bool,
    policy_override: Option<ConflictPolicy>,
) -> Result<()> {
    let (mut organizer, config) = open_organizer(base_dir)?;
    let policy = policy_override.unwrap_or(config.import.on_conflict);

    let mode = if choose {
        match organizer.choose_or_create(&mut StdinChooser)? {
            CategoryChoice::Cancelled => {
                println!("Aborted.");
                return Ok(());
            }
            CategoryChoice::Created(name) => {
                println!("{} {}", "Created:".green(), name);
                ImportMode::SingleCategory(name)
            }
            CategoryChoice::Selected(name) => ImportMode::SingleCategory(name),
        }
    } else if let Some(name) = category {
        ImportMode::SingleCategory(name)
    } else {
        ImportMode::ByExtension
    };

    println!();
    match &mode {
        ImportMode::ByExtension => println!("Target: {}", "by extension".cyan()),
        ImportMode::SingleCategory(name) => println!("Target: {}", name.cyan()),
    }
    println!();

    let on_file = |status: &str, file: &str| {
        let status_str = match status {
            "OK" => format!("[{}]", status).green(),
            "SKIP" => format!("[{}]", status).yellow(),
            "FAIL" => format!("[{}]", status).red(),
            _ => format!("[{}]", status).normal(),
        };
        println!("  {} {}", status_str, file);
    };

    let report = organizer.import_files(
        files,
        &mode,
        &mut |conflict| match policy {
            ConflictPolicy::Overwrite => true,
            ConflictPolicy::Skip => false,
            ConflictPolicy::Ask => {
                let message = format!(
                    "  {} already exists in {}. Overwrite? [y/N]: ",
                    conflict.destination.display(),
                    conflict.category
                );
                confirm(&message).unwrap_or(false)
            }
        },
        Some(&on_file),
    )?;

    println!();
    println!("Summary:");
    println!("  Imported: {}", report.imported);
    println!("  Skipped: {}", report.skipped);
    println!("  Failed: {}", report.failed());
    println!();

    if let Some(first) = report.failures.into_iter().next() {
        return Err(first);
    }
    println!("{}", "Import complete.".green());
    Ok(())
}

fn status_label(status: &str) -> ColoredString {
    match status {
        STATUS_COMPLETED => status.green(),
        STATUS_IMPORTED => status.cyan(),
        _ => status.yellow(),
    }
}

fn handle_record(action: RecordAction, base_dir: &Path) -> Result<()> {
    let (mut organizer, _) = open_organizer(base_dir)?;

    match action {
        RecordAction::List { paths } => {
            let records = organizer.records();
            if records.is_empty() {
                println!("No records.");
                return Ok(());
            }

            println!();
            for (i, record) in records.iter().enumerate() {
                println!(
                    "{:>3}  {}  {}  {}  {}",
                    i,
                    record.file_name.bold(),
                    record.size_label,
                    status_label(&record.status),
                    record.last_try_date.dimmed()
                );
                if !record.description.is_empty() {
                    println!("     {}", record.description);
                }
                if paths && !record.absolute_path.is_empty() {
                    println!("     {}", record.absolute_path.dimmed());
                }
            }
            println!();
            println!("Total: {} record(s)", records.len());
        }
        RecordAction::Add {
            file_name,
            size,
            status,
            description,
            path,
        } => {
            let mut record = FileRecord::new(file_name, status);
            record.size_label = size;
            record.description = description;
            if let Some(path) = path {
                record.absolute_path = resolve_path(&path)?.display().to_string();
            }
            let name = record.file_name.clone();
            organizer.add_record(record)?;
            println!("{} {}", "Added:".green(), name);
        }
        RecordAction::Remove { indices, force } => {
            let len = organizer.records().len();
            if let Some(&bad) = indices.iter().find(|i| **i >= len) {
                return Err(SortifyError::RecordIndexOutOfRange { index: bad, len });
            }

            if !force {
                println!();
                println!("Delete these records?");
                for &i in &indices {
                    if let Some(record) = organizer.ledger().get(i) {
                        println!("  {:>3}  {}", i, record.file_name.yellow());
                    }
                }
                println!();
                if !confirm("Delete? [y/N]: ")? {
                    println!("Aborted.");
                    return Ok(());
                }
            }

            let removed = organizer.delete_records(&indices)?;
            println!("{} {} record(s)", "Removed:".red(), removed);
        }
        RecordAction::Clean => {
            let removed = organizer.remove_completed()?;
            if removed == 0 {
                println!("No completed records.");
            } else {
                println!("{} {} completed record(s)", "Removed:".red(), removed);
            }
        }
    }

    Ok(())
}

fn handle_classify(files: &[PathBuf]) {
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());
        let ext = extension_of(&name)
            .map(|e| format!(".{}", e))
            .unwrap_or_else(|| "(none)".to_string());
        println!(
            "{}  {}  {}",
            name,
            ext.dimmed(),
            classify_path(file).name().cyan()
        );
    }
}
