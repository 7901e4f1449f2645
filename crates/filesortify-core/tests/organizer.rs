use std::fs;
use std::path::{Path, PathBuf};

use filesortify_core::{
    ChooserAction, CategoryChoice, CategoryChooser, Config, ImportMode, Organizer, SortifyError,
    STATUS_COMPLETED,
};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

struct PickNew(Option<&'static str>);

impl CategoryChooser for PickNew {
    fn choose(&mut self, _choices: &[String]) -> ChooserAction {
        if self.0.is_some() {
            ChooserAction::CreateNew
        } else {
            ChooserAction::Cancel
        }
    }

    fn new_name(&mut self) -> Option<String> {
        self.0.take().map(String::from)
    }
}

#[test]
fn organizer_round_trip() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("FileSortifyDemo");
    let inbox = tmp.path().join("inbox");
    let config = Config::default();

    let mut organizer = Organizer::open(&base, &config).unwrap();
    assert!(organizer.warnings().is_empty());

    // Import by extension
    let files = vec![
        write(&inbox, "report.pdf", "pdf"),
        write(&inbox, "clip.mp4", "mp4"),
        write(&inbox, "photo.png", "png"),
    ];
    let report = organizer
        .import_files(&files, &ImportMode::ByExtension, &mut |_| true, None)
        .unwrap();
    assert_eq!(report.imported, 3);
    assert!(base.join("All Downloads/Documents/report.pdf").is_file());

    // Create a category through the chooser and import into it
    let choice = organizer
        .choose_or_create(&mut PickNew(Some("Receipts")))
        .unwrap();
    assert_eq!(choice, CategoryChoice::Created("Receipts".to_string()));
    let receipt = write(&inbox, "march.pdf", "receipt");
    let report = organizer
        .import_files(
            &[receipt],
            &ImportMode::SingleCategory("receipts".to_string()),
            &mut |_| true,
            None,
        )
        .unwrap();
    assert_eq!(report.imported, 1);
    assert_eq!(organizer.records().len(), 4);

    // Delete a category and its records
    let deleted = organizer.delete_category_named("Video").unwrap();
    assert_eq!(deleted.removed_records, 1);
    assert!(!base.join("All Downloads/Video").exists());
    assert!(matches!(
        organizer.delete_category_named("Video"),
        Err(SortifyError::CategoryNotFound { .. })
    ));

    // Reload: custom category survives, deleted predefined one is rebuilt
    drop(organizer);
    let mut organizer = Organizer::open(&base, &config).unwrap();
    assert!(organizer.categories().resolve("Receipts").is_some());
    assert!(organizer.categories().resolve("Video").is_some());
    assert_eq!(organizer.records().len(), 3);
    assert!(organizer
        .records()
        .iter()
        .all(|r| !r.absolute_path.contains("Video")));

    // Removing the directory behind a custom category hides it on next load
    fs::remove_dir_all(base.join("All Downloads/Receipts")).unwrap();
    organizer.flush().unwrap();
    let organizer = Organizer::open(&base, &config).unwrap();
    assert!(organizer.categories().resolve("Receipts").is_none());
}

#[test]
fn ledger_maintenance_persists() {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path().join("base");
    let config = Config::default();

    let mut organizer = Organizer::open(&base, &config).unwrap();
    let mut done = filesortify_core::FileRecord::new("done.iso", STATUS_COMPLETED);
    done.absolute_path = base.join("All Downloads/Programs/done.iso").display().to_string();
    organizer.add_record(done).unwrap();
    organizer
        .add_record(filesortify_core::FileRecord::new("queued.iso", "Queued"))
        .unwrap();
    organizer
        .add_record(filesortify_core::FileRecord::new("other.iso", "Paused"))
        .unwrap();

    assert_eq!(organizer.remove_completed().unwrap(), 1);
    assert_eq!(organizer.delete_records(&[1]).unwrap(), 1);

    let reopened = Organizer::open(&base, &config).unwrap();
    let names: Vec<_> = reopened
        .records()
        .iter()
        .map(|r| r.file_name.as_str())
        .collect();
    assert_eq!(names, vec!["queued.iso"]);

    let raw = fs::read_to_string(base.join("downloads.json")).unwrap();
    assert!(raw.trim_start().starts_with('['));
}
