//! Background worker
//!
//! Runs an [`Organizer`] on a tokio blocking thread and feeds it commands
//! from a channel, so an event loop can import or delete without blocking.
//! Commands run one at a time in arrival order.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::category::{CategoryId, CategoryStore};
use crate::config::ConflictPolicy;
use crate::delete::DeleteReport;
use crate::error::{Result, SortifyError};
use crate::import::{ImportMode, ImportReport};
use crate::ledger::FileRecord;
use crate::organizer::Organizer;

const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T>>;

#[derive(Debug)]
pub enum Command {
    Import {
        files: Vec<PathBuf>,
        mode: ImportMode,
        policy: ConflictPolicy,
        reply: Reply<ImportReport>,
    },
    AddCategory {
        parent: Option<CategoryId>,
        name: String,
        reply: Reply<CategoryId>,
    },
    DeleteCategory {
        id: CategoryId,
        reply: Reply<DeleteReport>,
    },
    DeleteRecords {
        indices: Vec<usize>,
        reply: Reply<usize>,
    },
    RemoveCompleted {
        reply: Reply<usize>,
    },
    AddRecord {
        record: FileRecord,
        reply: Reply<()>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
}

/// Point-in-time copy of the organizer state for rendering
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub categories: CategoryStore,
    pub records: Vec<FileRecord>,
}

/// Cheap, cloneable sender side of the worker
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    cmd_tx: mpsc::Sender<Command>,
}

/// A running worker. Dropping it without [`Worker::shutdown`] detaches the
/// task; it still flushes once the last handle is gone.
#[derive(Debug)]
pub struct Worker {
    handle: WorkerHandle,
    join: JoinHandle<Organizer>,
}

/// Move `organizer` onto a blocking task. Must be called inside a tokio
/// runtime.
pub fn spawn(organizer: Organizer) -> Worker {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let join = tokio::task::spawn_blocking(move || run(organizer, cmd_rx));
    Worker {
        handle: WorkerHandle { cmd_tx },
        join,
    }
}

impl Worker {
    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    /// Stop accepting commands and wait for the organizer back.
    ///
    /// Waits until every cloned [`WorkerHandle`] has been dropped too.
    pub async fn shutdown(self) -> Result<Organizer> {
        drop(self.handle);
        self.join
            .await
            .map_err(|e| SortifyError::Worker(e.to_string()))
    }
}

impl WorkerHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| SortifyError::Worker("command channel closed".to_string()))?;
        rx.await
            .map_err(|_| SortifyError::Worker("reply dropped".to_string()))
    }

    /// Import `files`. Conflicts follow `policy`; `Ask` has nobody to ask
    /// here and keeps the existing file.
    pub async fn import(
        &self,
        files: Vec<PathBuf>,
        mode: ImportMode,
        policy: ConflictPolicy,
    ) -> Result<ImportReport> {
        self.request(|reply| Command::Import {
            files,
            mode,
            policy,
            reply,
        })
        .await?
    }

    pub async fn add_category(
        &self,
        parent: Option<CategoryId>,
        name: impl Into<String>,
    ) -> Result<CategoryId> {
        let name = name.into();
        self.request(|reply| Command::AddCategory {
            parent,
            name,
            reply,
        })
        .await?
    }

    pub async fn delete_category(&self, id: CategoryId) -> Result<DeleteReport> {
        self.request(|reply| Command::DeleteCategory { id, reply })
            .await?
    }

    pub async fn delete_records(&self, indices: Vec<usize>) -> Result<usize> {
        self.request(|reply| Command::DeleteRecords { indices, reply })
            .await?
    }

    pub async fn remove_completed(&self) -> Result<usize> {
        self.request(|reply| Command::RemoveCompleted { reply })
            .await?
    }

    pub async fn add_record(&self, record: FileRecord) -> Result<()> {
        self.request(|reply| Command::AddRecord { record, reply })
            .await?
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }
}

fn run(mut organizer: Organizer, mut cmd_rx: mpsc::Receiver<Command>) -> Organizer {
    debug!("worker started");
    while let Some(cmd) = cmd_rx.blocking_recv() {
        // A dropped receiver only means the caller stopped waiting.
        match cmd {
            Command::Import {
                files,
                mode,
                policy,
                reply,
            } => {
                let overwrite = policy == ConflictPolicy::Overwrite;
                let result = organizer.import_files(
                    &files,
                    &mode,
                    &mut |conflict| {
                        debug!(
                            destination = %conflict.destination.display(),
                            overwrite,
                            "resolved import conflict by policy"
                        );
                        overwrite
                    },
                    None,
                );
                let _ = reply.send(result);
            }
            Command::AddCategory {
                parent,
                name,
                reply,
            } => {
                let _ = reply.send(organizer.add_category(parent, &name));
            }
            Command::DeleteCategory { id, reply } => {
                let _ = reply.send(organizer.delete_category(id));
            }
            Command::DeleteRecords { indices, reply } => {
                let _ = reply.send(organizer.delete_records(&indices));
            }
            Command::RemoveCompleted { reply } => {
                let _ = reply.send(organizer.remove_completed());
            }
            Command::AddRecord { record, reply } => {
                let _ = reply.send(organizer.add_record(record));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(Snapshot {
                    categories: organizer.categories().clone(),
                    records: organizer.records().to_vec(),
                });
            }
        }
    }

    if let Err(e) = organizer.flush() {
        warn!("final flush failed: {}", e);
    }
    debug!("worker stopped");
    organizer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ledger::STATUS_COMPLETED;
    use std::fs;
    use tempfile::TempDir;

    fn organizer(tmp: &TempDir) -> Organizer {
        Organizer::open(&tmp.path().join("base"), &Config::default()).unwrap()
    }

    fn inbox_file(tmp: &TempDir, name: &str, content: &str) -> PathBuf {
        let dir = tmp.path().join("inbox");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_import_then_snapshot_and_shutdown() {
        let tmp = TempDir::new().unwrap();
        let file = inbox_file(&tmp, "clip.mkv", "frames");
        let worker = spawn(organizer(&tmp));
        let handle = worker.handle();

        let report = handle
            .import(vec![file], ImportMode::ByExtension, ConflictPolicy::Ask)
            .await
            .unwrap();
        assert_eq!(report.imported, 1);

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.records.len(), 1);
        assert!(snapshot.records[0].absolute_path.ends_with("clip.mkv"));

        drop(handle);
        let organizer = worker.shutdown().await.unwrap();
        assert_eq!(organizer.records().len(), 1);
        assert!(tmp.path().join("base/All Downloads/Video/clip.mkv").is_file());
    }

    #[tokio::test]
    async fn test_conflict_policy_applies() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("base/All Downloads/Documents");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("a.txt"), "old").unwrap();
        let file = inbox_file(&tmp, "a.txt", "new");

        let worker = spawn(organizer(&tmp));
        let handle = worker.handle();

        let report = handle
            .import(vec![file.clone()], ImportMode::ByExtension, ConflictPolicy::Ask)
            .await
            .unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "old");

        let report = handle
            .import(vec![file], ImportMode::ByExtension, ConflictPolicy::Overwrite)
            .await
            .unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "new");

        drop(handle);
        worker.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_adds_are_serialized() {
        let tmp = TempDir::new().unwrap();
        let worker = spawn(organizer(&tmp));
        let a = worker.handle();
        let b = worker.handle();
        let downloads = a.snapshot().await.unwrap().categories.downloads_group();

        let (first, second) = tokio::join!(
            a.add_category(Some(downloads), "Games"),
            b.add_category(Some(downloads), "games"),
        );
        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(SortifyError::DuplicateCategory { .. }))));

        drop((a, b));
        let organizer = worker.shutdown().await.unwrap();
        assert_eq!(organizer.categories().custom_names().len(), 1);
    }

    #[tokio::test]
    async fn test_results_match_direct_api() {
        let tmp = TempDir::new().unwrap();
        let worker = spawn(organizer(&tmp));
        let handle = worker.handle();

        handle
            .add_record(FileRecord::new("done.iso", STATUS_COMPLETED))
            .await
            .unwrap();
        handle
            .add_record(FileRecord::new("queued.iso", "Queued"))
            .await
            .unwrap();
        assert_eq!(handle.remove_completed().await.unwrap(), 1);
        assert_eq!(handle.remove_completed().await.unwrap(), 0);
        assert!(matches!(
            handle.delete_records(vec![4]).await,
            Err(SortifyError::RecordIndexOutOfRange { index: 4, len: 1 })
        ));

        let snapshot = handle.snapshot().await.unwrap();
        let video = snapshot.categories.resolve("Video").unwrap();
        handle.delete_category(video).await.unwrap();
        assert!(matches!(
            handle.delete_category(video).await,
            Err(SortifyError::CategoryNotFound { .. })
        ));

        drop(handle);
        let organizer = worker.shutdown().await.unwrap();
        assert_eq!(organizer.records().len(), 1);
    }
}
