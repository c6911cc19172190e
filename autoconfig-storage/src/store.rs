//! File-system access for profile documents.

use crate::error::{StorageError, StorageResult};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

enum WriteJob {
    Write { path: PathBuf, content: String },
    Flush(Sender<()>),
}

/// Read/write/exists/mkdir/delete over profile files, with a background
/// writer for detached saves.
///
/// Cloning is cheap; clones share the same writer, so writes submitted from
/// any clone land in submission order.
#[derive(Clone, Default)]
pub struct ProfileStore {
    writer: Arc<Mutex<Option<Sender<WriteJob>>>>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Reads the whole file. An absent file is `Ok(None)`, not an error.
    pub fn read(&self, path: &Path) -> StorageResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates the parent directory of `path` (recursively) if missing.
    pub fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })
    }

    /// Writes `content` and waits for it.
    pub fn write(&self, path: &Path, content: &str) -> StorageResult<()> {
        self.ensure_parent_dir(path)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Creates the parent directory, then queues the write and returns
    /// without waiting for it. Failures of the write itself are logged.
    pub fn write_detached(&self, path: &Path, content: String) -> StorageResult<()> {
        self.ensure_parent_dir(path)?;

        let job = WriteJob::Write {
            path: path.to_path_buf(),
            content,
        };
        let job = match self.sender() {
            Some(sender) => match sender.send(job) {
                Ok(()) => return Ok(()),
                Err(mpsc::SendError(job)) => job,
            },
            None => job,
        };

        // No writer thread available: fall back to a blocking write.
        if let WriteJob::Write { path, content } = job {
            warn!(path = %path.display(), "Profile writer unavailable, writing synchronously");
            fs::write(&path, content)?;
        }
        Ok(())
    }

    /// Deletes the file after pending writes have landed. Returns whether a
    /// file was removed.
    pub fn delete(&self, path: &Path) -> StorageResult<bool> {
        self.flush();
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Blocks until every write queued so far has been applied.
    pub fn flush(&self) {
        let sender = {
            let guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            guard.clone()
        };
        let Some(sender) = sender else {
            return;
        };
        let (ack_tx, ack_rx) = mpsc::channel();
        if sender.send(WriteJob::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    fn sender(&self) -> Option<Sender<WriteJob>> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            let (tx, rx) = mpsc::channel();
            match std::thread::Builder::new()
                .name("autoconfig-writer".to_string())
                .spawn(move || run_writer(rx))
            {
                Ok(_) => *guard = Some(tx),
                Err(e) => {
                    warn!(error = %e, "Failed to start profile writer thread");
                    return None;
                }
            }
        }
        guard.clone()
    }
}

fn run_writer(jobs: Receiver<WriteJob>) {
    for job in jobs {
        match job {
            WriteJob::Write { path, content } => match fs::write(&path, &content) {
                Ok(()) => debug!(path = %path.display(), bytes = content.len(), "Profile written"),
                Err(e) => warn!(path = %path.display(), error = %e, "Detached profile write failed"),
            },
            WriteJob::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

impl fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let running = self
            .writer
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false);
        f.debug_struct("ProfileStore")
            .field("writer_running", &running)
            .finish()
    }
}
