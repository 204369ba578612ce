//! Private local copies of the embedded configuration database.
//!
//! SQLite can only open a real file, and the database inside an archive is
//! just a compressed entry. Even in a directory the original must not be
//! touched, so both kinds of source copy it into a temp file first.
//!
//! The copy runs on a blocking thread, and that thread owns the temp file
//! until it finishes. Whoever wants the copy awaits the task; nobody can see
//! a half-written file, and dropping the owner mid-copy never deletes a file
//! that is still being written.

use crate::error::{ErrorKind, Result};
use crate::tree::CopyTask;
use exn::ResultExt;
use std::path::PathBuf;
use tempfile::TempPath;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::instrument;

/// Where and how temp copies are created.
#[derive(Debug, Clone)]
pub(crate) struct TempOptions {
    /// Directory to create temp files in. System default when `None`.
    pub dir: Option<PathBuf>,
    /// File name prefix, so that leftovers are recognisable.
    pub prefix: String,
}
impl Default for TempOptions {
    fn default() -> Self {
        Self { dir: None, prefix: "ember-".to_string() }
    }
}

type CopyHandle = JoinHandle<Result<(TempPath, u64)>>;

enum State {
    /// Nothing scheduled yet.
    Idle,
    Copying(CopyHandle),
    Ready(TempPath),
    /// The copy failed; the temp file is already gone.
    Failed,
    Released,
}

/// One materialization of one file, from scheduling through deletion.
pub(crate) struct Materialization {
    options: TempOptions,
    state: Mutex<State>,
}

impl Materialization {
    pub(crate) fn new(options: TempOptions) -> Self {
        Self { options, state: Mutex::new(State::Idle) }
    }

    /// Schedule the copy, unless one has been scheduled before.
    ///
    /// Returns immediately; the copy itself happens in the background.
    pub(crate) async fn start(&self, task: CopyTask) {
        let mut state = self.state.lock().await;
        if matches!(*state, State::Idle) {
            *state = State::Copying(spawn(task, self.options.clone()));
        }
    }

    /// Whether a copy has been scheduled at any point.
    #[cfg(test)]
    pub(crate) async fn is_started(&self) -> bool {
        !matches!(*self.state.lock().await, State::Idle)
    }

    /// Wait for the copy to finish, and return the path of the temp file.
    ///
    /// Cancel-safe: dropping the returned future leaves the copy running and
    /// a later call picks it up again.
    pub(crate) async fn wait(&self) -> Result<PathBuf> {
        let mut state = self.state.lock().await;
        match &mut *state {
            State::Idle => exn::bail!(ErrorKind::Materialization),
            State::Ready(temp) => return Ok(temp.to_path_buf()),
            State::Failed => exn::bail!(ErrorKind::Materialization),
            State::Released => exn::bail!(ErrorKind::Closed),
            State::Copying(handle) => {
                let outcome = handle.await;
                match outcome {
                    Ok(Ok((temp, size))) => {
                        tracing::debug!(path = %temp.display(), size, "Materialized database");
                        let path = temp.to_path_buf();
                        *state = State::Ready(temp);
                        Ok(path)
                    },
                    Ok(Err(err)) => {
                        *state = State::Failed;
                        Err(err.raise(ErrorKind::Materialization))
                    },
                    Err(join) => {
                        *state = State::Failed;
                        Err::<PathBuf, _>(join).or_raise(|| ErrorKind::Materialization)
                    },
                }
            },
        }
    }

    /// Delete the temp file, first waiting for an in-flight copy to finish.
    ///
    /// Idempotent; only the first call does any work.
    #[instrument(level = "debug", skip(self))]
    pub(crate) async fn release(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let temp = match std::mem::replace(&mut *state, State::Released) {
            State::Copying(handle) => match handle.await {
                Ok(Ok((temp, _))) => temp,
                // A failed copy has already cleaned up after itself.
                Ok(Err(_)) => return Ok(()),
                Err(join) => return Err::<(), _>(join).or_raise(|| ErrorKind::Materialization),
            },
            State::Ready(temp) => temp,
            State::Idle | State::Failed | State::Released => return Ok(()),
        };
        let path = temp.to_path_buf();
        temp.close().map_err(ErrorKind::from)?;
        tracing::debug!(path = %path.display(), "Deleted materialized database");
        Ok(())
    }
}

fn spawn(task: CopyTask, options: TempOptions) -> CopyHandle {
    tokio::task::spawn_blocking(move || -> Result<(TempPath, u64)> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&options.prefix).suffix(".idb");
        let file = match &options.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(ErrorKind::from)?;
        let (mut file, temp) = file.into_parts();
        // On failure `temp` is dropped here, which removes the partial copy.
        let size = task(&mut file)?;
        file.sync_all().map_err(ErrorKind::from)?;
        Ok((temp, size))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn copy_file(path: &Path) -> CopyTask {
        let path = path.to_path_buf();
        Box::new(move |target: &mut std::fs::File| -> Result<u64> {
            let mut source = std::fs::File::open(&path).map_err(ErrorKind::from)?;
            Ok(std::io::copy(&mut source, target).map_err(ErrorKind::from)?)
        })
    }

    fn options(dir: &Path) -> TempOptions {
        TempOptions { dir: Some(dir.to_path_buf()), prefix: "test-".to_string() }
    }

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.file_name().unwrap().to_string_lossy().starts_with("test-"))
            .collect()
    }

    #[tokio::test]
    async fn test_copy_then_release() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("source.idb");
        std::fs::write(&source, b"SQLite format 3\0").unwrap();

        let materialization = Materialization::new(options(temp_dir.path()));
        assert!(!materialization.is_started().await);
        materialization.start(copy_file(&source)).await;
        assert!(materialization.is_started().await);

        let path = materialization.wait().await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"SQLite format 3\0");
        assert!(path.extension().is_some_and(|ext| ext == "idb"));
        // Waiting again returns the same file without copying again
        assert_eq!(materialization.wait().await.unwrap(), path);

        materialization.release().await.unwrap();
        assert!(!path.exists());
        assert!(temp_files(temp_dir.path()).is_empty());
        // Idempotent
        materialization.release().await.unwrap();
        assert!(matches!(&*materialization.wait().await.unwrap_err(), ErrorKind::Closed));
    }

    #[tokio::test]
    async fn test_wait_without_start() {
        let materialization = Materialization::new(TempOptions::default());
        let err = materialization.wait().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Materialization));
        materialization.release().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_nothing_behind() {
        let temp_dir = tempfile::tempdir().unwrap();
        let materialization = Materialization::new(options(temp_dir.path()));
        materialization.start(copy_file(&temp_dir.path().join("missing.idb"))).await;
        let err = materialization.wait().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Materialization));
        assert!(temp_files(temp_dir.path()).is_empty());
        // The failure is remembered
        assert!(materialization.wait().await.is_err());
        materialization.release().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_release_waits_for_copy_in_flight() {
        let temp_dir = tempfile::tempdir().unwrap();
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let materialization = Materialization::new(options(temp_dir.path()));
        materialization
            .start(Box::new(move |target: &mut std::fs::File| -> Result<u64> {
                std::thread::sleep(Duration::from_millis(200));
                std::io::Write::write_all(target, b"slow").map_err(ErrorKind::from)?;
                flag.store(true, Ordering::SeqCst);
                Ok(4)
            }))
            .await;
        materialization.release().await.unwrap();
        assert!(finished.load(Ordering::SeqCst));
        assert!(temp_files(temp_dir.path()).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancelled_wait_keeps_copy_alive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let materialization = Materialization::new(options(temp_dir.path()));
        materialization
            .start(Box::new(|target: &mut std::fs::File| -> Result<u64> {
                std::thread::sleep(Duration::from_millis(200));
                std::io::Write::write_all(target, b"slow").map_err(ErrorKind::from)?;
                Ok(4)
            }))
            .await;
        let early = tokio::time::timeout(Duration::from_millis(10), materialization.wait()).await;
        assert!(early.is_err());
        let path = materialization.wait().await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"slow");
        materialization.release().await.unwrap();
    }
}
