//! Unpacked configuration directories.

use super::{CopyTask, Entry, Tree};
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::fs::File;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A plain directory on the local filesystem, used as a [`Tree`].
///
/// All paths are relative to the configured root directory. Holds no handle
/// on the directory, so closing it is a no-op.
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    root: PathBuf,
}

impl DirectoryTree {
    /// Returns [`UnreadableSource`](ErrorKind::UnreadableSource) if the root
    /// is not an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            exn::bail!(ErrorKind::UnreadableSource(root));
        }
        Ok(Self { root })
    }

    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            IoErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            _ => ErrorKind::from(e),
        }
    }

    async fn is_file(path: &Path) -> Result<bool> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::map_io_error(e, path).into()),
        }
    }
}

#[async_trait]
impl Tree for DirectoryTree {
    fn location(&self) -> &Path {
        &self.root
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = self.absolute_path(path)?;
        fs::try_exists(&path).await.map_err(|e| Self::map_io_error(e, &path).into())
    }

    async fn is_dir(&self, path: &Path) -> Result<bool> {
        let path = self.absolute_path(path)?;
        match fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_dir()),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::map_io_error(e, &path).into()),
        }
    }

    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let path = self.absolute_path(path)?;
        if !Self::is_file(&path).await? {
            return Ok(None);
        }
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            // Deleted between the check and the read.
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::map_io_error(e, &path).into()),
        }
    }

    async fn list(&self, dir: &Path) -> Result<Vec<Entry>> {
        let dir = self.absolute_path(dir)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if matches!(e.kind(), IoErrorKind::NotFound | IoErrorKind::NotADirectory) => {
                return Ok(Vec::new());
            },
            Err(e) => exn::bail!(Self::map_io_error(e, &dir)),
        };
        let mut listing = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, &dir))? {
            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!(path = %entry.path().display(), "Skipping entry with non-UTF8 name");
                continue;
            };
            // Follows symlinks; broken ones are silently dropped.
            let Ok(metadata) = fs::metadata(entry.path()).await else {
                continue;
            };
            listing.push(Entry { name, is_dir: metadata.is_dir() });
        }
        listing.sort();
        Ok(listing)
    }

    fn copy_task(&self, path: &Path) -> Result<Option<CopyTask>> {
        let path = self.absolute_path(path)?;
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(Box::new(move |target: &mut File| -> Result<u64> {
            let mut source = File::open(&path).map_err(|e| Self::map_io_error(e, &path))?;
            let copied = std::io::copy(&mut source, target).map_err(ErrorKind::from)?;
            Ok(copied)
        })))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
