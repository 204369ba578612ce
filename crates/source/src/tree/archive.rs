//! Gateway backups (`.gwbk`) mounted as a read-only tree.
//!
//! A backup is an ordinary ZIP archive. Mounting parses the central directory
//! once and indexes every entry name; directory structure is inferred from
//! those names because archivers aren't obliged to write directory entries.

use super::{CopyTask, Entry, Tree};
use crate::error::{ErrorKind, Result};
use crate::path::{entry_name, normalize_entry_name};
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::instrument;
use zip::ZipArchive;

type SharedArchive = Arc<Mutex<Option<ZipArchive<File>>>>;

/// A ZIP archive mounted as a [`Tree`].
///
/// The archive's file handle stays open until [`close()`](Tree::close) is
/// called.
pub struct ArchiveTree {
    path: PathBuf,
    /// Normalized entry name to the raw name stored in the archive.
    files: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
    archive: SharedArchive,
}

impl ArchiveTree {
    /// Open and index the archive at the given path.
    ///
    /// Returns [`UnreadableSource`](ErrorKind::UnreadableSource) if the file
    /// doesn't exist or isn't a readable ZIP archive.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn mount(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let unreadable = || ErrorKind::UnreadableSource(path.clone());
        let mounting = path.clone();
        let archive = tokio::task::spawn_blocking(move || -> Result<ZipArchive<File>> {
            let file = File::open(&mounting).or_raise(|| ErrorKind::UnreadableSource(mounting.clone()))?;
            let archive = ZipArchive::new(file).or_raise(|| ErrorKind::UnreadableSource(mounting.clone()))?;
            Ok(archive)
        })
        .await
        .or_raise(unreadable)??;

        let mut files = BTreeMap::new();
        let mut dirs = BTreeSet::new();
        for raw in archive.file_names() {
            let Some(name) = normalize_entry_name(raw) else {
                tracing::warn!(entry = raw, "Ignoring archive entry with unusable name");
                continue;
            };
            let mut ancestor = name.as_str();
            while let Some((parent, _)) = ancestor.rsplit_once('/') {
                dirs.insert(parent.to_string());
                ancestor = parent;
            }
            if raw.ends_with('/') || raw.ends_with('\\') {
                dirs.insert(name);
            } else {
                files.insert(name, raw.to_string());
            }
        }
        tracing::debug!(files = files.len(), dirs = dirs.len(), "Mounted archive");

        Ok(Self {
            path,
            files,
            dirs,
            archive: Arc::new(Mutex::new(Some(archive))),
        })
    }

    fn lock(archive: &SharedArchive) -> MutexGuard<'_, Option<ZipArchive<File>>> {
        // The guarded value is only ever replaced wholesale; a panic mid-read
        // can't leave it half-updated.
        archive.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<()> {
        if Self::lock(&self.archive).is_none() {
            exn::bail!(ErrorKind::Closed);
        }
        Ok(())
    }

    /// Number of files (not directories) in the archive.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl Tree for ArchiveTree {
    fn location(&self) -> &Path {
        &self.path
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.ensure_open()?;
        let name = entry_name(path)?;
        Ok(self.files.contains_key(&name) || self.dirs.contains(&name))
    }

    async fn is_dir(&self, path: &Path) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.dirs.contains(&entry_name(path)?))
    }

    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        let name = entry_name(path)?;
        let Some(raw) = self.files.get(&name).cloned() else {
            return Ok(None);
        };
        let archive = Arc::clone(&self.archive);
        tokio::task::spawn_blocking(move || -> Result<Option<Vec<u8>>> {
            let mut guard = Self::lock(&archive);
            let archive = guard.as_mut().ok_or_raise(|| ErrorKind::Closed)?;
            let mut entry = archive.by_name(&raw).or_raise(|| ErrorKind::NotFound(PathBuf::from(&raw)))?;
            let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
            entry.read_to_end(&mut data).map_err(ErrorKind::from)?;
            Ok(Some(data))
        })
        .await
        .or_raise(|| ErrorKind::Io(Arc::new(std::io::Error::other("archive read task failed"))))?
    }

    async fn list(&self, dir: &Path) -> Result<Vec<Entry>> {
        self.ensure_open()?;
        let prefix = format!("{}/", entry_name(dir)?);
        let mut entries: Vec<Entry> = children(self.dirs.range(prefix.clone()..), &prefix, true)
            .chain(children(self.files.keys(), &prefix, false))
            .collect();
        entries.sort();
        Ok(entries)
    }

    fn copy_task(&self, path: &Path) -> Result<Option<CopyTask>> {
        self.ensure_open()?;
        let Some(raw) = self.files.get(&entry_name(path)?).cloned() else {
            return Ok(None);
        };
        let archive_path = self.path.clone();
        // A second handle, so that a long copy never holds up reads through
        // the mounted one.
        Ok(Some(Box::new(move |target: &mut File| -> Result<u64> {
            let file = File::open(&archive_path).map_err(ErrorKind::from)?;
            let mut archive = ZipArchive::new(file).or_raise(|| ErrorKind::UnreadableSource(archive_path.clone()))?;
            let mut entry = archive.by_name(&raw).or_raise(|| ErrorKind::NotFound(PathBuf::from(&raw)))?;
            let copied = std::io::copy(&mut entry, target).map_err(ErrorKind::from)?;
            Ok(copied)
        })))
    }

    async fn close(&self) -> Result<()> {
        if Self::lock(&self.archive).take().is_some() {
            tracing::debug!(path = %self.path.display(), "Unmounted archive");
        }
        Ok(())
    }
}

/// Direct children of the directory `prefix` (which ends with `/`), from a
/// sorted list of entry names.
fn children<'a>(
    names: impl Iterator<Item = &'a String> + 'a,
    prefix: &'a str,
    is_dir: bool,
) -> impl Iterator<Item = Entry> + 'a {
    names
        .skip_while(move |name| !name.starts_with(prefix))
        .take_while(move |name| name.starts_with(prefix))
        .filter_map(move |name| {
            let rest = &name[prefix.len()..];
            (!rest.contains('/')).then(|| Entry { name: rest.to_string(), is_dir })
        })
}
