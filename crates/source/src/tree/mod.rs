//! Read-only file trees that a configuration source is backed by.
//!
//! A [`Tree`] is a glorified read-only filesystem: existence checks, reads,
//! and single-level listings, all relative to the bundle root. Which store
//! sits behind it (a mounted ZIP archive or a plain directory) is invisible
//! to everything above this module.

mod archive;
mod directory;

pub use self::archive::ArchiveTree;
pub use self::directory::DirectoryTree;
use crate::error::Result;
use async_trait::async_trait;
use std::fs::File;
use std::path::Path;

/// A blocking copy of one file out of a tree, into a local file.
///
/// Owns everything it needs so that it can be moved onto a blocking thread
/// and outlive the borrow of the tree that created it. Returns the number of
/// bytes copied.
pub type CopyTask = Box<dyn FnOnce(&mut File) -> Result<u64> + Send + 'static>;

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Entry {
    /// File name (the last path component only).
    pub name: String,
    pub is_dir: bool,
}
impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_dir: false }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_dir: true }
    }
}

/// Unified read-only interface over the stores a bundle can live in.
///
/// # Path Handling
/// All paths are relative to the bundle root and are validated using
/// [`validate_path`](crate::validate_path) by the implementation. Missing
/// paths are never an error: `exists` is `false`, `read` is `None` and
/// `list` is empty.
#[async_trait]
pub trait Tree: Send + Sync {
    /// Location of the store on disk, for logging and display.
    fn location(&self) -> &Path;

    async fn exists(&self, path: &Path) -> Result<bool>;

    async fn is_dir(&self, path: &Path) -> Result<bool>;

    /// Read the full contents of a file, or `None` if there's no file at
    /// that path.
    async fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// List the direct children of a directory, sorted by name.
    async fn list(&self, dir: &Path) -> Result<Vec<Entry>>;

    /// Prepare a blocking copy of a file, or `None` if there's no file at
    /// that path.
    fn copy_task(&self, path: &Path) -> Result<Option<CopyTask>>;

    /// Release any handle the tree holds on its store.
    ///
    /// Idempotent. Every other operation fails with
    /// [`Closed`](crate::error::ErrorKind::Closed) afterwards, for trees that
    /// hold a handle.
    async fn close(&self) -> Result<()>;
}
