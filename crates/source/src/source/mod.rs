//! The configuration source abstraction.
//!
//! A bundle is stored either as a gateway backup archive or as an unpacked
//! directory. Both are exposed through [`ConfigSource`], so nothing that
//! consumes a bundle needs to know which one it's looking at.

mod archive;
mod directory;
mod shared;
mod subtree;

pub use self::archive::ArchiveSource;
pub use self::directory::DirectorySource;
pub use self::subtree::Subtree;
use crate::error::{ErrorKind, Result};
use crate::materialize::TempOptions;
use async_trait::async_trait;
use derive_more::Display;
use ember_extract::{Manifest, Properties};
use ember_idb::Database;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Type-erased configuration source, as handed to a
/// [`Bundle`](crate::Bundle).
pub type SourceHandle = Box<dyn ConfigSource>;

/// Which store a source is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SourceKind {
    #[display("archive")]
    Archive,
    #[display("directory")]
    Directory,
}

/// Settings shared by every source opened in a process.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Where materialized database copies go. System temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
    /// File name prefix for materialized database copies.
    pub temp_prefix: String,
    /// Connection pool size for the configuration database.
    pub pool_connections: Option<u32>,
}
impl Default for SourceOptions {
    fn default() -> Self {
        let temp = TempOptions::default();
        Self {
            temp_dir: temp.dir,
            temp_prefix: temp.prefix,
            pool_connections: None,
        }
    }
}
impl SourceOptions {
    pub(crate) fn temp(&self) -> TempOptions {
        TempOptions {
            dir: self.temp_dir.clone(),
            prefix: self.temp_prefix.clone(),
        }
    }
}

/// Uniform, read-only access to the contents of one bundle.
///
/// Every accessor is lazy and memoized for the lifetime of the source: the
/// first call does the work and every later call (including concurrent ones)
/// shares the outcome. A sub-resource that doesn't exist in the bundle is
/// `Ok(None)`; only a sub-resource that exists but can't be used is an error.
///
/// Sources own resources that outlive any single call (an archive handle, a
/// database connection, a temp file), so they must be [closed](Self::close)
/// when no longer needed.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// The path the source was opened from.
    fn path(&self) -> &Path;

    /// The parsed backup manifest (`backupinfo.xml`).
    async fn manifest(&self) -> Result<Option<Arc<Manifest>>>;

    /// The parsed service wrapper configuration (`ignition.conf`).
    async fn ignition_conf(&self) -> Result<Option<Arc<Properties>>>;

    /// The parsed redundancy settings (`redundancy.xml`).
    async fn redundancy(&self) -> Result<Option<Arc<Properties>>>;

    /// The `projects/` directory, if the bundle has one.
    async fn projects<'a>(&'a self) -> Result<Option<Subtree<'a>>>;

    /// The `config/` directory, if the bundle has one.
    async fn config<'a>(&'a self) -> Result<Option<Subtree<'a>>>;

    /// Check whether anything exists at a path relative to the bundle root.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Whether the bundle carries an embedded configuration database.
    ///
    /// An existence check only; nothing is copied or opened.
    async fn has_config_db(&self) -> Result<bool>;

    /// A read-only connection to the embedded configuration database.
    ///
    /// Waits for the database to be fully copied to local disk before opening
    /// it. The connection is owned by the source and closed with it.
    async fn config_db(&self) -> Result<Option<Arc<Database>>>;

    /// Release everything the source holds.
    ///
    /// Every release step is attempted even when an earlier one fails; the
    /// failures are reported together. Idempotent. All accessors fail with
    /// [`Closed`](ErrorKind::Closed) afterwards.
    async fn close(&self) -> Result<()>;
}

/// Open the right kind of source for a path: a directory becomes a
/// [`DirectorySource`], anything else is treated as a backup archive.
///
/// Returns [`UnreadableSource`](ErrorKind::UnreadableSource) if the path
/// doesn't exist or the archive can't be mounted.
pub async fn open_source(path: impl AsRef<Path>, options: &SourceOptions) -> Result<SourceHandle> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path)
        .await
        .or_raise(|| ErrorKind::UnreadableSource(path.to_path_buf()))?;
    let handle: SourceHandle = match metadata.is_dir() {
        true => Box::new(DirectorySource::open(path, options).await?),
        false => Box::new(ArchiveSource::open(path, options).await?),
    };
    Ok(handle)
}
