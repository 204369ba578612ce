//! Builder for small bundles on disk, for use in tests.

use crate::consts::CONFIG_DB;
use crate::error::{ErrorKind, Result};
use crate::path::entry_name;
use ember_idb::fixtures::Fixture;
use exn::ResultExt;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Describes a bundle that can be written out as a directory or as a backup
/// archive, with identical content either way.
#[derive(Debug, Clone, Default)]
pub struct BundleBuilder {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    database: Option<Fixture>,
}

impl BundleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file. Parent directories are implied.
    ///
    /// Panics on a path that would escape the bundle root: if the test setup
    /// is wrong, the test should not pass.
    pub fn file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        let Ok(name) = entry_name(path) else {
            panic!("BundleBuilder::file: invalid path {path}");
        };
        self.files.insert(name, contents.into());
        self
    }

    /// Add an (empty) directory.
    pub fn dir(mut self, path: &str) -> Self {
        let Ok(name) = entry_name(path) else {
            panic!("BundleBuilder::dir: invalid path {path}");
        };
        self.dirs.insert(name);
        self
    }

    /// Add a configuration database built from a fixture. Takes precedence
    /// over a raw `db_backup_sqlite.idb` added with [`file()`](Self::file).
    pub fn database(mut self, fixture: Fixture) -> Self {
        self.database = Some(fixture);
        self
    }

    /// All files with their contents, the configuration database included.
    async fn contents(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut files = self.files.clone();
        if let Some(fixture) = &self.database {
            let scratch = tempfile::tempdir().map_err(ErrorKind::from)?;
            let path = scratch.path().join(CONFIG_DB);
            fixture.write(&path).await.or_raise(|| ErrorKind::Database)?;
            let bytes = tokio::fs::read(&path).await.map_err(ErrorKind::from)?;
            files.insert(CONFIG_DB.to_string(), bytes);
        }
        Ok(files)
    }

    /// Write the bundle as an unpacked directory, which must not exist yet.
    pub async fn write_directory(&self, root: impl AsRef<Path>) -> Result<PathBuf> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir(&root).await.map_err(ErrorKind::from)?;
        for dir in &self.dirs {
            tokio::fs::create_dir_all(root.join(dir)).await.map_err(ErrorKind::from)?;
        }
        for (name, data) in self.contents().await? {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(ErrorKind::from)?;
            }
            tokio::fs::write(&path, data).await.map_err(ErrorKind::from)?;
        }
        Ok(root)
    }

    /// Write the bundle as a ZIP archive.
    ///
    /// Directory entries are only written for directories added with
    /// [`dir()`](Self::dir); the parents of files are left implicit.
    pub async fn write_archive(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        let files = self.contents().await?;
        let dirs = self.dirs.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let zip_error = |e: zip::result::ZipError| ErrorKind::from(std::io::Error::other(e));
            let mut zip = ZipWriter::new(File::create(&target).map_err(ErrorKind::from)?);
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            for dir in dirs {
                zip.add_directory(format!("{dir}/"), options).map_err(zip_error)?;
            }
            for (name, data) in files {
                zip.start_file(name, options).map_err(zip_error)?;
                zip.write_all(&data).map_err(ErrorKind::from)?;
            }
            zip.finish().map_err(zip_error)?;
            Ok(())
        })
        .await
        .or_raise(|| ErrorKind::Io(std::sync::Arc::new(std::io::Error::other("archive writer task failed"))))??;
        Ok(path)
    }
}
