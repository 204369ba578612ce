use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use crate::tree::{Entry, Tree};
use std::path::{Path, PathBuf};

/// A directory inside a bundle, such as `projects/` or `config/`.
///
/// Paths given to a subtree are relative to its base directory and may not
/// resolve outside of it.
pub struct Subtree<'a> {
    tree: &'a dyn Tree,
    base: PathBuf,
}

impl<'a> Subtree<'a> {
    pub(crate) fn new(tree: &'a dyn Tree, base: impl Into<PathBuf>) -> Self {
        Self { tree, base: base.into() }
    }

    /// The subtree's location, relative to the bundle root.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let resolved = validate_path(self.base.join(path))?;
        if !resolved.starts_with(&self.base) {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        }
        Ok(resolved)
    }

    /// The direct children of the subtree's base directory.
    pub async fn entries(&self) -> Result<Vec<Entry>> {
        self.tree.list(&self.base).await
    }

    pub async fn list(&self, dir: impl AsRef<Path>) -> Result<Vec<Entry>> {
        self.tree.list(&self.resolve(dir.as_ref())?).await
    }

    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Option<Vec<u8>>> {
        self.tree.read(&self.resolve(path.as_ref())?).await
    }

    pub async fn exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        self.tree.exists(&self.resolve(path.as_ref())?).await
    }

    pub async fn is_dir(&self, path: impl AsRef<Path>) -> Result<bool> {
        self.tree.is_dir(&self.resolve(path.as_ref())?).await
    }
}
