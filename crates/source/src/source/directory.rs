use super::shared::Resources;
use super::{ConfigSource, SourceKind, SourceOptions, Subtree};
use crate::error::Result;
use crate::tree::DirectoryTree;
use async_trait::async_trait;
use ember_extract::{Manifest, Properties};
use ember_idb::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An unpacked configuration directory.
///
/// Nothing is read until it's asked for. The configuration database is still
/// copied before it's opened (the original is never touched), but only on
/// the first request for it.
pub struct DirectorySource {
    path: PathBuf,
    resources: Resources,
}

impl DirectorySource {
    pub async fn open(path: impl AsRef<Path>, options: &SourceOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tree = DirectoryTree::new(&path)?;
        tracing::debug!(path = %path.display(), "Opened configuration directory");
        Ok(Self {
            path,
            resources: Resources::new(Box::new(tree), options),
        })
    }
}

#[async_trait]
impl ConfigSource for DirectorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn manifest(&self) -> Result<Option<Arc<Manifest>>> {
        self.resources.manifest().await
    }

    async fn ignition_conf(&self) -> Result<Option<Arc<Properties>>> {
        self.resources.ignition_conf().await
    }

    async fn redundancy(&self) -> Result<Option<Arc<Properties>>> {
        self.resources.redundancy().await
    }

    async fn projects<'a>(&'a self) -> Result<Option<Subtree<'a>>> {
        self.resources.projects().await
    }

    async fn config<'a>(&'a self) -> Result<Option<Subtree<'a>>> {
        self.resources.config().await
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.resources.exists(path).await
    }

    async fn has_config_db(&self) -> Result<bool> {
        self.resources.has_config_db().await
    }

    async fn config_db(&self) -> Result<Option<Arc<Database>>> {
        self.resources.config_db().await
    }

    async fn close(&self) -> Result<()> {
        self.resources.close().await
    }
}
