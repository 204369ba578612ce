use super::shared::Resources;
use super::{ConfigSource, SourceKind, SourceOptions, Subtree};
use crate::error::Result;
use crate::tree::ArchiveTree;
use async_trait::async_trait;
use ember_extract::{Manifest, Properties};
use ember_idb::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// A gateway backup archive (`.gwbk`).
///
/// Opening one does more work up front than a directory: the archive is
/// mounted, the copy of the configuration database starts in the background
/// straight away, and the manifest is read while that copy runs. A manifest
/// that can't be parsed doesn't fail the open; the error is kept and
/// reported by [`manifest()`](ConfigSource::manifest).
pub struct ArchiveSource {
    path: PathBuf,
    resources: Resources,
}

impl ArchiveSource {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>, options: &SourceOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tree = ArchiveTree::mount(&path).await?;
        let resources = Resources::new(Box::new(tree), options);
        if resources.materialize().await? {
            tracing::debug!("Started copying configuration database");
        }
        // The outcome (including a parse failure) stays in the memo.
        if resources.manifest().await.is_err() {
            tracing::debug!("Deferring manifest error until it is requested");
        }
        Ok(Self { path, resources })
    }
}

#[async_trait]
impl ConfigSource for ArchiveSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Archive
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
