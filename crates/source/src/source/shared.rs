//! State and behaviour common to every kind of source.

use super::{SourceOptions, Subtree};
use crate::consts::{CONFIG_DB, CONFIG_DIR, IGNITION_CONF, MANIFEST, PROJECTS_DIR, REDUNDANCY};
use crate::error::{ErrorKind, Result};
use crate::materialize::Materialization;
use crate::memo::Memo;
use crate::tree::Tree;
use ember_extract::{Manifest, Properties};
use ember_idb::Database;
use exn::ResultExt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::instrument;

pub(super) struct Resources {
    tree: Box<dyn Tree>,
    options: SourceOptions,
    manifest: Memo<Manifest>,
    ignition_conf: Memo<Properties>,
    redundancy: Memo<Properties>,
    database: Memo<Database>,
    materialization: Materialization,
    closed: AtomicBool,
}

impl Resources {
    pub(super) fn new(tree: Box<dyn Tree>, options: &SourceOptions) -> Self {
        Self {
            tree,
            options: options.clone(),
            manifest: Memo::new(),
            ignition_conf: Memo::new(),
            redundancy: Memo::new(),
            database: Memo::new(),
            materialization: Materialization::new(options.temp()),
            closed: AtomicBool::new(false),
        }
    }

    pub(super) fn tree(&self) -> &dyn Tree {
        &*self.tree
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            exn::bail!(ErrorKind::Closed);
        }
        Ok(())
    }

    async fn load_manifest(&self) -> Result<Option<Manifest>> {
        let Some(bytes) = self.tree.read(Path::new(MANIFEST)).await? else {
            return Ok(None);
        };
        let manifest = Manifest::parse(bytes).map_err(|err| {
            let reason = (*err).to_string();
            err.raise(ErrorKind::MalformedManifest(reason))
        })?;
        Ok(Some(manifest))
    }

    async fn load_properties(&self, file: &'static str, xml: bool) -> Result<Option<Properties>> {
        let Some(bytes) = self.tree.read(Path::new(file)).await? else {
            return Ok(None);
        };
        let parsed = match xml {
            true => Properties::parse_xml(bytes),
            false => Properties::parse(bytes),
        };
        let properties = parsed.map_err(|err| {
            let reason = (*err).to_string();
            err.raise(ErrorKind::MalformedProperties { file, reason })
        })?;
        Ok(Some(properties))
    }

    pub(super) async fn manifest(&self) -> Result<Option<Arc<Manifest>>> {
        self.ensure_open()?;
        self.manifest.get_or_init(MANIFEST, || self.load_manifest()).await
    }

    pub(super) async fn ignition_conf(&self) -> Result<Option<Arc<Properties>>> {
        self.ensure_open()?;
        self.ignition_conf
            .get_or_init(IGNITION_CONF, || self.load_properties(IGNITION_CONF, false))
            .await
    }

    pub(super) async fn redundancy(&self) -> Result<Option<Arc<Properties>>> {
        self.ensure_open()?;
        self.redundancy
            .get_or_init(REDUNDANCY, || self.load_properties(REDUNDANCY, true))
            .await
    }

    async fn subtree(&self, dir: &'static str) -> Result<Option<Subtree<'_>>> {
        self.ensure_open()?;
        match self.tree.is_dir(Path::new(dir)).await? {
            true => Ok(Some(Subtree::new(self.tree(), dir))),
            false => Ok(None),
        }
    }

    pub(super) async fn projects(&self) -> Result<Option<Subtree<'_>>> {
        self.subtree(PROJECTS_DIR).await
    }

    pub(super) async fn config(&self) -> Result<Option<Subtree<'_>>> {
        self.subtree(CONFIG_DIR).await
    }

    pub(super) async fn exists(&self, path: &Path) -> Result<bool> {
        self.ensure_open()?;
        self.tree.exists(path).await
    }

    pub(super) async fn has_config_db(&self) -> Result<bool> {
        self.exists(Path::new(CONFIG_DB)).await
    }

    /// Schedule the copy of the configuration database, if the bundle has
    /// one. Returns whether it does.
    ///
    /// Calling this more than once never schedules a second copy.
    pub(super) async fn materialize(&self) -> Result<bool> {
        match self.tree.copy_task(Path::new(CONFIG_DB))? {
            Some(task) => {
                self.materialization.start(task).await;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    pub(super) async fn config_db(&self) -> Result<Option<Arc<Database>>> {
        self.ensure_open()?;
        self.database
            .get_or_init(CONFIG_DB, || async move {
                if !self.materialize().await? {
                    return Ok(None);
                }
                let waited = self.materialization.wait().await;
                self.ensure_open()?;
                let opened = Database::open_with(&waited?, self.options.pool_connections).await;
                // `close()` may have run while the connection was being opened.
                if let Err(closed) = self.ensure_open() {
                    if let Ok(database) = &opened {
                        database.close().await;
                    }
                    return Err(closed);
                }
                let database = opened.or_raise(|| ErrorKind::Database)?;
                Ok(Some(database))
            })
            .await
    }

    /// Unmount, then disconnect, then delete the temp copy.
    #[instrument(level = "debug", skip(self), fields(location = %self.tree.location().display()))]
    pub(super) async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut failures = Vec::new();
        if let Err(err) = self.tree.close().await {
            tracing::warn!(error = ?err, "Failed to unmount configuration source");
            failures.push((*err).to_string());
        }
        if let Some(database) = self.database.peek() {
            database.close().await;
        }
        if let Err(err) = self.materialization.release().await {
            tracing::warn!(error = ?err, "Failed to delete materialized database");
            failures.push((*err).to_string());
        }
        match failures.is_empty() {
            true => Ok(()),
            false => exn::bail!(ErrorKind::Release(failures.join("; "))),
        }
    }
}
