//! The bundle façade handed to statistics code.

use crate::consts::BUNDLE_MARKERS;
use crate::error::{ErrorKind, Result};
use crate::source::{ConfigSource, SourceHandle, SourceKind, SourceOptions, Subtree, open_source};
use ember_extract::{Manifest, Properties};
use ember_idb::Database;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// One gateway configuration bundle, whatever it's stored as.
///
/// A thin wrapper over a [`ConfigSource`] that adds the bundle's identity.
/// Every data accessor is forwarded to the source unchanged, so the same
/// memoization and absence rules apply.
pub struct Bundle {
    source: SourceHandle,
    display_name: String,
}

impl Bundle {
    /// Open the bundle at a path, picking the source kind from what's there.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>, options: &SourceOptions) -> Result<Self> {
        let source = open_source(path, options).await?;
        Ok(Self::from_source(source))
    }

    pub fn from_source(source: SourceHandle) -> Self {
        let path = source.path();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { source, display_name }
    }

    /// Final component of the path the bundle was opened from.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// For display only; nothing should behave differently based on this.
    pub fn is_archive(&self) -> bool {
        self.kind() == SourceKind::Archive
    }

    pub fn source(&self) -> &dyn ConfigSource {
        &*self.source
    }

    pub async fn manifest(&self) -> Result<Option<Arc<Manifest>>> {
        self.source.manifest().await
    }

    pub async fn ignition_conf(&self) -> Result<Option<Arc<Properties>>> {
        self.source.ignition_conf().await
    }

    pub async fn redundancy(&self) -> Result<Option<Arc<Properties>>> {
        self.source.redundancy().await
    }

    pub async fn projects(&self) -> Result<Option<Subtree<'_>>> {
        self.source.projects().await
    }

    pub async fn config(&self) -> Result<Option<Subtree<'_>>> {
        self.source.config().await
    }

    pub async fn exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        self.source.exists(path.as_ref()).await
    }

    pub async fn has_config_db(&self) -> Result<bool> {
        self.source.has_config_db().await
    }

    pub async fn config_db(&self) -> Result<Option<Arc<Database>>> {
        self.source.config_db().await
    }

    /// Like [`config_db()`](Self::config_db), but gives up with
    /// [`Cancelled`](ErrorKind::Cancelled) when the token is cancelled.
    ///
    /// Giving up doesn't disturb a copy in progress; the next request picks
    /// it up where it is.
    pub async fn config_db_with(&self, cancel: &CancellationToken) -> Result<Option<Arc<Database>>> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => exn::bail!(ErrorKind::Cancelled),
            database = self.source.config_db() => database,
        }
    }

    /// Whether the bundle's root carries any of the markers of a gateway
    /// configuration.
    pub async fn looks_like_bundle(&self) -> Result<bool> {
        for marker in BUNDLE_MARKERS {
            if self.source.exists(Path::new(marker)).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Release the underlying source. See [`ConfigSource::close`].
    pub async fn close(&self) -> Result<()> {
        self.source.close().await
    }
}

/// Quick check of whether a path is a configuration directory.
///
/// True only for a directory that contains at least one of `projects`,
/// `config` or `db_backup_sqlite.idb`. Existence checks only; nothing is
/// opened or parsed. Archives are never considered, use
/// [`Bundle::looks_like_bundle`] for those.
pub fn looks_like_bundle(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    path.is_dir() && BUNDLE_MARKERS.iter().any(|marker| path.join(marker).exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::BundleBuilder;
    use ember_idb::fixtures::Fixture;
    use rstest::rstest;
    use std::path::PathBuf;
    use std::time::Instant;
    use tempfile::TempDir;

    const MANIFEST: &str = "<backupinfo><version>8.1.33 (b2023101013)</version><edition>standard</edition></backupinfo>";

    #[derive(Debug, Clone, Copy)]
    enum Store {
        Archive,
        Directory,
    }

    struct Setup {
        temp_dir: TempDir,
        bundle: Bundle,
    }
    impl Setup {
        fn temp_files(&self) -> Vec<PathBuf> {
            let scratch = self.temp_dir.path().join("scratch");
            std::fs::read_dir(scratch).unwrap().map(|entry| entry.unwrap().path()).collect()
        }
    }

    async fn open(store: Store, builder: BundleBuilder) -> Setup {
        let temp_dir = tempfile::tempdir().unwrap();
        let scratch = temp_dir.path().join("scratch");
        std::fs::create_dir(&scratch).unwrap();
        let path = match store {
            Store::Archive => builder.write_archive(temp_dir.path().join("plant.gwbk")).await.unwrap(),
            Store::Directory => builder.write_directory(temp_dir.path().join("plant")).await.unwrap(),
        };
        let options = SourceOptions {
            temp_dir: Some(scratch),
            temp_prefix: "bundle-test-".to_string(),
            pool_connections: Some(2),
        };
        let bundle = Bundle::open(&path, &options).await.unwrap();
        Setup { temp_dir, bundle }
    }

    fn full() -> BundleBuilder {
        BundleBuilder::new()
            .file("backupinfo.xml", MANIFEST)
            .file("ignition.conf", "wrapper.java.initmemory=1024\nwrapper.java.maxmemory=4096\n")
            .file(
                "redundancy.xml",
                r#"<?xml version="1.0" encoding="UTF-8"?>
                <!DOCTYPE properties SYSTEM "http://java.sun.com/dtd/properties.dtd">
                <properties><entry key="redundancy.noderole">Master</entry></properties>"#,
            )
            .file("projects/Overview/project.json", r#"{"title": "Overview"}"#)
            .dir("config/resources/core")
            .database(Fixture::new().system("Plant-GW-01", "0b7f1c2e-77a4-4c4d-9f0e-1f2a3b4c5d6e"))
    }

    #[rstest]
    #[case::archive(Store::Archive, "plant.gwbk", true)]
    #[case::directory(Store::Directory, "plant", false)]
    #[tokio::test]
    async fn test_identity(#[case] store: Store, #[case] name: &str, #[case] is_archive: bool) {
        let setup = open(store, full()).await;
        assert_eq!(setup.bundle.display_name(), name);
        assert_eq!(setup.bundle.is_archive(), is_archive);
        assert!(setup.bundle.looks_like_bundle().await.unwrap());
        setup.bundle.close().await.unwrap();
    }

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test]
    async fn test_accessors(#[case] store: Store) {
        let setup = open(store, full()).await;
        let bundle = &setup.bundle;
        let manifest = bundle.manifest().await.unwrap().unwrap();
        assert_eq!(manifest.edition(), Some("standard"));
        let conf = bundle.ignition_conf().await.unwrap().unwrap();
        assert_eq!(conf.get("wrapper.java.maxmemory"), Some("4096"));
        let redundancy = bundle.redundancy().await.unwrap().unwrap();
        assert_eq!(redundancy.get("redundancy.noderole"), Some("Master"));
        let projects = bundle.projects().await.unwrap().unwrap();
        assert_eq!(projects.entries().await.unwrap().len(), 1);
        assert!(bundle.config().await.unwrap().is_some());
        assert!(bundle.has_config_db().await.unwrap());
        let db = bundle.config_db().await.unwrap().unwrap();
        assert!(db.has_table("SYSPROPS").await.unwrap());
        bundle.close().await.unwrap();
    }

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test]
    async fn test_accessors_are_memoized(#[case] store: Store) {
        let setup = open(store, full()).await;
        let bundle = &setup.bundle;
        let (a, b) = (bundle.manifest().await.unwrap().unwrap(), bundle.manifest().await.unwrap().unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        let (a, b) = (bundle.ignition_conf().await.unwrap().unwrap(), bundle.ignition_conf().await.unwrap().unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        let (a, b) = tokio::join!(bundle.config_db(), bundle.config_db());
        assert!(Arc::ptr_eq(&a.unwrap().unwrap(), &b.unwrap().unwrap()));
        // One database, one copy
        assert_eq!(setup.temp_files().len(), 1);
        bundle.close().await.unwrap();
    }

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test]
    async fn test_missing_resources_are_absent(#[case] store: Store) {
        let setup = open(store, BundleBuilder::new().file("projects/.keep", "")).await;
        let bundle = &setup.bundle;
        assert!(bundle.manifest().await.unwrap().is_none());
        assert!(bundle.ignition_conf().await.unwrap().is_none());
        assert!(bundle.redundancy().await.unwrap().is_none());
        assert!(bundle.config().await.unwrap().is_none());
        assert!(!bundle.has_config_db().await.unwrap());
        assert!(bundle.config_db().await.unwrap().is_none());
        assert!(setup.temp_files().is_empty());
        bundle.close().await.unwrap();
    }

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test]
    async fn test_malformed_manifest_is_reported_on_access(#[case] store: Store) {
        // Opening succeeds even though the manifest is broken
        let setup = open(store, BundleBuilder::new().file("backupinfo.xml", "<backupinfo><version>")).await;
        for _ in 0..2 {
            let err = setup.bundle.manifest().await.unwrap_err();
            assert!(matches!(&*err, ErrorKind::MalformedManifest(_)));
        }
        setup.bundle.close().await.unwrap();
    }

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test]
    async fn test_close_removes_temp_file_without_database_request(#[case] store: Store) {
        let setup = open(store, full()).await;
        setup.bundle.close().await.unwrap();
        assert!(setup.temp_files().is_empty());
        let err = setup.bundle.manifest().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Closed));
    }

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test]
    async fn test_close_after_database_use(#[case] store: Store) {
        let setup = open(store, full()).await;
        let db = setup.bundle.config_db().await.unwrap().unwrap();
        let temp = db.path().to_path_buf();
        assert!(temp.exists());
        setup.bundle.close().await.unwrap();
        assert!(db.is_closed());
        assert!(!temp.exists());
        // Idempotent
        setup.bundle.close().await.unwrap();
    }

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test]
    async fn test_zero_byte_database(#[case] store: Store) {
        let setup = open(store, BundleBuilder::new().file("db_backup_sqlite.idb", "")).await;
        assert!(setup.bundle.has_config_db().await.unwrap());
        let db = setup.bundle.config_db().await.unwrap().unwrap();
        assert!(!db.has_table("SYSPROPS").await.unwrap());
        setup.bundle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_database_request() {
        let setup = open(Store::Archive, full()).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = setup.bundle.config_db_with(&cancel).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Cancelled));
        // The copy carried on regardless
        let db = setup.bundle.config_db_with(&CancellationToken::new()).await.unwrap();
        assert!(db.is_some());
        setup.bundle.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_manifest_readable_while_database_copies() {
        let builder = full().database(Fixture::new().padding(32 * 1024 * 1024));
        let setup = open(Store::Directory, builder).await;
        let bundle = &setup.bundle;
        let (database, manifest) = tokio::join!(
            async { (bundle.config_db().await, Instant::now()) },
            async { (bundle.manifest().await, Instant::now()) },
        );
        let (database, database_at) = database;
        let (manifest, manifest_at) = manifest;
        assert!(manifest.unwrap().is_some());
        assert!(manifest_at <= database_at);
        // The database is only opened once the copy is whole
        let database = database.unwrap().unwrap();
        let original = std::fs::metadata(bundle.path().join("db_backup_sqlite.idb")).unwrap().len();
        assert_eq!(std::fs::metadata(database.path()).unwrap().len(), original);
        assert!(database.has_table("SYSPROPS").await.unwrap());
        bundle.close().await.unwrap();
    }

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_close_during_database_request(#[case] store: Store) {
        let builder = full().database(Fixture::new().padding(32 * 1024 * 1024));
        let setup = open(store, builder).await;
        let bundle = &setup.bundle;
        let (database, closed) = tokio::join!(bundle.config_db(), bundle.close());
        closed.unwrap();
        let err = database.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Closed));
        assert!(setup.temp_files().is_empty());
        // Later requests see the same outcome
        let err = bundle.config_db().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Closed));
    }

    #[test]
    fn test_looks_like_bundle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        for (name, marker, is_dir) in [
            ("projects-only", "projects", true),
            ("config-only", "config", true),
            ("idb-only", "db_backup_sqlite.idb", false),
        ] {
            let dir = root.join(name);
            std::fs::create_dir(&dir).unwrap();
            match is_dir {
                true => std::fs::create_dir(dir.join(marker)).unwrap(),
                false => std::fs::write(dir.join(marker), b"").unwrap(),
            }
            assert!(looks_like_bundle(&dir), "{name}");
        }
        let empty = root.join("empty");
        std::fs::create_dir(&empty).unwrap();
        assert!(!looks_like_bundle(&empty));
        let unrelated = root.join("unrelated");
        std::fs::create_dir(&unrelated).unwrap();
        std::fs::write(unrelated.join("notes.txt"), b"").unwrap();
        assert!(!looks_like_bundle(&unrelated));
        let file = root.join("backup.gwbk");
        std::fs::write(&file, b"").unwrap();
        assert!(!looks_like_bundle(&file));
        assert!(!looks_like_bundle(root.join("missing")));
    }
}
