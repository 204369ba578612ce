use crate::calculator::{Calculator, Category, repository};
use crate::error::{ErrorKind, Result};
use ember_extract::{INIT_MEMORY_KEY, MAX_MEMORY_KEY, NODE_ROLE_KEY};
use ember_idb::SystemProperties;
use ember_source::Bundle;
use exn::ResultExt;
use serde::Serialize;

/// Gateway identity and sizing.
///
/// Only the manifest is required; everything drawn from the configuration
/// database or the properties files is filled in when available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetaStatistics {
    pub uuid: Option<String>,
    pub gateway_name: Option<String>,
    pub edition: Option<String>,
    /// Redundancy role, e.g. `Master`, `Backup` or `Independent`.
    pub role: Option<String>,
    pub version: Option<String>,
    /// When the backup was taken, verbatim from the manifest.
    pub timestamp: Option<String>,
    /// Initial JVM heap, in megabytes.
    pub init_memory: Option<u32>,
    /// Maximum JVM heap, in megabytes.
    pub max_memory: Option<u32>,
}

pub struct Meta;

impl Calculator for Meta {
    const CATEGORY: Category = Category::Meta;
    type Output = MetaStatistics;

    async fn calculate(&self, bundle: &Bundle) -> Result<Option<MetaStatistics>> {
        let Some(manifest) = bundle.manifest().await.map_err(ErrorKind::bundle)? else {
            return Ok(None);
        };
        let mut stats = MetaStatistics {
            edition: manifest.edition().map(String::from),
            version: manifest.version().map(String::from),
            timestamp: manifest.timestamp().map(String::from),
            ..MetaStatistics::default()
        };

        // The database has categories of its own to report its failures under.
        match system_properties(bundle).await {
            Ok(Some(system)) => {
                stats.gateway_name = system.system_name;
                stats.uuid = system.system_uid;
            },
            Ok(None) => {},
            Err(err) => tracing::warn!(error = ?err, "Gateway identity unavailable"),
        }

        if let Some(redundancy) = bundle.redundancy().await.map_err(ErrorKind::bundle)? {
            stats.role = redundancy.get(NODE_ROLE_KEY).map(String::from);
        }

        if let Some(conf) = bundle.ignition_conf().await.map_err(ErrorKind::bundle)? {
            stats.init_memory = conf
                .megabytes(INIT_MEMORY_KEY)
                .or_raise(|| ErrorKind::InvalidValue(INIT_MEMORY_KEY))?;
            stats.max_memory = conf
                .megabytes(MAX_MEMORY_KEY)
                .or_raise(|| ErrorKind::InvalidValue(MAX_MEMORY_KEY))?;
        }

        Ok(Some(stats))
    }
}

async fn system_properties(bundle: &Bundle) -> Result<Option<SystemProperties>> {
    let Some(repo) = repository(bundle).await? else {
        return Ok(None);
    };
    repo.system_properties()
        .await
        .or_raise(|| ErrorKind::Query("system properties"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::Databases;
    use crate::testing::{Store, open};
    use ember_idb::fixtures::Fixture;
    use ember_source::fixtures::BundleBuilder;
    use rstest::rstest;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <backupinfo>
            <version>8.1.33 (b2023101013)</version>
            <timestamp>2024-02-12 09:15:44</timestamp>
            <edition>standard</edition>
        </backupinfo>"#;

    const REDUNDANCY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <!DOCTYPE properties SYSTEM "http://java.sun.com/dtd/properties.dtd">
        <properties>
            <entry key="redundancy.noderole">Backup</entry>
        </properties>"#;

    #[tokio::test]
    async fn test_full() {
        let builder = BundleBuilder::new()
            .file("backupinfo.xml", MANIFEST)
            .file("redundancy.xml", REDUNDANCY)
            .file("ignition.conf", "# Java Heap\nwrapper.java.initmemory=1g\nwrapper.java.maxmemory=4096\n")
            .database(Fixture::new().system("Plant-GW-01", "0b7f1c2e-77a4-4c4d-9f0e-1f2a3b4c5d6e"));
        let (_dir, bundle) = open(Store::Archive, &builder).await;
        let stats = Meta.calculate(&bundle).await.unwrap().unwrap();
        assert_eq!(
            stats,
            MetaStatistics {
                uuid: Some("0b7f1c2e-77a4-4c4d-9f0e-1f2a3b4c5d6e".to_string()),
                gateway_name: Some("Plant-GW-01".to_string()),
                edition: Some("standard".to_string()),
                role: Some("Backup".to_string()),
                version: Some("8.1.33 (b2023101013)".to_string()),
                timestamp: Some("2024-02-12 09:15:44".to_string()),
                init_memory: Some(1024),
                max_memory: Some(4096),
            }
        );
        bundle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_manifest_only() {
        let builder = BundleBuilder::new().file("backupinfo.xml", MANIFEST);
        let (_dir, bundle) = open(Store::Directory, &builder).await;
        let stats = Meta.calculate(&bundle).await.unwrap().unwrap();
        assert_eq!(stats.version.as_deref(), Some("8.1.33 (b2023101013)"));
        assert_eq!(stats.uuid, None);
        assert_eq!(stats.role, None);
        assert_eq!(stats.max_memory, None);
        bundle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_absent_without_manifest() {
        let builder = BundleBuilder::new()
            .file("ignition.conf", "wrapper.java.maxmemory=4096\n")
            .database(Fixture::new().system("Plant-GW-01", "uid"));
        let (_dir, bundle) = open(Store::Directory, &builder).await;
        assert_eq!(Meta.calculate(&bundle).await.unwrap(), None);
        bundle.close().await.unwrap();
    }

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test]
    async fn test_corrupt_database_leaves_identity_empty(#[case] store: Store) {
        let builder = BundleBuilder::new()
            .file("backupinfo.xml", MANIFEST)
            .file("db_backup_sqlite.idb", vec![0xab_u8; 4096]);
        let (_dir, bundle) = open(store, &builder).await;
        let stats = Meta.calculate(&bundle).await.unwrap().unwrap();
        assert_eq!(stats.version.as_deref(), Some("8.1.33 (b2023101013)"));
        assert_eq!(stats.uuid, None);
        assert_eq!(stats.gateway_name, None);
        // The failure belongs to the database categories
        assert!(Databases.calculate(&bundle).await.is_err());
        bundle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_memory_setting() {
        let builder = BundleBuilder::new()
            .file("backupinfo.xml", MANIFEST)
            .file("ignition.conf", "wrapper.java.maxmemory=lots\n");
        let (_dir, bundle) = open(Store::Directory, &builder).await;
        let err = Meta.calculate(&bundle).await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidValue(MAX_MEMORY_KEY));
        bundle.close().await.unwrap();
    }
}
