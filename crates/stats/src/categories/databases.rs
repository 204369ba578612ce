use crate::calculator::{Calculator, Category, repository};
use crate::error::{ErrorKind, Result};
use ember_idb::Datasource;
use ember_source::Bundle;
use exn::ResultExt;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseStatistics {
    pub connection_count: usize,
    pub enabled_count: usize,
    pub connections: Vec<Datasource>,
}

/// Database connections configured on the gateway.
pub struct Databases;

impl Calculator for Databases {
    const CATEGORY: Category = Category::Databases;
    type Output = DatabaseStatistics;

    async fn calculate(&self, bundle: &Bundle) -> Result<Option<DatabaseStatistics>> {
        let Some(repo) = repository(bundle).await? else {
            return Ok(None);
        };
        let connections = repo.datasources().await.or_raise(|| ErrorKind::Query("database connections"))?;
        Ok(connections.map(|connections| DatabaseStatistics {
            connection_count: connections.len(),
            enabled_count: connections.iter().filter(|c| c.enabled).count(),
            connections,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Store, open};
    use ember_idb::fixtures::Fixture;
    use ember_source::fixtures::BundleBuilder;
    use rstest::rstest;

    #[rstest]
    #[case::archive(Store::Archive)]
    #[case::directory(Store::Directory)]
    #[tokio::test]
    async fn test_connections(#[case] store: Store) {
        let fixture = Fixture::new()
            .datasource("Historian", Some("Microsoft SQLServer JDBC Driver"), true)
            .datasource("Staging", None, false);
        let (_dir, bundle) = open(store, &BundleBuilder::new().database(fixture)).await;
        let stats = Databases.calculate(&bundle).await.unwrap().unwrap();
        assert_eq!(stats.connection_count, 2);
        assert_eq!(stats.enabled_count, 1);
        assert_eq!(stats.connections[0].name, "Historian");
        assert_eq!(stats.connections[0].driver.as_deref(), Some("Microsoft SQLServer JDBC Driver"));
        assert_eq!(stats.connections[1].driver, None);
        bundle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_table_is_present() {
        let (_dir, bundle) = open(Store::Archive, &BundleBuilder::new().database(Fixture::new())).await;
        let stats = Databases.calculate(&bundle).await.unwrap().unwrap();
        assert_eq!(stats, DatabaseStatistics::default());
        bundle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_absent_without_database() {
        let (_dir, bundle) = open(Store::Directory, &BundleBuilder::new().dir("projects")).await;
        assert_eq!(Databases.calculate(&bundle).await.unwrap(), None);
        bundle.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_absent_without_table() {
        let fixture = Fixture::new().without_table("DATASOURCES");
        let (_dir, bundle) = open(Store::Directory, &BundleBuilder::new().database(fixture)).await;
        assert_eq!(Databases.calculate(&bundle).await.unwrap(), None);
        bundle.close().await.unwrap();
    }
}
