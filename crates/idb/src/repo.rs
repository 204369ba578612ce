//! Queries against the configuration tables the statistics care about.
//!
//! Gateways of different versions (and different module sets) don't all carry
//! the same tables, so every query first checks that its table exists. A
//! missing table is reported as `None` rather than as an error: it says
//! something about the gateway, not about the health of the bundle.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{
    Datasource, DatasourceRow, Device, DeviceRow, IncomingConnection, IncomingConnectionRow, OpcServer, OpcServerRow,
    OutgoingConnection, OutgoingConnectionRow, SystemProperties, SystemPropertiesRow,
};
use exn::ResultExt;
use sqlx::sqlite::SqliteRow;
use tracing::instrument;

pub(crate) mod tables {
    pub const SYSTEM_PROPERTIES: &str = "SYSPROPS";
    pub const DATASOURCES: &str = "DATASOURCES";
    pub const DRIVERS: &str = "JDBCDRIVERS";
    pub const DEVICES: &str = "DEVICESETTINGS";
    pub const OPC_SERVERS: &str = "OPCSERVERS";
    pub const OUTGOING_CONNECTIONS: &str = "WSCONNECTIONSETTINGS";
    pub const INCOMING_CONNECTIONS: &str = "WSINCOMINGCONNECTION";
}

/// Read-only repository over a gateway's configuration database.
#[derive(Debug, Clone)]
pub struct Repository {
    db: Database,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { db: db.clone() }
    }
}
impl Repository {

    /// Fetch every row of a query, provided its table exists.
    async fn fetch_all<R>(&self, table: &str, query: &'static str) -> Result<Option<Vec<R>>>
    where
        R: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
    {
        if !self.db.has_table(table).await? {
            tracing::debug!(table, "Table not present in configuration database");
            return Ok(None);
        }
        let rows = sqlx::query_as::<_, R>(query)
            .fetch_all(self.db.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Some(rows))
    }

    // =========================================================================
    // Gateway
    // =========================================================================

    /// The gateway's name and unique ID.
    ///
    /// `None` when the table is missing; default (empty) properties when the
    /// table exists but holds no row.
    #[instrument(level = "debug", skip(self))]
    pub async fn system_properties(&self) -> Result<Option<SystemProperties>> {
        let rows: Option<Vec<SystemPropertiesRow>> = self
            .fetch_all(tables::SYSTEM_PROPERTIES, include_str!("../queries/system_properties.sql"))
            .await?;
        Ok(rows.map(|rows| rows.into_iter().next().map(SystemProperties::from).unwrap_or_default()))
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Configured database connections, with the name of the driver each one
    /// uses when the drivers table is available.
    #[instrument(level = "debug", skip(self))]
    pub async fn datasources(&self) -> Result<Option<Vec<Datasource>>> {
        let query = if self.db.has_table(tables::DRIVERS).await? {
            include_str!("../queries/datasources.sql")
        } else {
            include_str!("../queries/datasources_without_drivers.sql")
        };
        let rows: Option<Vec<DatasourceRow>> = self.fetch_all(tables::DATASOURCES, query).await?;
        Ok(rows.map(|rows| rows.into_iter().map(Datasource::from).collect()))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn devices(&self) -> Result<Option<Vec<Device>>> {
        let rows: Option<Vec<DeviceRow>> = self.fetch_all(tables::DEVICES, include_str!("../queries/devices.sql")).await?;
        Ok(rows.map(|rows| rows.into_iter().map(Device::from).collect()))
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn opc_servers(&self) -> Result<Option<Vec<OpcServer>>> {
        let rows: Option<Vec<OpcServerRow>> = self
            .fetch_all(tables::OPC_SERVERS, include_str!("../queries/opc_servers.sql"))
            .await?;
        Ok(rows.map(|rows| rows.into_iter().map(OpcServer::from).collect()))
    }

    // =========================================================================
    // Gateway Network
    // =========================================================================

    #[instrument(level = "debug", skip(self))]
    pub async fn outgoing_connections(&self) -> Result<Option<Vec<OutgoingConnection>>> {
        let rows: Option<Vec<OutgoingConnectionRow>> = self
            .fetch_all(tables::OUTGOING_CONNECTIONS, include_str!("../queries/outgoing_connections.sql"))
            .await?;
        rows.map(|rows| rows.into_iter().map(OutgoingConnection::try_from).collect::<Result<Vec<_>>>())
            .transpose()
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn incoming_connections(&self) -> Result<Option<Vec<IncomingConnection>>> {
        let rows: Option<Vec<IncomingConnectionRow>> = self
            .fetch_all(tables::INCOMING_CONNECTIONS, include_str!("../queries/incoming_connections.sql"))
            .await?;
        Ok(rows.map(|rows| rows.into_iter().map(IncomingConnection::from).collect()))
    }
}
