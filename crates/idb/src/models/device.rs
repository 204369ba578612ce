use serde::Serialize;

#[derive(sqlx::FromRow)]
pub(crate) struct DeviceRow {
    name: String,
    kind: Option<String>,
    description: Option<String>,
    enabled: Option<i64>,
}

/// A device connection managed by the gateway's OPC UA server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    pub name: String,
    /// Driver type identifier, e.g. `ModbusTcp`.
    pub kind: Option<String>,
    pub description: Option<String>,
    pub enabled: bool,
}
impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Self {
            name: row.name,
            kind: super::text(row.kind),
            description: super::text(row.description),
            enabled: super::flag(row.enabled, true),
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct OpcServerRow {
    name: String,
    kind: Option<String>,
    description: Option<String>,
    read_only: Option<i64>,
    enabled: Option<i64>,
}

/// An OPC server connection, either the gateway's own or a remote one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpcServer {
    pub name: String,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub read_only: bool,
    pub enabled: bool,
}
impl From<OpcServerRow> for OpcServer {
    fn from(row: OpcServerRow) -> Self {
        Self {
            name: row.name,
            kind: super::text(row.kind),
            description: super::text(row.description),
            read_only: super::flag(row.read_only, false),
            enabled: super::flag(row.enabled, true),
        }
    }
}
