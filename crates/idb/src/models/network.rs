use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use serde::Serialize;

#[derive(sqlx::FromRow)]
pub(crate) struct OutgoingConnectionRow {
    host: String,
    port: Option<i64>,
    enabled: Option<i64>,
}

/// A gateway network connection initiated by this gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingConnection {
    pub host: String,
    pub port: Option<u16>,
    pub enabled: bool,
}
impl TryFrom<OutgoingConnectionRow> for OutgoingConnection {
    type Error = Error;
    fn try_from(row: OutgoingConnectionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            host: row.host,
            port: row
                .port
                .map(u16::try_from)
                .transpose()
                .or_raise(|| ErrorKind::InvalidData("port"))?,
            enabled: super::flag(row.enabled, true),
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct IncomingConnectionRow {
    connection_id: String,
    status: Option<String>,
}

/// A gateway network connection another gateway has made (or tried to make)
/// to this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingConnection {
    pub connection_id: String,
    /// Approval state, e.g. `Approved` or `Pending`.
    pub status: Option<String>,
}
impl From<IncomingConnectionRow> for IncomingConnection {
    fn from(row: IncomingConnectionRow) -> Self {
        Self {
            connection_id: row.connection_id,
            status: super::text(row.status),
        }
    }
}
