use crate::calculator::{Calculator, Category, repository};
use crate::error::{ErrorKind, Result};
use ember_idb::{IncomingConnection, OutgoingConnection};
use ember_source::Bundle;
use exn::ResultExt;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GatewayNetworkStatistics {
    pub outgoing_count: usize,
    pub incoming_count: usize,
    pub outgoing: Vec<OutgoingConnection>,
    pub incoming: Vec<IncomingConnection>,
}

/// Gateway Network links in both directions.
///
/// Present when either of the two tables exists; a missing table on one side
/// reads as no connections in that direction.
pub struct GatewayNetwork;

impl Calculator for GatewayNetwork {
    const CATEGORY: Category = Category::GatewayNetwork;
    type Output = GatewayNetworkStatistics;

    async fn calculate(&self, bundle: &Bundle) -> Result<Option<GatewayNetworkStatistics>> {
        let Some(repo) = repository(bundle).await? else {
            return Ok(None);
        };
        let (outgoing, incoming) = tokio::try_join!(
            async { repo.outgoing_connections().await.or_raise(|| ErrorKind::Query("outgoing connections")) },
            async { repo.incoming_connections().await.or_raise(|| ErrorKind::Query("incoming connections")) },
        )?;
        if outgoing.is_none() && incoming.is_none() {
            return Ok(None);
        }
        let (outgoing, incoming) = (outgoing.unwrap_or_default(), incoming.unwrap_or_default());
        Ok(Some(GatewayNetworkStatistics {
            outgoing_count: outgoing.len(),
            incoming_count: incoming.len(),
            outgoing,
            incoming,
        }))
    }
}
