use crate::calculator::{Calculator, Category, repository};
use crate::error::{ErrorKind, Result};
use ember_idb::OpcServer;
use ember_source::Bundle;
use exn::ResultExt;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpcServerStatistics {
    pub server_count: usize,
    pub enabled_count: usize,
    pub servers: Vec<OpcServer>,
}

/// OPC connections, including the gateway's own OPC UA server.
pub struct OpcServers;

impl Calculator for OpcServers {
    const CATEGORY: Category = Category::OpcServers;
    type Output = OpcServerStatistics;

    async fn calculate(&self, bundle: &Bundle) -> Result<Option<OpcServerStatistics>> {
        let Some(repo) = repository(bundle).await? else {
            return Ok(None);
        };
        let servers = repo.opc_servers().await.or_raise(|| ErrorKind::Query("OPC servers"))?;
        Ok(servers.map(|servers| OpcServerStatistics {
            server_count: servers.len(),
            enabled_count: servers.iter().filter(|s| s.enabled).count(),
            servers,
        }))
    }
}
