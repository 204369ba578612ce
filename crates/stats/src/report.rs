use crate::calculator::Category;
use crate::categories::{
    DatabaseStatistics, DeviceStatistics, GatewayNetworkStatistics, MetaStatistics, OpcServerStatistics,
    ProjectStatistics,
};
use crate::error::Result;
use serde::Serialize;
use std::path::PathBuf;

/// What became of a single statistics category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Present(T),
    /// The bundle doesn't carry the category's inputs.
    Absent,
    Failed {
        error: String,
    },
}

impl<T> Outcome<T> {
    pub(crate) fn from_result(category: Category, result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Self::Present(value),
            Ok(None) => {
                tracing::debug!(%category, "Category absent");
                Self::Absent
            },
            Err(err) => {
                tracing::warn!(%category, error = ?err, "Category failed");
                Self::Failed {
                    error: (*err).to_string(),
                }
            },
        }
    }

    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Everything known about one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub path: PathBuf,
    pub display_name: String,
    pub is_archive: bool,
    pub has_config_db: bool,
    pub has_projects: bool,
    pub has_config: bool,
    pub meta: Outcome<MetaStatistics>,
    pub projects: Outcome<ProjectStatistics>,
    pub databases: Outcome<DatabaseStatistics>,
    pub devices: Outcome<DeviceStatistics>,
    pub opc_servers: Outcome<OpcServerStatistics>,
    pub gateway_network: Outcome<GatewayNetworkStatistics>,
}

impl Report {
    /// Categories that failed, with the reason.
    pub fn failures(&self) -> Vec<(Category, &str)> {
        [
            (Category::Meta, self.meta.error()),
            (Category::Projects, self.projects.error()),
            (Category::Databases, self.databases.error()),
            (Category::Devices, self.devices.error()),
            (Category::OpcServers, self.opc_servers.error()),
            (Category::GatewayNetwork, self.gateway_network.error()),
        ]
        .into_iter()
        .filter_map(|(category, error)| error.map(|error| (category, error)))
        .collect()
    }
}
