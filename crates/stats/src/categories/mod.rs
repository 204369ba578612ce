mod databases;
mod devices;
mod gateway_network;
mod meta;
mod opc_servers;
mod projects;

pub use self::databases::{DatabaseStatistics, Databases};
pub use self::devices::{DeviceStatistics, Devices};
pub use self::gateway_network::{GatewayNetwork, GatewayNetworkStatistics};
pub use self::meta::{Meta, MetaStatistics};
pub use self::opc_servers::{OpcServerStatistics, OpcServers};
pub use self::projects::{ProjectStatistics, ProjectSummary, Projects};
