use crate::error::{ErrorKind, Result};
use derive_more::Display;
use ember_idb::Repository;
use ember_source::Bundle;
use serde::Serialize;
use std::future::Future;

/// The statistics categories a report is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[display("meta")]
    Meta,
    #[display("projects")]
    Projects,
    #[display("databases")]
    Databases,
    #[display("devices")]
    Devices,
    #[display("opc_servers")]
    OpcServers,
    #[display("gateway_network")]
    GatewayNetwork,
}
impl Category {
    pub const ALL: [Category; 6] = [
        Self::Meta,
        Self::Projects,
        Self::Databases,
        Self::Devices,
        Self::OpcServers,
        Self::GatewayNetwork,
    ];
}

/// Produces the statistics record for one category.
///
/// Calculators are stateless and idempotent, and only ever read from the
/// bundle through its memoized accessors, so any number of them can run
/// against the same bundle at once.
///
/// - `Ok(Some(_))` when the category's inputs are present and usable,
/// - `Ok(None)` when a required input isn't in the bundle at all,
/// - `Err(_)` when an input is present but malformed, or a query fails.
pub trait Calculator {
    const CATEGORY: Category;
    type Output: Serialize;

    fn calculate(&self, bundle: &Bundle) -> impl Future<Output = Result<Option<Self::Output>>>;
}

/// Repository over the bundle's configuration database, if it has one.
pub(crate) async fn repository(bundle: &Bundle) -> Result<Option<Repository>> {
    let database = bundle.config_db().await.map_err(ErrorKind::bundle)?;
    Ok(database.map(|database| Repository::from(&*database)))
}
