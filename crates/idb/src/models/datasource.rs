use serde::Serialize;

#[derive(sqlx::FromRow)]
pub(crate) struct DatasourceRow {
    name: String,
    description: Option<String>,
    url: Option<String>,
    driver: Option<String>,
    enabled: Option<i64>,
}

/// A database connection configured on the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Datasource {
    pub name: String,
    pub description: Option<String>,
    /// JDBC connect URL, verbatim.
    pub url: Option<String>,
    /// Name of the JDBC driver the connection uses.
    pub driver: Option<String>,
    pub enabled: bool,
}
impl From<DatasourceRow> for Datasource {
    fn from(row: DatasourceRow) -> Self {
        Self {
            name: row.name,
            description: super::text(row.description),
            url: super::text(row.url),
            driver: super::text(row.driver),
            enabled: super::flag(row.enabled, true),
        }
    }
}
