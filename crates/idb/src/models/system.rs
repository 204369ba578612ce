use serde::Serialize;

#[derive(sqlx::FromRow)]
pub(crate) struct SystemPropertiesRow {
    system_name: Option<String>,
    system_uid: Option<String>,
}

/// Gateway identity, from the `SYSPROPS` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemProperties {
    pub system_name: Option<String>,
    pub system_uid: Option<String>,
}
impl From<SystemPropertiesRow> for SystemProperties {
    fn from(row: SystemPropertiesRow) -> Self {
        Self {
            system_name: super::text(row.system_name),
            system_uid: super::text(row.system_uid),
        }
    }
}
