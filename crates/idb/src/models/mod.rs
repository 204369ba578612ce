mod datasource;
mod device;
mod network;
mod system;

pub use self::datasource::Datasource;
pub(crate) use self::datasource::DatasourceRow;
pub use self::device::{Device, OpcServer};
pub(crate) use self::device::{DeviceRow, OpcServerRow};
pub use self::network::{IncomingConnection, OutgoingConnection};
pub(crate) use self::network::{IncomingConnectionRow, OutgoingConnectionRow};
pub use self::system::SystemProperties;
pub(crate) use self::system::SystemPropertiesRow;

/// Boolean columns are stored as integers and are frequently left `NULL`.
fn flag(value: Option<i64>, default: bool) -> bool {
    value.map(|v| v != 0).unwrap_or(default)
}

/// Treat blank text columns as missing.
fn text(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, true, true)]
    #[case(None, false, false)]
    #[case(Some(0), true, false)]
    #[case(Some(1), false, true)]
    #[case(Some(-1), false, true)]
    fn test_flag(#[case] value: Option<i64>, #[case] default: bool, #[case] expected: bool) {
        assert_eq!(flag(value, default), expected);
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("  \t"), None)]
    #[case(Some("Approved"), Some("Approved"))]
    #[case(Some(" padded "), Some(" padded "))]
    fn test_text(#[case] value: Option<&str>, #[case] expected: Option<&str>) {
        assert_eq!(text(value.map(String::from)).as_deref(), expected);
    }
}
