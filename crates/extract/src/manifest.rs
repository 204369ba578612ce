use crate::error::Result;
use crate::xml;
use std::collections::BTreeMap;
use tracing::instrument;

/// The backup manifest (`backupinfo.xml`).
///
/// Every element directly beneath the document root becomes a field, keyed by
/// its tag name. Empty elements are dropped so that "present but blank" and
/// "missing" read the same to callers.
///
/// ```xml
/// <backupinfo>
///     <version>8.1.33 (b2023101013)</version>
///     <timestamp>2024-02-12 09:15:44</timestamp>
///     <edition>standard</edition>
/// </backupinfo>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    fields: BTreeMap<String, String>,
}
impl Manifest {
    /// Parse a manifest from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedXml`](crate::error::ErrorKind::MalformedXml) when
    /// the document is not well-formed, or
    /// [`InvalidEncoding`](crate::error::ErrorKind::InvalidEncoding) when it
    /// isn't UTF-8.
    #[instrument(level = "debug", skip(bytes), fields(size = bytes.as_ref().len()))]
    pub fn parse(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let text = xml::decode(bytes.as_ref())?;
        let document = xml::parse(text)?;
        let fields = document
            .root_element()
            .children()
            .filter(|node| node.is_element())
            .filter_map(|node| {
                let value = node.text().map(str::trim).unwrap_or_default();
                (!value.is_empty()).then(|| (node.tag_name().name().to_string(), value.to_string()))
            })
            .collect();
        Ok(Self { fields })
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Gateway version string, including the build number.
    pub fn version(&self) -> Option<&str> {
        self.get("version")
    }

    pub fn edition(&self) -> Option<&str> {
        self.get("edition")
    }

    /// When the backup was taken, verbatim.
    pub fn timestamp(&self) -> Option<&str> {
        self.get("timestamp")
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <backupinfo>
            <version>8.1.33 (b2023101013)</version>
            <timestamp>2024-02-12 09:15:44</timestamp>
            <edition></edition>
            <dbType>SQLITE</dbType>
        </backupinfo>"#;

    #[test]
    fn test_parse_fields() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.version(), Some("8.1.33 (b2023101013)"));
        assert_eq!(manifest.timestamp(), Some("2024-02-12 09:15:44"));
        assert_eq!(manifest.get("dbType"), Some("SQLITE"));
        // Blank elements are treated as missing
        assert_eq!(manifest.edition(), None);
        assert_eq!(manifest.fields().count(), 3);
    }

    #[test]
    fn test_byte_order_mark() {
        let with_bom = format!("\u{feff}{MANIFEST}");
        assert_eq!(Manifest::parse(with_bom).unwrap().version(), Some("8.1.33 (b2023101013)"));
    }

    #[test]
    fn test_malformed() {
        let err = Manifest::parse("<backupinfo><version>8.1</backupinfo>").unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedXml(_)));
        let err = Manifest::parse([0xff, 0xfe, 0x00]).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidEncoding);
    }
}
