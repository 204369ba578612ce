use crate::error::{ErrorKind, Result};
use roxmltree::{Document, ParsingOptions};

/// Decode a UTF-8 document, dropping a leading byte order mark if present.
pub(crate) fn decode(bytes: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(bytes).map_err(|_| ErrorKind::InvalidEncoding)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Parse an XML document.
///
/// DTDs are allowed (but never fetched) because Java's XML properties format
/// always declares one.
pub(crate) fn parse(text: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(text, options).map_err(|e| ErrorKind::MalformedXml(e.to_string()))?;
    Ok(document)
}
