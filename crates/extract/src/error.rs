//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document is not well-formed XML.
    #[display("malformed XML: {_0}")]
    MalformedXml(#[error(not(source))] String),
    /// The document is well-formed, but it is not the document we asked for.
    #[display("unexpected document: expected <{expected}>, found <{found}>")]
    UnexpectedRoot {
        /// Root element that was expected.
        expected: &'static str,
        /// Root element that was found.
        found: String,
    },
    /// Text content is not valid in the encoding the format requires.
    #[display("invalid text encoding")]
    InvalidEncoding,
    /// A `project.json` could not be deserialized.
    #[display("malformed project definition: {_0}")]
    MalformedProject(#[error(not(source))] String),
    /// A field was found but could not be parsed.
    #[display("failed to parse field '{field}', found value: {value}")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// Details about the parsing failure.
        value: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Documents are either valid or they're not; reading them again
        // won't change that.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::UnexpectedRoot { expected: "properties", found: "html".to_string() }.to_string(),
            "unexpected document: expected <properties>, found <html>"
        );
        assert_eq!(
            ErrorKind::ParseError { field: "wrapper.java.maxmemory", value: "lots".to_string() }.to_string(),
            "failed to parse field 'wrapper.java.maxmemory', found value: lots"
        );
        assert!(!ErrorKind::InvalidEncoding.is_retryable());
    }
}
