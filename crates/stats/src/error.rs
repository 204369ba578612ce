//! Statistics Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use ember_source::error::Error as SourceError;

/// A statistics error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for statistics operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single statistics category could not be calculated.
///
/// A missing input is never an error; these only describe inputs that exist
/// but can't be used.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ErrorKind {
    /// Reading from the bundle failed; carries the underlying reason.
    #[display("{_0}")]
    Source(#[error(not(source))] String),
    /// A configuration database query failed.
    #[display("query for {_0} failed")]
    Query(#[error(not(source))] &'static str),
    #[display("malformed project definition for {_0}")]
    MalformedProject(#[error(not(source))] String),
    /// A setting was present but unusable.
    #[display("invalid value for {_0}")]
    InvalidValue(#[error(not(source))] &'static str),
    #[display("cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Wrap a bundle error, keeping its message at the top of the tree.
    #[track_caller]
    pub fn bundle(err: SourceError) -> Error {
        let reason = (*err).to_string();
        err.raise(ErrorKind::Source(reason))
    }
}
