//! Source Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Kinds are `Clone` because memoized accessors keep their failed outcome and
//! hand it to every later caller.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;
use std::sync::Arc;

/// A source error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Clone, Display, Error)]
pub enum ErrorKind {
    /// The bundle path doesn't exist, or the archive can't be mounted. Fatal
    /// for the whole request.
    #[display("unreadable configuration source: {}", _0.display())]
    UnreadableSource(#[error(not(source))] PathBuf),
    #[display("malformed backup manifest: {_0}")]
    MalformedManifest(#[error(not(source))] String),
    #[display("malformed properties file {file}: {reason}")]
    MalformedProperties { file: &'static str, reason: String },
    /// The embedded configuration database couldn't be opened or queried.
    #[display("configuration database error")]
    Database,
    /// Copying the embedded configuration database to local disk failed.
    #[display("unable to materialize configuration database")]
    Materialization,
    #[display("operation cancelled")]
    Cancelled,
    /// One or more resources could not be released on close. Every release
    /// step is attempted; this lists the ones that failed.
    #[display("failed to release configuration source: {_0}")]
    Release(#[error(not(source))] String),
    /// The source has already been closed.
    #[display("configuration source is closed")]
    Closed,
    /// Path contains invalid characters or escapes the bundle root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(#[error(not(source))] Arc<IoError>),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Cancelled)
    }
}
