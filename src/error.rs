use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ErrorKind {
    #[display("path does not exist: {}", _0.display())]
    MissingPath(#[error(not(source))] PathBuf),
    #[display("path is not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    #[display("could not load settings")]
    Config,
    #[display("could not open {}", _0.display())]
    Open(#[error(not(source))] PathBuf),
    #[display("could not write output")]
    Output,
}
