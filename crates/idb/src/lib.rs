//! Read-only access to the SQLite configuration database embedded in a
//! gateway bundle (`db_backup_sqlite.idb`).
//!
//! The database is opened from a private copy on local disk and never written
//! to. Queries are tolerant of missing tables: a gateway that never had a
//! module installed simply doesn't carry its tables.

mod db;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{Datasource, Device, IncomingConnection, OpcServer, OutgoingConnection, SystemProperties};
pub use crate::repo::Repository;
