//! Database connection and pool management.

use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

// Statistics categories query concurrently, but there are only a handful of them.
const MAX_CONNECTIONS: u32 = 4;

/// Read-only connection pool over an embedded configuration database.
///
/// The database is always a private copy (see `ember-source`), but it's
/// opened read-only anyway: nothing in this crate has any business writing
/// to it.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: PathBuf,
}

impl Database {
    /// Open the database file at the given path.
    ///
    /// The file must already exist; it is never created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, None).await
    }

    /// Open the database file with an explicit connection limit.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open_with(path: impl AsRef<Path>, max: Option<u32>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(false)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Open(path.clone()))?;
        tracing::debug!("Opened embedded configuration database");
        Ok(Self { pool, path })
    }

    /// Get a reference to the underlying connection pool.
    ///
    /// This is useful for running custom queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Returns `true` if a table with the given name exists (case-insensitive).
    pub async fn has_table(&self, table: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/has_table.sql"))
            .bind(table)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(count > 0)
    }

    /// Close the connection pool.
    ///
    /// This waits for all connections to be returned to the pool and then
    /// closes them. After calling this, the Database instance (and all of
    /// its clones) should not be used.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
