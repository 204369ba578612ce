//! Builder for small configuration databases, for use in tests.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use std::path::Path;

/// Describes the content of a configuration database to write to disk.
///
/// Every known table is created unless [`Fixture::empty`] is used or a table
/// is explicitly left out with [`Fixture::without_table`].
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    schema: bool,
    omit: Vec<&'static str>,
    padding: usize,
    system: Option<(String, String)>,
    datasources: Vec<(String, Option<String>, bool)>,
    devices: Vec<(String, String)>,
    opc_servers: Vec<(String, String)>,
    outgoing: Vec<(String, u16)>,
    incoming: Vec<(String, String)>,
}

impl Fixture {
    pub fn new() -> Self {
        Self { schema: true, ..Self::default() }
    }

    /// A valid database without a single table.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn without_table(mut self, table: &'static str) -> Self {
        self.omit.push(table);
        self
    }

    /// Pad the database out with a blob of zeroes of the given size.
    pub fn padding(mut self, bytes: usize) -> Self {
        self.padding = bytes;
        self
    }

    pub fn system(mut self, name: impl Into<String>, uid: impl Into<String>) -> Self {
        self.system = Some((name.into(), uid.into()));
        self
    }

    pub fn datasource(mut self, name: impl Into<String>, driver: Option<&str>, enabled: bool) -> Self {
        self.datasources.push((name.into(), driver.map(String::from), enabled));
        self
    }

    pub fn device(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.devices.push((name.into(), kind.into()));
        self
    }

    pub fn opc_server(mut self, name: impl Into<String>, kind: impl Into<String>) -> Self {
        self.opc_servers.push((name.into(), kind.into()));
        self
    }

    pub fn outgoing(mut self, host: impl Into<String>, port: u16) -> Self {
        self.outgoing.push((host.into(), port));
        self
    }

    pub fn incoming(mut self, connection_id: impl Into<String>, status: impl Into<String>) -> Self {
        self.incoming.push((connection_id.into(), status.into()));
        self
    }

    /// Write the database to the given path, replacing any existing file.
    pub async fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path).or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
        }
        let options = SqliteConnectOptions::new().filename(path).create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
        if self.schema {
            self.populate(&mut conn).await?;
        }
        conn.close().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    async fn populate(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::raw_sql(include_str!("../queries/fixture_schema.sql"))
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if let Some((name, uid)) = &self.system {
            sqlx::query("INSERT INTO SYSPROPS (SYSTEMNAME, SYSTEMUID) VALUES (?, ?)")
                .bind(name)
                .bind(uid)
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for (name, driver, enabled) in &self.datasources {
            let driver_id = match driver {
                Some(driver) => Some(
                    sqlx::query("INSERT INTO JDBCDRIVERS (NAME) VALUES (?)")
                        .bind(driver)
                        .execute(&mut *conn)
                        .await
                        .or_raise(|| ErrorKind::Database)?
                        .last_insert_rowid(),
                ),
                None => None,
            };
            sqlx::query("INSERT INTO DATASOURCES (NAME, DRIVERID, ENABLED) VALUES (?, ?, ?)")
                .bind(name)
                .bind(driver_id)
                .bind(i64::from(*enabled))
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for (name, kind) in &self.devices {
            sqlx::query("INSERT INTO DEVICESETTINGS (NAME, TYPE, ENABLED) VALUES (?, ?, 1)")
                .bind(name)
                .bind(kind)
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for (name, kind) in &self.opc_servers {
            sqlx::query("INSERT INTO OPCSERVERS (NAME, TYPE, READONLY, ENABLED) VALUES (?, ?, 0, 1)")
                .bind(name)
                .bind(kind)
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for (host, port) in &self.outgoing {
            sqlx::query("INSERT INTO WSCONNECTIONSETTINGS (HOST, PORT, ENABLED) VALUES (?, ?, 1)")
                .bind(host)
                .bind(i64::from(*port))
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for (connection_id, status) in &self.incoming {
            sqlx::query("INSERT INTO WSINCOMINGCONNECTION (CONNECTIONID, SECURITYSTATUS) VALUES (?, ?)")
                .bind(connection_id)
                .bind(status)
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        if self.padding > 0 {
            let size = i64::try_from(self.padding).or_raise(|| ErrorKind::InvalidData("padding"))?;
            sqlx::query("CREATE TABLE PADDING (DATA BLOB)")
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
            sqlx::query("INSERT INTO PADDING (DATA) VALUES (zeroblob(?))")
                .bind(size)
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        for table in &self.omit {
            sqlx::query(&format!("DROP TABLE {table}"))
                .execute(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }
}
