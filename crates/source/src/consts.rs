//! Well-known locations inside a bundle, relative to its root.

/// Backup manifest; version, edition and timestamp of the gateway.
pub const MANIFEST: &str = "backupinfo.xml";
/// Redundancy settings, in Java's XML properties format.
pub const REDUNDANCY: &str = "redundancy.xml";
/// Java service wrapper configuration, in `.properties` format.
pub const IGNITION_CONF: &str = "ignition.conf";
pub const PROJECTS_DIR: &str = "projects";
pub const CONFIG_DIR: &str = "config";
/// Embedded SQLite configuration database.
pub const CONFIG_DB: &str = "db_backup_sqlite.idb";

/// Any one of these at the root is enough to consider a directory a bundle.
pub const BUNDLE_MARKERS: [&str; 3] = [PROJECTS_DIR, CONFIG_DIR, CONFIG_DB];
