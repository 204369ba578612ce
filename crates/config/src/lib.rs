//! Settings for ember, merged from (lowest precedence first):
//!
//! 1. built-in defaults,
//! 2. `ember.toml` in the platform configuration directory,
//! 3. a file given explicitly (e.g. `--config`),
//! 4. `EMBER_*` environment variables.
//!
//! ```toml
//! temp_dir = "/var/tmp"
//! temp_prefix = "ember-"
//! pool_connections = 4
//! pretty = true
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const FILE_NAME: &str = "ember.toml";
pub const ENV_PREFIX: &str = "EMBER_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where private copies of configuration databases are written. Defaults
    /// to the system temporary directory.
    pub temp_dir: Option<PathBuf>,
    pub temp_prefix: String,
    /// Upper bound on connections per opened configuration database.
    pub pool_connections: u32,
    /// Pretty-print JSON output.
    pub pretty: bool,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            temp_dir: None,
            temp_prefix: "ember-".to_string(),
            pool_connections: 4,
            pretty: true,
        }
    }
}

impl Settings {
    /// Load settings from every layer.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit
            && !path.is_file()
        {
            exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
        }
        Self::from_figment(figment(default_path().as_deref(), explicit))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Self = figment.extract().map_err(|e| ErrorKind::Invalid(e.to_string()))?;
        settings.validate()?;
        tracing::debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.pool_connections == 0 {
            exn::bail!(ErrorKind::Validation("pool_connections"));
        }
        if self.temp_prefix.contains(['/', '\\']) {
            exn::bail!(ErrorKind::Validation("temp_prefix"));
        }
        Ok(())
    }
}

/// The per-user configuration file, if the platform has a home directory.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ember").map(|dirs| dirs.config_dir().join(FILE_NAME))
}

/// The layered provider chain. Missing files are skipped.
pub fn figment(default_file: Option<&Path>, explicit: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));
    if let Some(path) = default_file {
        figment = figment.merge(Toml::file(path));
    }
    if let Some(path) = explicit {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX))
}
