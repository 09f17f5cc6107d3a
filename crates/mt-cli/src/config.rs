//! Configuration loading.
//!
//! Settings are layered, later sources winning: built-in defaults, then
//! `<config_dir>/mt/config.toml`, then an explicit `--config` file, then
//! `MT_`-prefixed environment variables.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use mt_api::DEFAULT_BASE_URL;

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the SQLite database lives.
    pub database_path: PathBuf,
    /// Base URL of the sync API.
    pub api_url: String,
    /// Bearer token for the sync API. Sync commands fail without one.
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            api_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
        }
    }
}

impl Config {
    /// Loads the layered configuration, with `explicit` merged between the
    /// default config file and the environment when passed.
    #[expect(
        clippy::result_large_err,
        reason = "figment errors carry their full provenance chain"
    )]
    pub fn load(explicit: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = default_config_path() {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed("MT_")).extract()
    }
}

// The token must never appear in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

/// Default config file: `<config_dir>/mt/config.toml`.
pub(crate) fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mt").join("config.toml"))
}

/// Sync state file: `<config_dir>/mt/sync.json`.
pub(crate) fn sync_state_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mt").join("sync.json"))
}

fn default_database_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("mt.db"),
        |dir| dir.join("mt").join("mt.db"),
    )
}
