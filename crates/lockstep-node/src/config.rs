//! Node configuration.
//!
//! [`NodeConfig`] is layered with the `config` crate: built-in defaults, then
//! an optional TOML file, then `LOCKSTEP_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use lockstep_core::constants::{DEFAULT_DATA_DIR_NAME, SNAPSHOT_FILE_NAME};
use lockstep_core::types::AccountId;

/// Environment variable prefix, e.g. `LOCKSTEP_DATA_DIR`.
pub const ENV_PREFIX: &str = "LOCKSTEP";

/// Vesting coordinator account used when none is configured.
pub const DEFAULT_COORDINATOR: AccountId = AccountId([0xC0; 32]);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Root directory for persisted state.
    pub data_dir: PathBuf,
    /// Log level filter string (e.g. "info", "lockstep_ledger=debug").
    pub log_level: String,
    /// "text" or "json".
    pub log_format: String,
    /// Account of the vesting coordinator.
    pub coordinator: AccountId,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DATA_DIR_NAME);

        Self {
            data_dir,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            coordinator: DEFAULT_COORDINATOR,
        }
    }
}

impl NodeConfig {
    /// Load defaults, then `path` (if given, must exist), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).source(env))
            .build()?
            .try_deserialize()
    }

    /// Path of the escrow snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE_NAME)
    }
}
