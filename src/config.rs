//! Configuration management for the transfer core
//!
//! Transfer operations take their tunables from [`TransferSettings`].
//! Applications can build one directly, use the defaults, or layer a TOML
//! file and `FILEXFER_*` environment overrides with [`TransferSettings::load`].

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Tunables shared by downloaders, uploaders and the bundled collaborators
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TransferSettings {
    /// Upper bound for any single suspended stage, in seconds (0 disables)
    /// Environment: FILEXFER_STAGE_TIMEOUT_SECS
    pub stage_timeout_secs: u64,

    /// TCP connect timeout for the HTTP transport, in seconds
    pub connect_timeout_secs: u64,

    /// User agent sent by the HTTP transport
    pub user_agent: String,

    /// Chunk size for streamed upload bodies, in bytes
    pub chunk_size: usize,

    /// Default persistent root handed out by local storage
    /// Environment: FILEXFER_PERSISTENT_ROOT
    pub persistent_root: String,

    /// External storage root offered as the default save location, if any
    pub external_storage_root: Option<String>,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            stage_timeout_secs: 300,
            connect_timeout_secs: 30,
            user_agent: format!("filexfer/{}", env!("CARGO_PKG_VERSION")),
            chunk_size: 64 * 1024,
            persistent_root: "./filexfer_root".to_string(),
            external_storage_root: None,
        }
    }
}

impl TransferSettings {
    /// Load settings from an optional TOML file with `FILEXFER_*`
    /// environment overrides
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        Self::load_from(path, environment())
    }

    fn load_from(path: &str, env: Environment) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env)
            .build()?;

        let settings: TransferSettings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.chunk_size == 0 {
            return Err(config::ConfigError::Message(
                "chunk_size must be greater than 0".into(),
            ));
        }

        if self.persistent_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "persistent_root cannot be empty".into(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Stage timeout as Duration, `None` when disabled
    pub fn stage_timeout(&self) -> Option<Duration> {
        match self.stage_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Persistent root as PathBuf
    pub fn persistent_root_path(&self) -> PathBuf {
        PathBuf::from(&self.persistent_root)
    }
}

/// `FILEXFER_STAGE_TIMEOUT_SECS` style variables; `__` separates nested keys
fn environment() -> Environment {
    Environment::with_prefix("FILEXFER")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
