//! Daemon configuration.
//!
//! Read from `$XDG_CONFIG_HOME/fpd/config.toml` unless a path is given
//! explicitly. A missing file yields the defaults; a malformed one is an
//! error. `FPD_SOCKET` overrides the socket path in every case.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default socket path
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/fpd.sock";

/// Environment variable overriding the socket path
pub const SOCKET_ENV: &str = "FPD_SOCKET";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub socket_path: PathBuf,

    /// Load the demo device, users and log at startup
    pub seed_demo_data: bool,

    /// Seconds between device status draws (0 disables the timer)
    pub device_refresh_secs: u64,

    /// Seconds between simulated access events (0 disables the timer)
    pub access_simulation_secs: u64,

    /// Chance that a device draw comes out online
    pub online_probability: f64,

    /// Chance that a simulated access event is granted
    pub grant_probability: f64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            seed_demo_data: true,
            device_refresh_secs: 30,
            access_simulation_secs: 0,
            online_probability: 0.8,
            grant_probability: 0.7,
        }
    }
}

impl DaemonConfig {
    /// Default config file location, if a config directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fpd").join("config.toml"))
    }

    /// Loads the config from `path`, or the default location when `None`.
    ///
    /// Applies the `FPD_SOCKET` override and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        if let Ok(socket) = std::env::var(SOCKET_ENV) {
            if !socket.is_empty() {
                config.socket_path = PathBuf::from(socket);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a config file without applying environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("online_probability", self.online_probability),
            ("grant_probability", self.grant_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be between 0 and 1, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn device_refresh_interval(&self) -> Option<Duration> {
        (self.device_refresh_secs > 0).then(|| Duration::from_secs(self.device_refresh_secs))
    }

    pub fn access_simulation_interval(&self) -> Option<Duration> {
        (self.access_simulation_secs > 0).then(|| Duration::from_secs(self.access_simulation_secs))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {error}")]
    Read { path: PathBuf, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
