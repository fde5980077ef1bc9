//! Service configuration.
//!
//! ```yaml
//! http:
//!   port: 8081
//!   timeout: 1m
//! db:
//!   path: data/geodata.dat
//! ```
//!
//! Every section and field is optional. Unknown keys are rejected, so a
//! misspelled setting fails the load instead of falling back to its
//! default. `port` may be written as a number or a quoted string and
//! `timeout` takes a duration such as `5s`, `1m` or `1500ms`.

use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8081;

/// Default request timeout (1 minute).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default database path.
pub const DEFAULT_DB_PATH: &str = "data/geodata.dat";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub http: HttpConfig,
    pub db: DbConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Port to listen on (all interfaces)
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> std::result::Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port {:?}", text))),
    }
}

/// Database settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Path to the geobase file
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that would prevent the service from starting.
    pub fn validate(&self) -> Result<()> {
        if self.http.port == 0 {
            return Err(Error::Config("http.port must not be 0".to_string()));
        }
        if self.http.timeout.is_zero() {
            return Err(Error::Config("http.timeout must not be 0".to_string()));
        }
        if self.db.path.as_os_str().is_empty() {
            return Err(Error::Config("db.path must not be empty".to_string()));
        }
        Ok(())
    }
}
