//! Configuration loading and data folder resolution
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (`VEGSALES_*`, read by the binary's argument parser)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file is not an error: the service starts on defaults.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5730;

/// Default bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Physical persistence used by the sales store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Single SQLite database file (`sales.db`)
    #[default]
    Sqlite,
    /// One CSV file per table
    Csv,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "csv" => Ok(StorageBackend::Csv),
            other => Err(Error::Config(format!(
                "Unknown storage backend '{}' (expected 'sqlite' or 'csv')",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Csv => write!(f, "csv"),
        }
    }
}

/// Complete service configuration as read from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegsalesConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Store selection and location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Folder holding `sales.db` or the CSV tables; OS default when unset
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Data folder, falling back to the OS-dependent default
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Values supplied on the command line or through the environment
///
/// `None` leaves the TOML (or default) value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend: Option<StorageBackend>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl VegsalesConfig {
    /// Apply higher-priority overrides on top of this configuration
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(backend) = overrides.backend {
            self.storage.backend = backend;
        }
        if let Some(data_dir) = overrides.data_dir {
            self.storage.data_dir = Some(data_dir);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        self
    }
}

/// Default configuration file location: `<config_dir>/vegsales/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vegsales").join("config.toml"))
}

/// OS-dependent default data folder
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vegsales"))
        .unwrap_or_else(|| PathBuf::from("./vegsales_data"))
}

/// Load configuration from a TOML file
///
/// A missing file yields the defaults; an unreadable or unparseable file is an error.
pub fn load_toml_config(path: &Path) -> Result<VegsalesConfig> {
    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(VegsalesConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: VegsalesConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve the effective configuration
///
/// Reads the explicit `config_path` when given, otherwise the default location if one
/// exists, then applies command-line/environment overrides.
pub fn resolve_config(
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<VegsalesConfig> {
    let base = match config_path {
        Some(path) => load_toml_config(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => load_toml_config(&path)?,
            _ => VegsalesConfig::default(),
        },
    };

    Ok(base.with_overrides(overrides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VegsalesConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.logging.level, "info");
        assert!(!config.storage.resolved_data_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("sqlite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert_eq!(" CSV ".parse::<StorageBackend>().unwrap(), StorageBackend::Csv);
        assert!("postgres".parse::<StorageBackend>().is_err());
        assert_eq!(StorageBackend::Csv.to_string(), "csv");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: VegsalesConfig = toml::from_str(
            r#"
            [storage]
            backend = "csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Csv);
        assert_eq!(config.storage.data_dir, None);
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn test_overrides_win() {
        let config = VegsalesConfig::default().with_overrides(ConfigOverrides {
            port: Some(9000),
            data_dir: Some(PathBuf::from("/tmp/veg")),
            ..Default::default()
        });

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.storage.resolved_data_dir(), PathBuf::from("/tmp/veg"));
    }
}
