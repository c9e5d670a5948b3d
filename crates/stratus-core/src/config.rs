//! Configuration module for Stratus.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, defaults, and a platform-appropriate default path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for Stratus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub watch: WatchConfig,
    pub store: StoreConfig,
    pub remote: RemoteConfig,
    pub control: ControlConfig,
    pub logging: LoggingConfig,
    pub secret: SecretConfig,
}

/// Watch engine cadence settings.
///
/// The scan is cheap and frequent; the persistence flush and backup check
/// are coarser and periodic (several scans per maintenance tick).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between change-detection scans.
    pub scan_interval: u64,
    /// Seconds between persistence flushes / backup checks.
    pub maintenance_interval: u64,
}

/// Durable index store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite index store file.
    pub db_path: PathBuf,
}

/// Replication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Root directory of the filesystem object store backend.
    pub object_root: PathBuf,
    /// Directory downloads are written under (the watched file's directory
    /// structure is recreated beneath it).
    pub download_dir: PathBuf,
    /// Seconds between transfer-queue drain cycles.
    pub poll_interval: u64,
}

/// Control socket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Path of the unix domain socket administrative clients connect to.
    pub socket_path: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Daemon secret settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretConfig {
    /// Hex-encoded daemon master key. The index-backup object name is
    /// derived deterministically from this, so daemons sharing a key
    /// converge on the same backup slot. Empty until configured.
    pub master_key: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/stratus/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("stratus")
            .join("config.yaml")
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stratus")
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            scan_interval: 5,
            maintenance_interval: 25,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: data_dir().join("index.db"),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            object_root: data_dir().join("objects"),
            download_dir: data_dir().join("restore"),
            poll_interval: 10,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/stratusd.sock"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_sane() {
        let config = Config::default();
        assert!(config.watch.scan_interval > 0);
        assert!(config.watch.maintenance_interval >= config.watch.scan_interval);
        assert_eq!(config.logging.level, "info");
        assert!(config.secret.master_key.is_empty());
    }

    #[test]
    fn test_default_path_is_nonempty() {
        assert!(!Config::default_path().as_os_str().is_empty());
    }

    #[test]
    fn test_load_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let loaded = Config::load(file.path()).unwrap();
        assert_eq!(loaded.watch.scan_interval, config.watch.scan_interval);
        assert_eq!(loaded.store.db_path, config.store.db_path);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/stratus.yaml"));
        assert_eq!(config.watch.scan_interval, 5);
    }
}
