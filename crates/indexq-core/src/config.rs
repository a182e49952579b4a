use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::IndexqError;

/// Global indexq configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Query service configuration
    pub daemon: DaemonConfig,

    /// Index store discovery configuration
    pub store: StoreConfig,

    /// Log file configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Address to listen on
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Close a connection after this many idle seconds (0 = never)
    pub idle_timeout: u64,

    /// Largest accepted request line (bytes)
    pub max_request_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Build cache root holding one directory per project build
    /// (default: ~/Library/Developer/Xcode/DerivedData)
    pub cache_root: Option<PathBuf>,

    /// Store locations inside a cache entry, tried in order
    pub store_subpaths: Vec<String>,

    /// Occurrence export read by the snapshot backend
    pub snapshot_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Also write logs to this file (stderr only when unset)
    pub file: Option<PathBuf>,

    /// Rotate the log file once it grows past this size (bytes)
    pub max_bytes: u64,

    /// Rotated files to keep next to the active one
    pub keep: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7949,
            idle_timeout: 0,
            max_request_bytes: 1024 * 1024, // 1MB
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_root: None,
            store_subpaths: vec![
                "Index.noindex/DataStore".into(),
                "Index/DataStore".into(),
            ],
            snapshot_file: "occurrences.json".into(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            max_bytes: 10 * 1024 * 1024, // 10MB
            keep: 3,
        }
    }
}

impl Config {
    /// Load config from default locations (in order of precedence):
    /// 1. $PWD/.indexq.toml
    /// 2. $XDG_CONFIG_HOME/indexq/config.toml
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(content) = std::fs::read_to_string(".indexq.toml") {
            if let Ok(config) = toml::from_str(&content) {
                return config;
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("indexq").join("config.toml");
            if let Ok(content) = std::fs::read_to_string(&config_path) {
                if let Ok(config) = toml::from_str(&content) {
                    return config;
                }
            }
        }

        Self::default()
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Address the service listens on and clients connect to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.daemon.host, self.daemon.port)
    }
}

impl DaemonConfig {
    /// Reject settings the service cannot run with
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.host.trim().is_empty() {
            return Err(IndexqError::Config("daemon.host must not be empty".to_string()));
        }
        if self.max_request_bytes == 0 {
            return Err(IndexqError::Config("daemon.max_request_bytes must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl StoreConfig {
    /// Get the build cache root, using default if not specified
    pub fn cache_root(&self) -> PathBuf {
        self.cache_root.clone().unwrap_or_else(default_cache_root)
    }
}

fn default_cache_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join("Library")
        .join("Developer")
        .join("Xcode")
        .join("DerivedData")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [daemon]
            port = 9000

            [store]
            cache_root = "/tmp/derived"
            "#,
        )
        .unwrap();

        assert_eq!(config.daemon.port, 9000);
        assert_eq!(config.daemon.host, "127.0.0.1");
        assert_eq!(config.store.cache_root(), PathBuf::from("/tmp/derived"));
        assert_eq!(config.store.snapshot_file, "occurrences.json");
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
        assert!(config.log.file.is_none());
        assert_eq!(config.log.keep, 3);
    }

    #[test]
    fn test_log_section() {
        let config: Config = toml::from_str(
            r#"
            [log]
            file = "/tmp/indexq.log"
            max_bytes = 4096
            "#,
        )
        .unwrap();

        assert_eq!(config.log.file, Some(PathBuf::from("/tmp/indexq.log")));
        assert_eq!(config.log.max_bytes, 4096);
        assert_eq!(config.log.keep, 3);
    }

    #[test]
    fn test_load_from_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[daemon\nport = ").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_daemon_config_validation() {
        assert!(DaemonConfig::default().validate().is_ok());

        let empty_requests = DaemonConfig {
            max_request_bytes: 0,
            ..DaemonConfig::default()
        };
        assert!(matches!(empty_requests.validate(), Err(IndexqError::Config(_))));

        let no_host = DaemonConfig {
            host: " ".to_string(),
            ..DaemonConfig::default()
        };
        assert!(matches!(no_host.validate(), Err(IndexqError::Config(_))));
    }
}
