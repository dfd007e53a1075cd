use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KeepsakeConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub capacity: CapacityConfig,
    pub maintenance: MaintenanceConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the tier files and the archive subdirectory.
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CapacityConfig {
    pub short_term: usize,
    pub long_term: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Heartbeat for the archive sweep.
    pub heartbeat_secs: u64,
    /// Interval for the short→long migration pass.
    pub migration_secs: u64,
    /// Decayed score at or below which an entry is archived.
    pub archive_threshold: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_max_results: usize,
    /// Bound of the per-tier journaled write queue.
    pub journal_depth: usize,
}

impl Default for KeepsakeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            capacity: CapacityConfig::default(),
            maintenance: MaintenanceConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = default_keepsake_dir().to_string_lossy().into_owned();
        Self { data_dir }
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            short_term: 100,
            long_term: 500,
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: 10,
            migration_secs: 600,
            archive_threshold: 0.1,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_max_results: 5,
            journal_depth: 64,
        }
    }
}

/// Returns `~/.keepsake/`
pub fn default_keepsake_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".keepsake")
}

/// Returns the default config file path: `~/.keepsake/config.toml`
pub fn default_config_path() -> PathBuf {
    default_keepsake_dir().join("config.toml")
}

impl KeepsakeConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            KeepsakeConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (KEEPSAKE_DATA_DIR, KEEPSAKE_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("KEEPSAKE_DATA_DIR") {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("KEEPSAKE_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the data directory, expanding `~` if needed.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.data_dir)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.maintenance.heartbeat_secs)
    }

    pub fn migration_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance.migration_secs)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = KeepsakeConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.capacity.short_term, 100);
        assert_eq!(config.capacity.long_term, 500);
        assert_eq!(config.maintenance.heartbeat_secs, 10);
        assert_eq!(config.maintenance.migration_secs, 600);
        assert_eq!(config.maintenance.archive_threshold, 0.1);
        assert!(config.storage.data_dir.ends_with(".keepsake"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
data_dir = "/tmp/keepsake-test"

[capacity]
short_term = 10

[maintenance]
heartbeat_secs = 2
"#;
        let config: KeepsakeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.data_dir, "/tmp/keepsake-test");
        assert_eq!(config.capacity.short_term, 10);
        assert_eq!(config.maintenance.heartbeat_secs, 2);
        // defaults still apply for unset fields
        assert_eq!(config.capacity.long_term, 500);
        assert_eq!(config.retrieval.default_max_results, 5);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = KeepsakeConfig::default();
        std::env::set_var("KEEPSAKE_DATA_DIR", "/tmp/override-dir");
        std::env::set_var("KEEPSAKE_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.data_dir, "/tmp/override-dir");
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("KEEPSAKE_DATA_DIR");
        std::env::remove_var("KEEPSAKE_LOG_LEVEL");
    }
}
