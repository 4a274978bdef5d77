//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/folio/config.toml)
//! 3. Environment variables (FOLIO_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::DEFAULT_QUOTA_BYTES;

/// Environment variable prefix
const ENV_PREFIX: &str = "FOLIO";

/// Default autosave interval in seconds
pub const DEFAULT_AUTOSAVE_SECS: u64 = 30;

/// Keys accepted by [`Config::set_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "data_dir",
    "autosave_interval_secs",
    "storage_quota_bytes",
    "log_level",
];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Seconds between autosaves of the open document; 0 disables autosave
    #[serde(default = "default_autosave_secs")]
    pub autosave_interval_secs: u64,

    /// Byte quota for stored documents
    #[serde(default = "default_quota")]
    pub storage_quota_bytes: usize,

    /// Log level for the `folio_*` crates
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            autosave_interval_secs: DEFAULT_AUTOSAVE_SECS,
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (FOLIO_DATA_DIR, FOLIO_AUTOSAVE_SECS, ...)
    /// 2. Config file (~/.config/folio/config.toml or FOLIO_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load from an explicit path when given, otherwise the default location
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Unparseable numeric values are ignored with a warning.
    fn apply_env_overrides(&mut self) {
        // FOLIO_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // FOLIO_AUTOSAVE_SECS
        if let Ok(val) = std::env::var(format!("{}_AUTOSAVE_SECS", ENV_PREFIX)) {
            match val.trim().parse() {
                Ok(secs) => self.autosave_interval_secs = secs,
                Err(_) => warn!("Ignoring invalid {}_AUTOSAVE_SECS: {:?}", ENV_PREFIX, val),
            }
        }

        // FOLIO_STORAGE_QUOTA
        if let Ok(val) = std::env::var(format!("{}_STORAGE_QUOTA", ENV_PREFIX)) {
            match val.trim().parse() {
                Ok(bytes) => self.storage_quota_bytes = bytes,
                Err(_) => warn!("Ignoring invalid {}_STORAGE_QUOTA: {:?}", ENV_PREFIX, val),
            }
        }

        // FOLIO_LOG_LEVEL
        if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.log_level = val;
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Set a value by key, parsing it to the field's type
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "autosave_interval_secs" => {
                self.autosave_interval_secs = value.parse().with_context(|| {
                    format!("Invalid value for autosave_interval_secs: '{}'", value)
                })?
            }
            "storage_quota_bytes" => {
                self.storage_quota_bytes = value.parse().with_context(|| {
                    format!("Invalid value for storage_quota_bytes: '{}'", value)
                })?
            }
            "log_level" => self.log_level = value.to_string(),
            _ => bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with FOLIO_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio")
            .join("config.toml")
    }

    /// Directory holding one JSON file per stored key
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
}

fn default_autosave_secs() -> u64 {
    DEFAULT_AUTOSAVE_SECS
}

fn default_quota() -> usize {
    DEFAULT_QUOTA_BYTES
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "FOLIO_DATA_DIR",
        "FOLIO_AUTOSAVE_SECS",
        "FOLIO_STORAGE_QUOTA",
        "FOLIO_LOG_LEVEL",
        "FOLIO_CONFIG",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data_dir.ends_with("folio"));
        assert_eq!(config.autosave_interval_secs, 30);
        assert_eq!(config.storage_quota_bytes, 10 * 1024 * 1024);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_documents_dir() {
        let config = Config {
            data_dir: PathBuf::from("/data/folio"),
            ..Config::default()
        };
        assert_eq!(config.documents_dir(), PathBuf::from("/data/folio/documents"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("FOLIO_DATA_DIR", "/tmp/folio-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/folio-test"));
    }

    #[test]
    fn test_env_override_numbers() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("FOLIO_AUTOSAVE_SECS", "5");
        env::set_var("FOLIO_STORAGE_QUOTA", "2048");
        config.apply_env_overrides();
        assert_eq!(config.autosave_interval_secs, 5);
        assert_eq!(config.storage_quota_bytes, 2048);

        // Invalid values leave the current setting alone
        env::set_var("FOLIO_AUTOSAVE_SECS", "soon");
        config.apply_env_overrides();
        assert_eq!(config.autosave_interval_secs, 5);
    }

    #[test]
    fn test_env_override_log_level() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("FOLIO_LOG_LEVEL", "debug");
        config.apply_env_overrides();
        assert_eq!(config.log_level, "debug");

        // Empty string keeps the previous value
        env::set_var("FOLIO_LOG_LEVEL", "");
        config.apply_env_overrides();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/folio"),
            autosave_interval_secs: 10,
            storage_quota_bytes: 4096,
            log_level: "info".to_string(),
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("autosave_interval_secs"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            autosave_interval_secs = 0
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.autosave_interval_secs, 0);
        // Missing keys fall back to defaults
        assert_eq!(config.storage_quota_bytes, DEFAULT_QUOTA_BYTES);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        env::set_var("FOLIO_DATA_DIR", &data_dir);

        let path = temp_dir.path().join("missing.toml");
        let config = Config::load_from_path(&path).unwrap();

        // Defaults, with the data directory created
        assert_eq!(config.autosave_interval_secs, DEFAULT_AUTOSAVE_SECS);
        assert_eq!(config.data_dir, data_dir);
        assert!(data_dir.exists());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config {
            data_dir: temp_dir.path().join("data"),
            ..Config::default()
        };
        config.set_value("autosave_interval_secs", "12").unwrap();
        config.save_to_path(&path).unwrap();

        let reloaded = Config::load_from_path(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();

        config.set_value("log_level", "trace").unwrap();
        config.set_value("storage_quota_bytes", "100").unwrap();
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.storage_quota_bytes, 100);

        assert!(config.set_value("storage_quota_bytes", "lots").is_err());
        let err = config.set_value("sync_url", "x").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }
}
