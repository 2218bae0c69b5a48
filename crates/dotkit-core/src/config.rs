//! Settings management for dotkit.
//!
//! This module provides multi-layer configuration support with:
//! - File-based configuration
//! - Environment variable overrides
//!
//! ## Configuration Layers
//!
//! Configuration values are resolved in this priority order:
//! 1. Environment variables
//! 2. Values loaded from file
//! 3. Default values
//!
//! ## Example
//!
//! ```no_run
//! use dotkit_core::config::Settings;
//!
//! let settings = Settings::load().unwrap();
//! if let Some(secs) = settings.hooks.timeout_secs {
//!     println!("hooks time out after {}s", secs);
//! }
//! ```
//!
//! Installed-kit state is not kept here; see the kit store in `dotkit-kit`.

use dotkit_types::{DotkitError, Result};
use dotkit_types::config::{HooksConfig, LogConfig, SourcesConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::fs;

use crate::util::data::deep_merge;

/// Environment variable overriding `log.level`.
pub const ENV_LOG: &str = "DOTKIT_LOG";
/// Environment variable overriding `hooks.timeout_secs`.
pub const ENV_HOOK_TIMEOUT: &str = "DOTKIT_HOOK_TIMEOUT";
/// Environment variable overriding `sources.bundled_root`.
pub const ENV_BUNDLED_ROOT: &str = "DOTKIT_BUNDLED_ROOT";
/// Environment variable overriding `sources.package_roots` (`:`-separated).
pub const ENV_PACKAGE_PATH: &str = "DOTKIT_PACKAGE_PATH";

/// Configuration layer priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigLayer {
    /// Default values
    Default = 0,
    /// Values loaded from file
    Loaded = 1,
    /// Values from environment variables
    Environment = 2,
}

const MERGE_ORDER: [ConfigLayer; 3] = [
    ConfigLayer::Default,
    ConfigLayer::Loaded,
    ConfigLayer::Environment,
];

/// Layered key/value configuration.
///
/// This is the low-level configuration type. For the typed view, see
/// [`Settings`].
#[derive(Clone, Debug, Default)]
pub struct Config {
    layers: HashMap<ConfigLayer, Value>,
}

impl Config {
    /// Create a new configuration from a file path.
    ///
    /// If the file doesn't exist, an empty configuration is created.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut layers = HashMap::new();

        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| DotkitError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

            if !content.trim().is_empty() {
                let value: Value = serde_yaml::from_str(&content)
                    .map_err(|e| DotkitError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
                layers.insert(ConfigLayer::Loaded, value);
            }
        }

        Ok(Self { layers })
    }

    /// Set the default layer.
    pub fn with_defaults(mut self, defaults: impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(defaults)
            .map_err(|e| DotkitError::Config(format!("Failed to serialize defaults: {}", e)))?;
        self.layers.insert(ConfigLayer::Default, value);
        Ok(self)
    }

    /// Populate the environment layer from `(name, value)` pairs.
    ///
    /// Unknown names are ignored. Unparseable values are rejected.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut env_layer = Value::Object(Default::default());

        for (name, value) in vars {
            let value = value.as_ref();
            match name.as_ref() {
                ENV_LOG => {
                    // Full filter directives are handled by the log module.
                    let level = value.to_lowercase();
                    if matches!(level.as_str(), "error" | "warn" | "info" | "debug" | "trace") {
                        Self::set_value_at_path(&mut env_layer, "log.level", Value::String(level))?;
                    }
                }
                ENV_HOOK_TIMEOUT => {
                    let secs: u64 = value.parse().map_err(|_| DotkitError::Config(format!(
                        "{} must be a whole number of seconds, got '{}'",
                        ENV_HOOK_TIMEOUT, value
                    )))?;
                    Self::set_value_at_path(&mut env_layer, "hooks.timeout_secs", Value::from(secs))?;
                }
                ENV_BUNDLED_ROOT => {
                    Self::set_value_at_path(&mut env_layer, "sources.bundled_root", Value::String(value.to_string()))?;
                }
                ENV_PACKAGE_PATH => {
                    let roots: Vec<Value> = std::env::split_paths(value)
                        .filter(|p| !p.as_os_str().is_empty())
                        .map(|p| Value::String(p.to_string_lossy().into_owned()))
                        .collect();
                    Self::set_value_at_path(&mut env_layer, "sources.package_roots", Value::Array(roots))?;
                }
                _ => {}
            }
        }

        self.layers.insert(ConfigLayer::Environment, env_layer);
        Ok(self)
    }

    /// Get merged data from all layers.
    pub fn merged_data(&self) -> Value {
        let mut merged = Value::Object(serde_json::Map::new());

        for layer in &MERGE_ORDER {
            if let Some(layer_data) = self.layers.get(layer) {
                merged = deep_merge(merged, layer_data.clone());
            }
        }

        merged
    }

    fn set_value_at_path(data: &mut Value, path: &str, value: Value) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();
        let (last, parents) = match parts.split_last() {
            Some(split) if !split.0.is_empty() => split,
            _ => return Err(DotkitError::Config("Empty path".to_string())),
        };

        let mut current = data;
        for part in parents {
            if !current.is_object() {
                *current = Value::Object(Default::default());
            }
            let map = match current.as_object_mut() {
                Some(map) => map,
                None => dotkit_types::bug!("value at '{}' is not an object after coercion", part),
            };
            current = map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
        }

        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        if let Some(obj) = current.as_object_mut() {
            obj.insert(last.to_string(), value);
        }

        Ok(())
    }
}

/// User-wide dotkit settings (`~/.dotkit/settings.yaml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,

    /// Hook router configuration
    #[serde(default)]
    pub hooks: HooksConfig,

    /// Kit source configuration
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Settings {
    /// Load settings from the default location with environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(path, std::env::vars())
    }

    /// Load settings from a specific path with the given environment.
    pub fn load_from<I, K, V>(path: impl AsRef<Path>, env: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let config = Config::load(path)?
            .with_defaults(Settings::default())?
            .with_env(env)?;
        Self::from_config(&config)
    }

    /// Build the typed view from a layered configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut settings: Settings = serde_json::from_value(config.merged_data())
            .map_err(|e| DotkitError::Config(format!("Failed to parse settings: {}", e)))?;

        settings.log.file = settings.log.file.map(crate::util::expand_path);
        settings.sources.bundled_root = settings.sources.bundled_root.map(crate::util::expand_path);
        settings.sources.package_roots = settings.sources.package_roots
            .into_iter()
            .map(crate::util::expand_path)
            .collect();

        Ok(settings)
    }

    /// Get the default path for the settings file.
    pub fn default_path() -> Result<PathBuf> {
        Ok(dotkit_home()?.join("settings.yaml"))
    }

    /// Bundled kit data root, falling back to the platform data directory.
    pub fn bundled_root(&self) -> Option<PathBuf> {
        self.sources.bundled_root.clone().or_else(|| {
            dirs::data_dir().map(|d| d.join(crate::APP_NAME).join("bundled"))
        })
    }
}

/// The per-user dotkit directory (`~/.dotkit`).
pub fn dotkit_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".dotkit"))
        .ok_or_else(|| DotkitError::Config("Could not determine home directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotkit_types::LogLevel;
    use tempfile::TempDir;

    fn no_env() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn test_config_layers() {
        let mut config = Config::default();

        config.layers.insert(
            ConfigLayer::Default,
            serde_json::json!({"key": "default_value", "other": {"a": 1, "b": 2}}),
        );
        config.layers.insert(
            ConfigLayer::Loaded,
            serde_json::json!({"key": "loaded_value", "other": {"b": 3}}),
        );
        assert_eq!(
            config.merged_data(),
            serde_json::json!({"key": "loaded_value", "other": {"a": 1, "b": 3}})
        );

        let config = config.with_env([(ENV_BUNDLED_ROOT, "/srv/kits")]).unwrap();
        assert_eq!(config.merged_data()["sources"]["bundled_root"], "/srv/kits");
        assert_eq!(config.merged_data()["key"], "loaded_value");
    }

    #[test]
    fn test_settings_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(temp_dir.path().join("settings.yaml"), no_env()).unwrap();

        assert_eq!(settings.log.level, LogLevel::Info);
        assert!(settings.hooks.timeout_secs.is_none());
        assert!(settings.sources.package_roots.is_empty());
    }

    #[test]
    fn test_settings_file_then_env_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "log:\n  level: warn\nhooks:\n  timeout_secs: 30\n").unwrap();

        let env = vec![
            (ENV_LOG.to_string(), "DEBUG".to_string()),
            (ENV_PACKAGE_PATH.to_string(), "/opt/a:/opt/b".to_string()),
        ];
        let settings = Settings::load_from(&path, env).unwrap();

        assert_eq!(settings.log.level, LogLevel::Debug);
        assert_eq!(settings.hooks.timeout_secs, Some(30));
        assert_eq!(
            settings.sources.package_roots,
            vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]
        );
    }

    #[test]
    fn test_log_filter_directive_leaves_level_alone() {
        let temp_dir = TempDir::new().unwrap();
        let env = vec![(ENV_LOG, "dotkit_kit=trace,warn")];
        let settings = Settings::load_from(temp_dir.path().join("settings.yaml"), env).unwrap();
        assert_eq!(settings.log.level, LogLevel::Info);
    }

    #[test]
    fn test_settings_malformed_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "log: [unclosed").unwrap();

        let result = Settings::load_from(&path, no_env());
        assert!(matches!(result, Err(DotkitError::Config(_))));
    }

    #[test]
    fn test_bad_timeout_env_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let env = vec![(ENV_HOOK_TIMEOUT, "soon")];
        let result = Settings::load_from(temp_dir.path().join("settings.yaml"), env);
        assert!(result.is_err());
    }
}
