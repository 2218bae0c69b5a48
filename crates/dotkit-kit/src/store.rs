//! Installed-kit state per configuration scope.

use chrono::{DateTime, Utc};
use dotkit_core::util::{load_yaml_file, save_yaml_file};
use dotkit_types::{ConfigScope, ConflictPolicy, DotkitError, KitId, Result, SourceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding dotkit state inside a project or home directory.
pub const STATE_DIR: &str = ".dotkit";

/// Directory artifacts are installed into inside a project or home directory.
pub const MANAGED_DIR: &str = ".claude";

const CONFIG_FILE: &str = "config.yaml";
const CONFIG_FORMAT_VERSION: &str = "1";

/// Record of a kit installed into a managed root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledKit {
    /// Kit identifier
    pub kit_id: KitId,
    /// Installed version
    pub version: String,
    /// Identifier the kit was resolved by
    pub source: String,
    /// Backend that resolved the kit
    pub source_type: SourceType,
    /// Install or last sync time
    pub installed_at: DateTime<Utc>,
    /// Artifact paths relative to the managed root, `/`-separated
    #[serde(default)]
    pub artifacts: Vec<String>,
    /// Conflict policy used for the install
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

/// Persistent state for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitConfig {
    /// State file format version
    #[serde(default = "default_format_version")]
    pub version: String,
    /// Policy used when a command doesn't pick one
    #[serde(default)]
    pub default_conflict_policy: ConflictPolicy,
    /// Installed kits by id
    #[serde(default)]
    pub kits: BTreeMap<KitId, InstalledKit>,
}

fn default_format_version() -> String {
    CONFIG_FORMAT_VERSION.to_string()
}

impl Default for KitConfig {
    fn default() -> Self {
        Self {
            version: default_format_version(),
            default_conflict_policy: ConflictPolicy::default(),
            kits: BTreeMap::new(),
        }
    }
}

impl KitConfig {
    /// Look up an installed kit.
    pub fn get(&self, kit_id: &KitId) -> Option<&InstalledKit> {
        self.kits.get(kit_id)
    }

    fn check_keys(&self, path: &Path) -> Result<()> {
        for (key, kit) in &self.kits {
            if key != &kit.kit_id {
                return Err(DotkitError::Config(format!(
                    "{}: entry '{}' records kit_id '{}'",
                    path.display(),
                    key,
                    kit.kit_id
                )));
            }
        }
        Ok(())
    }
}

/// Return a copy of `config` with `installed` recorded under its kit id.
pub fn update_kit(config: &KitConfig, installed: InstalledKit) -> KitConfig {
    let mut updated = config.clone();
    updated.kits.insert(installed.kit_id.clone(), installed);
    updated
}

/// Return a copy of `config` without `kit_id`.
pub fn remove_kit(config: &KitConfig, kit_id: &KitId) -> KitConfig {
    let mut updated = config.clone();
    updated.kits.remove(kit_id);
    updated
}

/// Locates and persists [`KitConfig`] for the project and user scopes.
///
/// The scopes are independent files and are never merged.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    project_dir: PathBuf,
    user_home: PathBuf,
}

impl ConfigStore {
    /// Create a store over explicit project and home directories.
    pub fn new(project_dir: impl Into<PathBuf>, user_home: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            user_home: user_home.into(),
        }
    }

    /// Create a store for `project_dir` and the current user's home.
    pub fn discover(project_dir: impl Into<PathBuf>) -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| DotkitError::Config("Could not determine home directory".to_string()))?;
        Ok(Self::new(project_dir, home))
    }

    fn scope_dir(&self, scope: ConfigScope) -> &Path {
        match scope {
            ConfigScope::Project => &self.project_dir,
            ConfigScope::User => &self.user_home,
        }
    }

    /// Path of the state file for a scope.
    pub fn config_path(&self, scope: ConfigScope) -> PathBuf {
        self.scope_dir(scope).join(STATE_DIR).join(CONFIG_FILE)
    }

    /// Directory artifacts for a scope are installed into.
    pub fn managed_root(&self, scope: ConfigScope) -> PathBuf {
        self.scope_dir(scope).join(MANAGED_DIR)
    }

    /// Load a scope's state. An absent file yields the default state.
    pub fn load(&self, scope: ConfigScope) -> Result<KitConfig> {
        let path = self.config_path(scope);
        if !path.exists() {
            debug!("No {} config at {}, using defaults", scope, path.display());
            return Ok(KitConfig::default());
        }

        let config: KitConfig = load_yaml_file(&path).map_err(|e| {
            DotkitError::Config(format!("Failed to load {}: {}", path.display(), e))
        })?;
        config.check_keys(&path)?;

        Ok(config)
    }

    /// Replace a scope's state file atomically.
    pub fn save(&self, scope: ConfigScope, config: &KitConfig) -> Result<()> {
        let path = self.config_path(scope);
        debug!("Saving {} config to {}", scope, path.display());
        save_yaml_file(&path, config)
    }
}
