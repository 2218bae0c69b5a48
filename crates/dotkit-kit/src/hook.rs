//! Hook manifests and enable/disable state.

use crate::manifest::{is_safe_relative, version_string};
use dotkit_core::util::save_yaml_file;
use dotkit_types::{ArtifactType, DotkitError, KitId, Lifecycle, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File name of a kit's hook manifest inside its hook directory.
pub const HOOK_MANIFEST_FILE: &str = "hooks.yaml";

fn default_enabled() -> bool {
    true
}

/// One hook declared by a kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    /// Hook name, unique within its manifest
    pub name: String,
    /// Lifecycle event the hook runs for
    pub lifecycle: Lifecycle,
    /// Regex tested against the serialized event context; empty always matches
    #[serde(default)]
    pub matcher: String,
    /// Script path relative to the kit's hook directory
    pub script: String,
    /// Whether the router runs this hook
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// What the hook does
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A kit's `hooks.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookManifest {
    /// Owning kit
    pub kit_id: KitId,
    /// Owning kit version
    #[serde(deserialize_with = "version_string")]
    pub kit_version: String,
    /// Hooks in execution order
    #[serde(default)]
    pub hooks: Vec<HookConfig>,
}

impl HookManifest {
    /// Manifest path for a kit under a hook root.
    pub fn path_for(hook_root: &Path, kit_id: &KitId) -> PathBuf {
        hook_root.join(kit_id.as_str()).join(HOOK_MANIFEST_FILE)
    }

    /// Load a manifest. Schema violations are validation errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DotkitError::NotFound(format!(
                "No hook manifest at {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| DotkitError::Validation(format!("Invalid {}: {}", path.display(), e)))
    }

    /// Collect every schema problem in the manifest.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut names = HashSet::new();

        for (index, hook) in self.hooks.iter().enumerate() {
            if hook.name.trim().is_empty() {
                errors.push(format!("Hook #{} has an empty name", index + 1));
            } else if !names.insert(hook.name.as_str()) {
                errors.push(format!("Duplicate hook name '{}'", hook.name));
            }

            if hook.script.trim().is_empty() {
                errors.push(format!("Hook '{}' has an empty script", hook.name));
            } else if !is_safe_relative(&hook.script) {
                errors.push(format!(
                    "Hook '{}' script '{}' must stay inside the hook directory",
                    hook.name, hook.script
                ));
            }
        }

        errors
    }

    /// Rewrite the manifest, refusing to persist an invalid one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(DotkitError::Validation(format!(
                "Hook manifest for '{}' is invalid: {}",
                self.kit_id,
                errors.join("; ")
            )));
        }

        save_yaml_file(path, self)
    }

    /// Find a hook by name.
    pub fn hook(&self, name: &str) -> Option<&HookConfig> {
        self.hooks.iter().find(|h| h.name == name)
    }
}

/// Hook root inside a managed root.
pub fn hook_root(managed_root: &Path) -> PathBuf {
    managed_root.join(ArtifactType::Hook.dir_name())
}

/// Set a hook's enabled flag and rewrite its manifest.
pub fn set_hook_enabled(
    hook_root: &Path,
    kit_id: &KitId,
    name: &str,
    enabled: bool,
) -> Result<HookManifest> {
    let path = HookManifest::path_for(hook_root, kit_id);
    let mut manifest = HookManifest::load(&path)?;

    let hook = match manifest.hooks.iter_mut().find(|h| h.name == name) {
        Some(hook) => hook,
        None => {
            let available: Vec<&str> = manifest.hooks.iter().map(|h| h.name.as_str()).collect();
            return Err(DotkitError::NotFound(format!(
                "Hook '{}' not found in kit '{}' (available: {})",
                name,
                kit_id,
                if available.is_empty() { "none".to_string() } else { available.join(", ") }
            )));
        }
    };

    hook.enabled = enabled;
    manifest.save(&path)?;

    info!(
        "{} hook '{}' of kit '{}'",
        if enabled { "Enabled" } else { "Disabled" },
        name,
        kit_id
    );
    Ok(manifest)
}

/// Enable a hook.
pub fn enable_hook(hook_root: &Path, kit_id: &KitId, name: &str) -> Result<HookManifest> {
    set_hook_enabled(hook_root, kit_id, name, true)
}

/// Disable a hook.
pub fn disable_hook(hook_root: &Path, kit_id: &KitId, name: &str) -> Result<HookManifest> {
    set_hook_enabled(hook_root, kit_id, name, false)
}

/// A hook together with the kit that declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitHook {
    /// Declaring kit
    pub kit_id: KitId,
    /// Declaring kit version
    pub kit_version: String,
    /// Kit hook directory; scripts resolve against it
    pub hook_dir: PathBuf,
    /// Hook declaration
    pub config: HookConfig,
}

impl KitHook {
    /// Absolute script path.
    pub fn script_path(&self) -> PathBuf {
        self.hook_dir.join(&self.config.script)
    }
}

/// Load every valid kit manifest under `hook_root`, in directory name order.
///
/// Unreadable or invalid manifests are logged and skipped.
pub fn load_manifests(hook_root: &Path) -> Vec<(PathBuf, HookManifest)> {
    if !hook_root.is_dir() {
        debug!("No hook root at {}", hook_root.display());
        return Vec::new();
    }

    let mut manifests = Vec::new();
    for entry in WalkDir::new(hook_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
    {
        let hook_dir = entry.into_path();
        let path = hook_dir.join(HOOK_MANIFEST_FILE);

        let manifest = match HookManifest::load(&path) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Skipping hooks in {}: {}", hook_dir.display(), e);
                continue;
            }
        };

        let errors = manifest.validate();
        if !errors.is_empty() {
            warn!("Skipping invalid {}: {}", path.display(), errors.join("; "));
            continue;
        }

        if hook_dir.file_name().and_then(|n| n.to_str()) != Some(manifest.kit_id.as_str()) {
            warn!(
                "Skipping {}: declares kit '{}' but lives in another kit's directory",
                path.display(),
                manifest.kit_id
            );
            continue;
        }

        manifests.push((hook_dir, manifest));
    }

    manifests
}

/// Every hook under `hook_root`, in execution order.
pub fn list_hooks(hook_root: &Path) -> Vec<KitHook> {
    load_manifests(hook_root)
        .into_iter()
        .flat_map(|(hook_dir, manifest)| {
            let HookManifest { kit_id, kit_version, hooks } = manifest;
            hooks.into_iter().map(move |config| KitHook {
                kit_id: kit_id.clone(),
                kit_version: kit_version.clone(),
                hook_dir: hook_dir.clone(),
                config,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GUARD: &str = r#"
kit_id: demo
kit_version: 1.0.0
hooks:
  - name: guard
    lifecycle: PreToolUse
    matcher: "Bash"
    script: guard.sh
    enabled: false
  - name: notify
    lifecycle: Stop
    script: notify.py
"#;

    fn write_manifest(hook_root: &Path, kit: &str, content: &str) -> PathBuf {
        let dir = hook_root.join(kit);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(HOOK_MANIFEST_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_applies_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(temp_dir.path(), "demo", GUARD);

        let manifest = HookManifest::load(&path).unwrap();
        assert_eq!(manifest.hooks.len(), 2);
        let notify = manifest.hook("notify").unwrap();
        assert_eq!(notify.matcher, "");
        assert!(notify.enabled);
        assert_eq!(notify.lifecycle, Lifecycle::Stop);
        assert!(manifest.validate().is_empty());
    }

    #[test]
    fn test_unknown_lifecycle_is_validation_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(
            temp_dir.path(),
            "demo",
            "kit_id: demo\nkit_version: 1\nhooks:\n  - name: x\n    lifecycle: OnBoot\n    script: x.sh\n",
        );
        assert!(matches!(HookManifest::load(&path), Err(DotkitError::Validation(_))));
    }

    #[test]
    fn test_duplicate_names_block_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(temp_dir.path(), "demo", GUARD);
        let mut manifest = HookManifest::load(&path).unwrap();
        manifest.hooks[1].name = "guard".to_string();

        let errors = manifest.validate();
        assert!(!errors.is_empty());
        assert!(errors.iter().any(|e| e.contains("Duplicate hook name 'guard'")));

        assert!(matches!(manifest.save(&path), Err(DotkitError::Validation(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), GUARD);
    }

    #[test]
    fn test_validate_rejects_empty_and_escaping_fields() {
        let manifest = HookManifest {
            kit_id: KitId::new("demo").unwrap(),
            kit_version: "1.0.0".to_string(),
            hooks: vec![
                HookConfig {
                    name: " ".to_string(),
                    lifecycle: Lifecycle::Stop,
                    matcher: String::new(),
                    script: "../outside.sh".to_string(),
                    enabled: true,
                    description: None,
                },
                HookConfig {
                    name: "x".to_string(),
                    lifecycle: Lifecycle::Stop,
                    matcher: String::new(),
                    script: String::new(),
                    enabled: true,
                    description: None,
                },
            ],
        };
        assert_eq!(manifest.validate().len(), 3);
    }

    #[test]
    fn test_enable_then_disable_restores_manifest() {
        let temp_dir = TempDir::new().unwrap();
        write_manifest(temp_dir.path(), "demo", GUARD);
        let kit_id = KitId::new("demo").unwrap();
        let path = HookManifest::path_for(temp_dir.path(), &kit_id);
        let original = HookManifest::load(&path).unwrap();

        let enabled = enable_hook(temp_dir.path(), &kit_id, "guard").unwrap();
        assert!(enabled.hook("guard").unwrap().enabled);
        assert_eq!(HookManifest::load(&path).unwrap(), enabled);

        let disabled = disable_hook(temp_dir.path(), &kit_id, "guard").unwrap();
        assert_eq!(disabled, original);
        assert_eq!(HookManifest::load(&path).unwrap(), original);
    }

    #[test]
    fn test_toggle_unknown_hook_lists_available() {
        let temp_dir = TempDir::new().unwrap();
        write_manifest(temp_dir.path(), "demo", GUARD);
        let kit_id = KitId::new("demo").unwrap();

        let err = enable_hook(temp_dir.path(), &kit_id, "missing").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("guard, notify"));

        let other = KitId::new("other").unwrap();
        assert!(enable_hook(temp_dir.path(), &other, "guard").unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_hooks_skips_broken_kits() {
        let temp_dir = TempDir::new().unwrap();
        write_manifest(temp_dir.path(), "alpha", "kit_id: alpha\nhooks: {not: a list}\n");
        write_manifest(temp_dir.path(), "demo", GUARD);
        write_manifest(temp_dir.path(), "zeta", "kit_id: demo\nkit_version: 1\n");
        fs::create_dir_all(temp_dir.path().join("empty")).unwrap();

        let hooks = list_hooks(temp_dir.path());
        let names: Vec<&str> = hooks.iter().map(|h| h.config.name.as_str()).collect();
        assert_eq!(names, vec!["guard", "notify"]);
        assert_eq!(hooks[0].script_path(), temp_dir.path().join("demo").join("guard.sh"));
    }
}
