//! Kit manifest parsing and validation.

use dotkit_types::{ArtifactType, DotkitError, KitId, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path};

/// File name of a kit manifest inside a kit directory.
pub const KIT_MANIFEST_FILE: &str = "kit.yaml";

/// Kit manifest from kit.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitManifest {
    /// Kit identifier
    #[serde(rename = "name")]
    pub kit_id: KitId,

    /// Kit version, compared as an opaque string
    #[serde(deserialize_with = "version_string")]
    pub version: String,

    /// Kit description
    #[serde(default)]
    pub description: String,

    /// Artifact source paths by type, in declaration order
    #[serde(default)]
    pub artifacts: IndexMap<ArtifactType, Vec<String>>,

    /// License identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Kit homepage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Other kits this kit expects to be installed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl KitManifest {
    /// Load manifest from a kit.yaml file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DotkitError::Kit(format!("Failed to read {}: {}", path.display(), e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| DotkitError::Validation(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Validate manifest fields and artifact paths.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(DotkitError::Validation(format!(
                "Kit '{}' has an empty version",
                self.kit_id
            )));
        }

        let mut seen = HashSet::new();
        for (artifact_type, path) in self.iter_artifacts() {
            if !is_safe_relative(path) {
                return Err(DotkitError::Validation(format!(
                    "Kit '{}' {} artifact path '{}' must be relative and stay inside the kit",
                    self.kit_id, artifact_type, path
                )));
            }
            if !seen.insert(path) {
                return Err(DotkitError::Validation(format!(
                    "Kit '{}' lists artifact '{}' more than once",
                    self.kit_id, path
                )));
            }
        }

        Ok(())
    }

    /// Check that every listed artifact exists under `base`.
    pub fn validate_sources(&self, base: impl AsRef<Path>) -> Result<()> {
        let base = base.as_ref();
        let missing: Vec<&str> = self.iter_artifacts()
            .filter(|(_, path)| !base.join(path).exists())
            .map(|(_, path)| path)
            .collect();

        if !missing.is_empty() {
            return Err(DotkitError::Validation(format!(
                "Kit '{}' is missing artifacts under {}: {}",
                self.kit_id,
                base.display(),
                missing.join(", ")
            )));
        }

        Ok(())
    }

    /// Iterate `(type, path)` pairs in declaration order.
    pub fn iter_artifacts(&self) -> impl Iterator<Item = (ArtifactType, &str)> {
        self.artifacts
            .iter()
            .flat_map(|(artifact_type, paths)| paths.iter().map(move |p| (*artifact_type, p.as_str())))
    }

    /// Total number of listed artifacts.
    pub fn artifact_count(&self) -> usize {
        self.artifacts.values().map(Vec::len).sum()
    }
}

/// Accept unquoted numeric versions (`version: 1.0`) as their literal text.
pub(crate) fn version_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a version string, found {:?}",
            other
        ))),
    }
}

pub(crate) fn is_safe_relative(path: &str) -> bool {
    if path.trim().is_empty() || path.contains('\\') {
        return false;
    }
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
