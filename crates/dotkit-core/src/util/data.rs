//! YAML and JSON data handling utilities.

use dotkit_types::{DotkitError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::fs;

/// Load and deserialize a YAML file.
pub fn load_yaml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(DotkitError::Io)?;
    serde_yaml::from_str(&content).map_err(DotkitError::Yaml)
}

/// Serialize to YAML and replace the file atomically.
pub fn save_yaml_file(path: impl AsRef<Path>, data: &impl Serialize) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    super::fs::write_atomic(path, yaml.as_bytes())
}

/// Deep merge two values.
/// Recursively merges objects, with overlay values taking precedence.
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    match (&mut base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(base_val) => {
                        let current = std::mem::take(base_val);
                        *base_val = deep_merge(current, overlay_val);
                    }
                    None => {
                        base_map.insert(key, overlay_val);
                    }
                }
            }
            base
        }
        (_, overlay_val) => overlay_val,
    }
}
