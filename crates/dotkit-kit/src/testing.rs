//! Shared fixtures for unit tests.

use crate::manifest::{KitManifest, KIT_MANIFEST_FILE};
use dotkit_types::{ResolvedKit, SourceType};
use std::fs;
use std::path::Path;

/// Write `kit.yaml` plus `files` under `root` and describe the result as a bundled kit.
pub(crate) fn write_kit(root: &Path, manifest: &str, files: &[(&str, &str)]) -> ResolvedKit {
    fs::create_dir_all(root).unwrap();
    let manifest_path = root.join(KIT_MANIFEST_FILE);
    fs::write(&manifest_path, manifest).unwrap();

    for (relative, content) in files {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    let parsed = KitManifest::load(&manifest_path).unwrap();
    ResolvedKit {
        source: parsed.kit_id.to_string(),
        kit_id: parsed.kit_id,
        source_type: SourceType::Bundled,
        manifest_path,
        artifacts_base: root.to_path_buf(),
    }
}

/// Manifest text for a kit with the given artifact block.
pub(crate) fn manifest(name: &str, version: &str, artifacts: &str) -> String {
    format!("name: {}\nversion: {}\nartifacts:\n{}", name, version, artifacts)
}
