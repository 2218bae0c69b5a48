//! Artifact repository: classifies on-disk artifacts by provenance.
//!
//! A file recorded under an installed kit is [`Provenance::Managed`], even
//! when its embedded frontmatter names another kit. Otherwise a parseable
//! `__dotkit` block makes it [`Provenance::Unmanaged`], and anything else is
//! [`Provenance::Local`].

use crate::frontmatter::{self, ArtifactFrontmatter};
use crate::store::KitConfig;
use dotkit_types::{ArtifactType, KitId, Provenance, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Marker file identifying a skill bundle directory.
pub const SKILL_MARKER: &str = "SKILL.md";

/// Artifact types discovered under a managed root.
const DISCOVERED_TYPES: [ArtifactType; 3] =
    [ArtifactType::Agent, ArtifactType::Command, ArtifactType::Skill];

/// An artifact found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArtifact {
    /// Artifact type
    pub artifact_type: ArtifactType,
    /// Display name (`ns:name` for nested commands, `ns/name` otherwise)
    pub name: String,
    /// Absolute file path
    pub path: PathBuf,
    /// Path relative to the managed root, `/`-separated
    pub relative_path: String,
    /// Provenance classification
    pub provenance: Provenance,
    /// Owning kit, when known
    pub kit_id: Option<KitId>,
    /// Owning kit version, when known
    pub kit_version: Option<String>,
}

/// Normalize a recorded or discovered artifact path for comparison.
pub fn normalize_artifact_path(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    match normalized.strip_prefix(".claude/") {
        Some(rest) => rest.to_string(),
        None => normalized,
    }
}

/// Name an artifact is listed and selected by.
///
/// `within_type` is the file path (agents, commands, docs) or the bundle
/// directory (skills) relative to the type directory. Nested commands join
/// with `:`, everything else with `/`.
pub fn artifact_name(artifact_type: ArtifactType, within_type: &str) -> String {
    let within_type = within_type.trim_matches('/');
    if artifact_type == ArtifactType::Skill {
        return within_type.to_string();
    }

    let (dir, file) = within_type.rsplit_once('/').unwrap_or(("", within_type));
    let stem = Path::new(file).file_stem().and_then(|s| s.to_str()).unwrap_or(file);
    if dir.is_empty() {
        return stem.to_string();
    }
    let separator = match artifact_type {
        ArtifactType::Command => ":",
        _ => "/",
    };
    format!("{}{}{}", dir.replace('/', separator), separator, stem)
}

struct Candidate {
    artifact_type: ArtifactType,
    name: String,
    path: PathBuf,
    relative_path: String,
}

/// Immediate children of `dir`, sorted by name.
fn children(dir: &Path) -> Vec<walkdir::DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .collect()
}

fn entry_name(entry: &walkdir::DirEntry) -> Option<String> {
    entry.file_name().to_str().map(str::to_string)
}

fn is_markdown_file(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_file() && entry.path().extension().and_then(|e| e.to_str()) == Some("md")
}

/// Agents and commands: flat `*.md`, or one namespace directory deep.
fn discover_documents(root: &Path, artifact_type: ArtifactType) -> Vec<Candidate> {
    let dir_name = artifact_type.dir_name();

    let mut found = Vec::new();
    for entry in children(&root.join(dir_name)) {
        if is_markdown_file(&entry) {
            let Some(file) = entry_name(&entry) else { continue };
            found.push(Candidate {
                artifact_type,
                name: artifact_name(artifact_type, &file),
                path: entry.path().to_path_buf(),
                relative_path: format!("{}/{}", dir_name, file),
            });
        } else if entry.file_type().is_dir() {
            let Some(namespace) = entry_name(&entry) else { continue };
            for nested in children(entry.path()) {
                if !is_markdown_file(&nested) {
                    continue;
                }
                let Some(file) = entry_name(&nested) else { continue };
                found.push(Candidate {
                    artifact_type,
                    name: artifact_name(artifact_type, &format!("{}/{}", namespace, file)),
                    path: nested.path().to_path_buf(),
                    relative_path: format!("{}/{}/{}", dir_name, namespace, file),
                });
            }
        }
    }
    found
}

/// Skills: a directory holding `SKILL.md` is a bundle; one without it is a
/// namespace of bundles.
fn discover_skills(root: &Path) -> Vec<Candidate> {
    let dir_name = ArtifactType::Skill.dir_name();

    let mut found = Vec::new();
    for entry in children(&root.join(dir_name)) {
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(name) = entry_name(&entry) else { continue };

        let marker = entry.path().join(SKILL_MARKER);
        if marker.is_file() {
            found.push(Candidate {
                artifact_type: ArtifactType::Skill,
                relative_path: format!("{}/{}/{}", dir_name, name, SKILL_MARKER),
                name: artifact_name(ArtifactType::Skill, &name),
                path: marker,
            });
            continue;
        }

        for bundle in children(entry.path()) {
            let marker = bundle.path().join(SKILL_MARKER);
            if !bundle.file_type().is_dir() || !marker.is_file() {
                continue;
            }
            let Some(bundle_name) = entry_name(&bundle) else { continue };
            found.push(Candidate {
                artifact_type: ArtifactType::Skill,
                relative_path: format!("{}/{}/{}/{}", dir_name, name, bundle_name, SKILL_MARKER),
                name: artifact_name(ArtifactType::Skill, &format!("{}/{}", name, bundle_name)),
                path: marker,
            });
        }
    }
    found
}

/// Frontmatter of an on-disk artifact. Unreadable files carry none.
fn embedded_marker(path: &Path) -> Option<ArtifactFrontmatter> {
    match fs::read(path) {
        Ok(bytes) => frontmatter::parse(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            warn!("Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

/// Walk the managed root and classify every agent, command, and skill.
///
/// Results are sorted by type, then name. A missing root yields no artifacts.
pub fn discover_all_artifacts(root: &Path, config: &KitConfig) -> Result<Vec<InstalledArtifact>> {
    let mut managed: HashMap<String, (&KitId, &str)> = HashMap::new();
    for kit in config.kits.values() {
        for artifact in &kit.artifacts {
            managed.insert(normalize_artifact_path(artifact), (&kit.kit_id, kit.version.as_str()));
        }
    }

    let mut candidates = Vec::new();
    for artifact_type in DISCOVERED_TYPES {
        match artifact_type {
            ArtifactType::Skill => candidates.extend(discover_skills(root)),
            _ => candidates.extend(discover_documents(root, artifact_type)),
        }
    }

    let mut artifacts = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let key = normalize_artifact_path(&candidate.relative_path);

        let (provenance, kit_id, kit_version) = if let Some((kit_id, version)) = managed.get(&key) {
            (Provenance::Managed, Some((*kit_id).clone()), Some(version.to_string()))
        } else {
            match embedded_marker(&candidate.path) {
                Some(marker) => (Provenance::Unmanaged, Some(marker.kit_id), Some(marker.kit_version)),
                None => (Provenance::Local, None, None),
            }
        };

        debug!("{} '{}' is {}", candidate.artifact_type, candidate.name, provenance);
        artifacts.push(InstalledArtifact {
            artifact_type: candidate.artifact_type,
            name: candidate.name,
            path: candidate.path,
            relative_path: key,
            provenance,
            kit_id,
            kit_version,
        });
    }

    artifacts.sort_by(|a, b| {
        a.artifact_type
            .cmp(&b.artifact_type)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(artifacts)
}
