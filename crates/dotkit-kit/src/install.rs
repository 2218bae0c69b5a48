//! Installation engine: copies kit artifacts into a managed root.

use crate::frontmatter::{self, ArtifactFrontmatter};
use crate::manifest::{is_safe_relative, KitManifest};
use crate::repository::{artifact_name, SKILL_MARKER};
use crate::store::InstalledKit;
use chrono::Utc;
use dotkit_core::util::{copy_dir_recursive, prune_empty_dirs, relative_slash_path, write_atomic};
use dotkit_types::{ArtifactType, ConflictPolicy, DotkitError, KitId, ResolvedKit, Result};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Restricts an install to a subset of a kit's artifacts.
///
/// An unset dimension matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactFilter {
    /// Artifact types to install
    pub types: Option<BTreeSet<ArtifactType>>,
    /// Artifact names to install
    pub names: Option<BTreeSet<String>>,
}

impl ArtifactFilter {
    /// Restrict to the given types.
    pub fn with_types(mut self, types: impl IntoIterator<Item = ArtifactType>) -> Self {
        self.types = Some(types.into_iter().collect());
        self
    }

    /// Restrict to the given names.
    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Whether an artifact passes the filter.
    pub fn matches(&self, artifact_type: ArtifactType, name: &str) -> bool {
        let type_ok = self.types.as_ref().map_or(true, |t| t.contains(&artifact_type));
        let name_ok = self.names.as_ref().map_or(true, |n| n.contains(name));
        type_ok && name_ok
    }
}

/// Destination path, relative to the managed root, for a kit source path.
///
/// The type directory is prepended unless the source path already starts
/// with it, so `agents/a.md` and `a.md` both land at `agents/a.md`.
pub fn destination_relative(artifact_type: ArtifactType, source_path: &str) -> String {
    let dir = artifact_type.dir_name();
    let trimmed = source_path.trim_start_matches("./");
    let rest = trimmed
        .strip_prefix(dir)
        .and_then(|r| r.strip_prefix('/'))
        .unwrap_or(trimmed);
    format!("{}/{}", dir, rest)
}

/// Root directory of a kit's hooks inside a managed root.
pub fn hook_dir(dest: &Path, kit_id: &KitId) -> PathBuf {
    dest.join(ArtifactType::Hook.dir_name()).join(kit_id.as_str())
}

struct PlannedFile {
    artifact_type: ArtifactType,
    source: PathBuf,
    relative: String,
}

impl PlannedFile {
    /// Destination path below the type directory.
    fn within_type(&self) -> &str {
        self.relative.split_once('/').map_or("", |(_, rest)| rest)
    }
}

/// Expand one manifest entry into the files it contributes.
fn expand_entry(base: &Path, artifact_type: ArtifactType, path: &str) -> Result<Vec<PlannedFile>> {
    let source = base.join(path);
    let relative = destination_relative(artifact_type, path);

    if !source.is_dir() {
        return Ok(vec![PlannedFile { artifact_type, source, relative }]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| DotkitError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let inner = relative_slash_path(entry.path(), &source).ok_or_else(|| {
            DotkitError::Bug(format!("walkdir escaped {}", source.display()))
        })?;
        files.push(PlannedFile {
            artifact_type,
            source: entry.into_path(),
            relative: format!("{}/{}", relative, inner),
        });
    }
    Ok(files)
}

/// Bundle directories, relative to the skills directory, of the planned
/// `SKILL.md` files.
fn skill_bundles(files: &[PlannedFile]) -> Vec<&str> {
    files
        .iter()
        .filter(|f| f.artifact_type == ArtifactType::Skill)
        .filter_map(|f| f.within_type().strip_suffix(SKILL_MARKER))
        .filter_map(|dir| dir.strip_suffix('/'))
        .collect()
}

/// Name a planned file is filtered by. Matches the name discovery lists.
fn selection_name(file: &PlannedFile, bundles: &[&str]) -> String {
    let within = file.within_type();
    if file.artifact_type != ArtifactType::Skill {
        return artifact_name(file.artifact_type, within);
    }

    let bundle = bundles
        .iter()
        .filter(|b| within.strip_prefix(**b).map_or(false, |rest| rest.starts_with('/')))
        .max_by_key(|b| b.len())
        .copied()
        .unwrap_or_else(|| within.split('/').next().unwrap_or(within));
    artifact_name(ArtifactType::Skill, bundle)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// Write one artifact under `policy`. Returns whether it was written.
fn install_file(
    manifest: &KitManifest,
    planned: &PlannedFile,
    dest: &Path,
    policy: ConflictPolicy,
) -> Result<bool> {
    let target = dest.join(&planned.relative);

    if target.exists() {
        match policy {
            ConflictPolicy::Error => {
                return Err(DotkitError::Conflict(format!(
                    "{} already exists (kit '{}')",
                    target.display(),
                    manifest.kit_id
                )));
            }
            ConflictPolicy::Skip => {
                debug!("Skipping existing {}", target.display());
                return Ok(false);
            }
            ConflictPolicy::Overwrite => {
                debug!("Overwriting {}", target.display());
            }
            ConflictPolicy::Merge => {
                dotkit_types::bug!("merge policy reached file install for {}", target.display());
            }
        }
    }

    if is_markdown(&planned.source) {
        let content = fs::read_to_string(&planned.source)?;
        let marker = ArtifactFrontmatter::new(
            manifest.kit_id.clone(),
            manifest.version.clone(),
            planned.artifact_type,
            planned.relative.clone(),
        );
        write_atomic(&target, frontmatter::inject(&content, &marker)?.as_bytes())?;
    } else {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&planned.source, &target)?;
    }

    debug!("Installed {}", planned.relative);
    Ok(true)
}

/// Copy a kit's hook entries into its hook root. Returns whether it was written.
fn install_hooks(
    base: &Path,
    entries: &[&str],
    hook_root: &Path,
    policy: ConflictPolicy,
) -> Result<bool> {
    if hook_root.exists() {
        match policy {
            ConflictPolicy::Error => {
                return Err(DotkitError::Conflict(format!(
                    "Hook directory {} already exists",
                    hook_root.display()
                )));
            }
            ConflictPolicy::Skip => {
                debug!("Skipping existing hook directory {}", hook_root.display());
                return Ok(false);
            }
            ConflictPolicy::Overwrite => {
                fs::remove_dir_all(hook_root)?;
            }
            ConflictPolicy::Merge => {
                dotkit_types::bug!("merge policy reached hook install for {}", hook_root.display());
            }
        }
    }

    fs::create_dir_all(hook_root)?;
    for entry in entries {
        let source = base.join(entry);
        if source.is_dir() {
            copy_dir_recursive(&source, hook_root)?;
        } else {
            let file_name = source.file_name().ok_or_else(|| {
                DotkitError::Validation(format!("Hook entry '{}' has no file name", entry))
            })?;
            fs::copy(&source, hook_root.join(file_name))?;
        }
    }

    Ok(true)
}

/// Install a resolved kit into `dest` under `policy`.
///
/// The manifest and every source path are validated before anything is
/// written. With [`ConflictPolicy::Error`] the first existing destination
/// aborts the install; files already written stay in place.
pub fn install_kit(
    resolved: &ResolvedKit,
    dest: &Path,
    policy: ConflictPolicy,
    filter: Option<&ArtifactFilter>,
) -> Result<InstalledKit> {
    if policy == ConflictPolicy::Merge {
        dotkit_types::bail!(Validation, "Conflict policy 'merge' is not implemented");
    }

    let manifest = KitManifest::load(&resolved.manifest_path)?;
    manifest.validate()?;
    manifest.validate_sources(&resolved.artifacts_base)?;

    if manifest.kit_id != resolved.kit_id {
        return Err(DotkitError::Validation(format!(
            "Resolved kit '{}' but manifest declares '{}'",
            resolved.kit_id, manifest.kit_id
        )));
    }

    let selected = |artifact_type: ArtifactType, name: &str| {
        filter.map_or(true, |f| f.matches(artifact_type, name))
    };

    let mut expanded = Vec::new();
    let mut hook_entries = Vec::new();
    for (artifact_type, path) in manifest.iter_artifacts() {
        if artifact_type.is_directory_granular() {
            hook_entries.push(path);
            continue;
        }
        expanded.extend(expand_entry(&resolved.artifacts_base, artifact_type, path)?);
    }

    let bundles = skill_bundles(&expanded);
    let names: Vec<String> = expanded.iter().map(|f| selection_name(f, &bundles)).collect();
    let mut planned = Vec::new();
    for (file, name) in expanded.iter().zip(names) {
        if selected(file.artifact_type, &name) {
            planned.push(file);
        } else {
            debug!("Filter excludes {} '{}'", file.artifact_type, name);
        }
    }

    let mut seen = HashSet::new();
    for file in planned.iter() {
        if !seen.insert(file.relative.as_str()) {
            return Err(DotkitError::Validation(format!(
                "Kit '{}' installs {} more than once",
                manifest.kit_id, file.relative
            )));
        }
    }

    info!(
        "Installing kit '{}' {} into {} (policy: {})",
        manifest.kit_id,
        manifest.version,
        dest.display(),
        policy
    );

    let mut written = Vec::new();
    for file in planned {
        if install_file(&manifest, file, dest, policy)? {
            written.push(file.relative.clone());
        }
    }

    if !hook_entries.is_empty() && selected(ArtifactType::Hook, manifest.kit_id.as_str()) {
        let hook_root = hook_dir(dest, &manifest.kit_id);
        if install_hooks(&resolved.artifacts_base, &hook_entries, &hook_root, policy)? {
            written.push(format!("{}/{}", ArtifactType::Hook.dir_name(), manifest.kit_id));
        }
    }

    info!("Kit '{}': {} artifact(s) written", manifest.kit_id, written.len());

    Ok(InstalledKit {
        kit_id: manifest.kit_id,
        version: manifest.version,
        source: resolved.source.clone(),
        source_type: resolved.source_type,
        installed_at: Utc::now(),
        artifacts: written,
        conflict_policy: policy,
    })
}

/// Remove every recorded artifact of `installed` from `dest`.
///
/// Emptied parent directories are pruned up to the type directory. Returns
/// the number of paths removed.
pub fn uninstall(installed: &InstalledKit, dest: &Path) -> Result<usize> {
    let mut removed = 0;

    for relative in &installed.artifacts {
        if !is_safe_relative(relative) {
            warn!("Refusing to remove unsafe artifact path '{}'", relative);
            continue;
        }

        let target = dest.join(relative);
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
        } else if target.exists() {
            fs::remove_file(&target)?;
        } else {
            warn!("Artifact {} is already gone", target.display());
            continue;
        }
        removed += 1;

        let type_dir = relative.split('/').next().unwrap_or_default();
        if let Some(parent) = target.parent() {
            prune_empty_dirs(parent, dest.join(type_dir))?;
        }
    }

    info!("Removed {} artifact(s) of kit '{}'", removed, installed.kit_id);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{manifest, write_kit};
    use tempfile::TempDir;

    fn demo_kit(temp_dir: &TempDir) -> ResolvedKit {
        write_kit(
            &temp_dir.path().join("kit"),
            &manifest("demo", "1.0.0", "  agent:\n    - agents/a.md\n"),
            &[("agents/a.md", "# Agent A\n")],
        )
    }

    #[test]
    fn test_install_into_empty_root_injects_frontmatter() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = demo_kit(&temp_dir);
        let dest = temp_dir.path().join(".claude");

        let installed = install_kit(&resolved, &dest, ConflictPolicy::Error, None).unwrap();
        assert_eq!(installed.kit_id.as_str(), "demo");
        assert_eq!(installed.version, "1.0.0");
        assert_eq!(installed.artifacts, vec!["agents/a.md".to_string()]);

        let content = fs::read_to_string(dest.join("agents/a.md")).unwrap();
        assert!(content.starts_with("---\n__dotkit:\n"));
        let marker = frontmatter::parse(&content).unwrap();
        assert_eq!(marker.kit_id.as_str(), "demo");
        assert_eq!(marker.kit_version, "1.0.0");
        assert_eq!(marker.artifact_type, ArtifactType::Agent);
        assert_eq!(marker.artifact_path, "agents/a.md");
        assert_eq!(frontmatter::strip(&content), "# Agent A\n");
    }

    #[test]
    fn test_second_install_with_error_policy_conflicts() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = demo_kit(&temp_dir);
        let dest = temp_dir.path().join(".claude");

        install_kit(&resolved, &dest, ConflictPolicy::Error, None).unwrap();
        let before = fs::read(dest.join("agents/a.md")).unwrap();

        let err = install_kit(&resolved, &dest, ConflictPolicy::Error, None).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(fs::read(dest.join("agents/a.md")).unwrap(), before);
    }

    #[test]
    fn test_skip_policy_leaves_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = demo_kit(&temp_dir);
        let dest = temp_dir.path().join(".claude");
        fs::create_dir_all(dest.join("agents")).unwrap();
        fs::write(dest.join("agents/a.md"), "mine").unwrap();

        let installed = install_kit(&resolved, &dest, ConflictPolicy::Skip, None).unwrap();
        assert!(installed.artifacts.is_empty());
        assert_eq!(fs::read_to_string(dest.join("agents/a.md")).unwrap(), "mine");
    }

    #[test]
    fn test_merge_policy_rejected_before_writes() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = demo_kit(&temp_dir);
        let dest = temp_dir.path().join(".claude");

        let err = install_kit(&resolved, &dest, ConflictPolicy::Merge, None).unwrap_err();
        assert!(matches!(err, DotkitError::Validation(ref m) if m.contains("merge")));
        assert!(!dest.exists());
    }

    #[test]
    fn test_overwrite_installs_every_listed_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = write_kit(
            &temp_dir.path().join("kit"),
            &manifest(
                "demo",
                "2.0.0",
                "  command:\n    - commands/git/commit.md\n    - run.md\n  doc:\n    - docs/data.json\n",
            ),
            &[
                ("commands/git/commit.md", "---\ndescription: Commit\n---\nCommit it\n"),
                ("run.md", "Run it\n"),
                ("docs/data.json", "{\"k\": 1}"),
            ],
        );
        let dest = temp_dir.path().join(".claude");
        fs::create_dir_all(dest.join("commands")).unwrap();
        fs::write(dest.join("commands/run.md"), "stale").unwrap();

        let installed = install_kit(&resolved, &dest, ConflictPolicy::Overwrite, None).unwrap();
        assert_eq!(
            installed.artifacts,
            vec!["commands/git/commit.md", "commands/run.md", "docs/data.json"]
        );

        let commit = fs::read_to_string(dest.join("commands/git/commit.md")).unwrap();
        assert_eq!(frontmatter::parse(&commit).unwrap().artifact_path, "commands/git/commit.md");
        assert!(commit.contains("description: Commit\n"));
        assert_eq!(
            frontmatter::parse(&fs::read_to_string(dest.join("commands/run.md")).unwrap())
                .unwrap()
                .kit_version,
            "2.0.0"
        );
        assert_eq!(fs::read_to_string(dest.join("docs/data.json")).unwrap(), "{\"k\": 1}");
    }

    #[test]
    fn test_missing_source_fails_validation_without_writes() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = write_kit(
            &temp_dir.path().join("kit"),
            &manifest("demo", "1.0.0", "  agent:\n    - agents/a.md\n    - agents/gone.md\n"),
            &[("agents/a.md", "A")],
        );
        let dest = temp_dir.path().join(".claude");

        let err = install_kit(&resolved, &dest, ConflictPolicy::Overwrite, None).unwrap_err();
        assert!(matches!(err, DotkitError::Validation(_)));
        assert!(!dest.exists());
    }

    #[test]
    fn test_filter_selects_by_type_and_name() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = write_kit(
            &temp_dir.path().join("kit"),
            &manifest(
                "demo",
                "1.0.0",
                "  agent:\n    - agents/a.md\n  command:\n    - commands/x.md\n    - commands/y.md\n  skill:\n    - skills/review\n",
            ),
            &[
                ("agents/a.md", "A"),
                ("commands/x.md", "X"),
                ("commands/y.md", "Y"),
                ("skills/review/SKILL.md", "Review"),
                ("skills/review/scripts/check.sh", "echo ok"),
            ],
        );
        let dest = temp_dir.path().join(".claude");

        let commands = ArtifactFilter::default().with_types([ArtifactType::Command]);
        let installed = install_kit(&resolved, &dest, ConflictPolicy::Error, Some(&commands)).unwrap();
        assert_eq!(installed.artifacts, vec!["commands/x.md", "commands/y.md"]);
        assert!(!dest.join("agents").exists());

        let review = ArtifactFilter::default().with_names(["review"]);
        let installed = install_kit(&resolved, &dest, ConflictPolicy::Error, Some(&review)).unwrap();
        assert_eq!(
            installed.artifacts,
            vec!["skills/review/SKILL.md", "skills/review/scripts/check.sh"]
        );
        assert_eq!(fs::read_to_string(dest.join("skills/review/scripts/check.sh")).unwrap(), "echo ok");
    }

    #[test]
    fn test_hooks_installed_as_directory() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = write_kit(
            &temp_dir.path().join("kit"),
            &manifest("demo", "1.0.0", "  hook:\n    - hooks\n"),
            &[("hooks/hooks.yaml", "kit_id: demo\n"), ("hooks/guard.sh", "exit 0\n")],
        );
        let dest = temp_dir.path().join(".claude");

        let installed = install_kit(&resolved, &dest, ConflictPolicy::Error, None).unwrap();
        assert_eq!(installed.artifacts, vec!["hooks/demo"]);
        assert!(dest.join("hooks/demo/hooks.yaml").is_file());
        assert!(dest.join("hooks/demo/guard.sh").is_file());

        let err = install_kit(&resolved, &dest, ConflictPolicy::Error, None).unwrap_err();
        assert!(err.is_conflict());

        fs::write(dest.join("hooks/demo/leftover.sh"), "").unwrap();
        install_kit(&resolved, &dest, ConflictPolicy::Overwrite, None).unwrap();
        assert!(!dest.join("hooks/demo/leftover.sh").exists());
        assert!(dest.join("hooks/demo/guard.sh").is_file());
    }

    #[test]
    fn test_destination_relative() {
        assert_eq!(destination_relative(ArtifactType::Agent, "agents/a.md"), "agents/a.md");
        assert_eq!(destination_relative(ArtifactType::Agent, "a.md"), "agents/a.md");
        assert_eq!(destination_relative(ArtifactType::Agent, "agentsx/a.md"), "agents/agentsx/a.md");
        assert_eq!(destination_relative(ArtifactType::Doc, "./guide.md"), "docs/guide.md");
    }

    #[test]
    fn test_merge_is_not_treated_as_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = demo_kit(&temp_dir);
        let manifest = KitManifest::load(&resolved.manifest_path).unwrap();
        let dest = temp_dir.path().join(".claude");
        install_kit(&resolved, &dest, ConflictPolicy::Error, None).unwrap();
        fs::create_dir_all(dest.join("hooks/demo")).unwrap();
        fs::write(dest.join("hooks/demo/keep.sh"), "exit 0\n").unwrap();
        let before = fs::read(dest.join("agents/a.md")).unwrap();

        let planned = PlannedFile {
            artifact_type: ArtifactType::Agent,
            source: resolved.artifacts_base.join("agents/a.md"),
            relative: "agents/a.md".to_string(),
        };
        let err = install_file(&manifest, &planned, &dest, ConflictPolicy::Merge).unwrap_err();
        assert!(matches!(err, DotkitError::Bug(_)));
        assert_eq!(fs::read(dest.join("agents/a.md")).unwrap(), before);

        let err = install_hooks(&resolved.artifacts_base, &[], &dest.join("hooks/demo"), ConflictPolicy::Merge)
            .unwrap_err();
        assert!(matches!(err, DotkitError::Bug(_)));
        assert!(dest.join("hooks/demo/keep.sh").is_file());
    }

    #[test]
    fn test_filter_names_match_discovered_names() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = write_kit(
            &temp_dir.path().join("kit"),
            &manifest(
                "demo",
                "1.0.0",
                "  agent:\n    - agents/team/reviewer.md\n  command:\n    - commands/git/commit.md\n  skill:\n    - skills/ops/deploy\n    - skills/review\n",
            ),
            &[
                ("agents/team/reviewer.md", "R"),
                ("commands/git/commit.md", "C"),
                ("skills/ops/deploy/SKILL.md", "D"),
                ("skills/ops/deploy/run.sh", "echo deploy"),
                ("skills/review/SKILL.md", "V"),
            ],
        );
        let dest = temp_dir.path().join(".claude");

        let nested = ArtifactFilter::default().with_names(["team/reviewer", "git:commit", "ops/deploy"]);
        let installed = install_kit(&resolved, &dest, ConflictPolicy::Error, Some(&nested)).unwrap();
        assert_eq!(
            installed.artifacts,
            vec![
                "agents/team/reviewer.md",
                "commands/git/commit.md",
                "skills/ops/deploy/SKILL.md",
                "skills/ops/deploy/run.sh",
            ]
        );

        let config = crate::store::update_kit(&crate::store::KitConfig::default(), installed);
        let listed: Vec<String> = crate::repository::discover_all_artifacts(&dest, &config)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(listed, vec!["team/reviewer", "git:commit", "ops/deploy"]);

        let stems = ArtifactFilter::default().with_names(["reviewer", "commit", "ops"]);
        let installed = install_kit(&resolved, &dest, ConflictPolicy::Skip, Some(&stems)).unwrap();
        assert!(installed.artifacts.is_empty());
    }

    #[test]
    fn test_uninstall_removes_and_prunes() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = write_kit(
            &temp_dir.path().join("kit"),
            &manifest("demo", "1.0.0", "  command:\n    - commands/git/commit.md\n  hook:\n    - hooks\n"),
            &[("commands/git/commit.md", "C"), ("hooks/hooks.yaml", "kit_id: demo\n")],
        );
        let dest = temp_dir.path().join(".claude");
        fs::create_dir_all(dest.join("commands")).unwrap();
        fs::write(dest.join("commands/local.md"), "mine").unwrap();

        let mut installed = install_kit(&resolved, &dest, ConflictPolicy::Error, None).unwrap();
        installed.artifacts.push("agents/never-written.md".to_string());

        assert_eq!(uninstall(&installed, &dest).unwrap(), 2);
        assert!(!dest.join("commands/git").exists());
        assert!(dest.join("commands/local.md").is_file());
        assert!(!dest.join("hooks/demo").exists());
    }
}
