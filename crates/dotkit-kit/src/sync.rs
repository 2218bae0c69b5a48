//! Sync engine: detects version drift and reinstalls kits.

use crate::install::install_kit;
use crate::manifest::KitManifest;
use crate::source::SourceChain;
use crate::store::{update_kit, InstalledKit, KitConfig};
use dotkit_types::{ConflictPolicy, DotkitError, KitId, ResolvedKit, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Outcome of syncing one kit.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Whether artifacts were reinstalled
    pub was_updated: bool,
    /// Version before the sync
    pub old_version: String,
    /// Version after the sync
    pub new_version: String,
    /// Number of artifacts written
    pub artifacts_updated: usize,
    /// Record to store in the configuration
    pub updated_kit: InstalledKit,
}

/// Per-kit entry of a batch sync.
#[derive(Debug)]
pub struct KitSyncOutcome {
    /// Kit that was synced
    pub kit_id: KitId,
    /// Sync result or the error that stopped this kit
    pub result: Result<SyncResult>,
}

/// Result of syncing every kit in a configuration.
#[derive(Debug)]
pub struct SyncReport {
    /// One entry per installed kit, in configuration order
    pub outcomes: Vec<KitSyncOutcome>,
    /// Configuration with every successful update applied
    pub config: KitConfig,
}

impl SyncReport {
    /// Number of kits that were reinstalled.
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(r) if r.was_updated))
            .count()
    }

    /// Number of kits that failed.
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// Re-resolve an installed kit and compare versions.
///
/// Versions are compared as plain strings, so any difference (a downgrade
/// included) counts as an update. A kit no source can resolve any more
/// yields `(false, None)`.
pub fn check_for_updates(
    installed: &InstalledKit,
    sources: &SourceChain,
) -> Result<(bool, Option<ResolvedKit>)> {
    let resolved = match sources.resolve(&installed.source) {
        Ok(resolved) => resolved,
        Err(e) if e.is_not_found() => {
            debug!("Kit '{}' no longer resolves: {}", installed.kit_id, e);
            return Ok((false, None));
        }
        Err(e) => return Err(e),
    };

    let manifest = KitManifest::load(&resolved.manifest_path)?;
    let has_update = manifest.version != installed.version;
    debug!(
        "Kit '{}': installed {}, available {}",
        installed.kit_id, installed.version, manifest.version
    );

    Ok((has_update, Some(resolved)))
}

/// Reinstall a kit from `resolved` with overwrite semantics.
///
/// Equal versions return `was_updated = false` without touching disk unless
/// `force` is set. The full artifact set is written; the caller records
/// `updated_kit` in its configuration.
pub fn sync_kit(
    kit_id: &KitId,
    installed: &InstalledKit,
    resolved: &ResolvedKit,
    dest: &Path,
    force: bool,
) -> Result<SyncResult> {
    if &installed.kit_id != kit_id || &resolved.kit_id != kit_id {
        return Err(DotkitError::Validation(format!(
            "Cannot sync '{}' from installed '{}' and resolved '{}'",
            kit_id, installed.kit_id, resolved.kit_id
        )));
    }

    let manifest = KitManifest::load(&resolved.manifest_path)?;
    if manifest.version == installed.version && !force {
        debug!("Kit '{}' is up to date at {}", kit_id, installed.version);
        return Ok(unchanged(installed));
    }

    let updated_kit = install_kit(resolved, dest, ConflictPolicy::Overwrite, None)?;
    info!(
        "Synced kit '{}' {} -> {}",
        kit_id, installed.version, updated_kit.version
    );

    Ok(SyncResult {
        was_updated: true,
        old_version: installed.version.clone(),
        new_version: updated_kit.version.clone(),
        artifacts_updated: updated_kit.artifacts.len(),
        updated_kit,
    })
}

fn unchanged(installed: &InstalledKit) -> SyncResult {
    SyncResult {
        was_updated: false,
        old_version: installed.version.clone(),
        new_version: installed.version.clone(),
        artifacts_updated: 0,
        updated_kit: installed.clone(),
    }
}

fn sync_one(
    installed: &InstalledKit,
    sources: &SourceChain,
    dest: &Path,
    force: bool,
) -> Result<SyncResult> {
    let (has_update, resolved) = check_for_updates(installed, sources)?;
    let resolved = resolved.ok_or_else(|| {
        DotkitError::NotFound(format!(
            "Kit '{}' is no longer available from '{}'",
            installed.kit_id, installed.source
        ))
    })?;

    if !has_update && !force {
        return Ok(unchanged(installed));
    }

    sync_kit(&installed.kit_id, installed, &resolved, dest, force)
}

/// Sync every installed kit, isolating per-kit failures.
pub fn sync_all_kits(
    config: &KitConfig,
    sources: &SourceChain,
    dest: &Path,
    force: bool,
) -> SyncReport {
    let mut updated = config.clone();
    let mut outcomes = Vec::with_capacity(config.kits.len());

    for (kit_id, installed) in &config.kits {
        let result = sync_one(installed, sources, dest, force);
        match &result {
            Ok(sync) if sync.was_updated => {
                updated = update_kit(&updated, sync.updated_kit.clone());
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to sync kit '{}': {}", kit_id, e),
        }
        outcomes.push(KitSyncOutcome {
            kit_id: kit_id.clone(),
            result,
        });
    }

    SyncReport {
        outcomes,
        config: updated,
    }
}
