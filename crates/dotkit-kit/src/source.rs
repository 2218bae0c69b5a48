//! Kit source backends and the resolver chain.

use crate::manifest::{KitManifest, KIT_MANIFEST_FILE};
use dotkit_core::config::Settings;
use dotkit_types::{DotkitError, KitId, KitSource, ResolvedKit, Result, SourceType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

static VERSION_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.+?)-v?\d+(?:\.\d+)+[0-9A-Za-z]*(?:[-+][0-9A-Za-z.]+)?$").expect("version suffix pattern is valid")
});

/// Load the manifest at `manifest_path` and describe it as a resolved kit.
fn resolved_from_manifest(
    manifest_path: PathBuf,
    source_type: SourceType,
    identifier: &str,
) -> Result<ResolvedKit> {
    let manifest = KitManifest::load(&manifest_path)?;
    let artifacts_base = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| DotkitError::Bug(format!(
            "manifest path has no parent: {}",
            manifest_path.display()
        )))?;

    Ok(ResolvedKit {
        kit_id: manifest.kit_id,
        source_type,
        source: identifier.to_string(),
        manifest_path,
        artifacts_base,
    })
}

/// Kits shipped with the dotkit distribution.
///
/// Layout: `<root>/kits/<identifier>/kit.yaml`.
pub struct BundledSource {
    root: PathBuf,
}

impl BundledSource {
    /// Create a bundled source over a data root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn kits_dir(&self) -> PathBuf {
        self.root.join("kits")
    }

    fn manifest_path(&self, identifier: &str) -> PathBuf {
        self.kits_dir().join(identifier).join(KIT_MANIFEST_FILE)
    }
}

impl KitSource for BundledSource {
    fn name(&self) -> &str {
        "bundled"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Bundled
    }

    fn can_resolve(&self, identifier: &str) -> bool {
        KitId::is_valid(identifier) && self.manifest_path(identifier).is_file()
    }

    fn resolve(&self, identifier: &str) -> Result<ResolvedKit> {
        if !self.can_resolve(identifier) {
            return Err(DotkitError::NotFound(format!(
                "Bundled kit '{}' not found under {}",
                identifier,
                self.kits_dir().display()
            )));
        }

        resolved_from_manifest(self.manifest_path(identifier), SourceType::Bundled, identifier)
    }

    fn list_available(&self) -> Result<Vec<String>> {
        let kits_dir = self.kits_dir();
        if !kits_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut available = Vec::new();
        for entry in WalkDir::new(&kits_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if let Some(name) = entry.file_name().to_str() {
                if self.can_resolve(name) {
                    available.push(name.to_string());
                }
            }
        }

        Ok(available)
    }
}

/// Kits shipped inside installed package distributions.
///
/// Each package root holds distribution directories such as `devrun/` or
/// `devrun-1.2.0/`. A distribution provides a kit when a `kit.yaml` is found
/// at its top level or within two directory levels below it.
pub struct PackageSource {
    roots: Vec<PathBuf>,
}

impl PackageSource {
    /// Create a package source over the given package roots.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Normalize a package or distribution name for comparison.
    pub fn normalize_name(name: &str) -> String {
        let lowered = name.to_lowercase().replace('_', "-");
        match VERSION_SUFFIX.captures(&lowered) {
            Some(caps) => caps["name"].to_string(),
            None => lowered,
        }
    }

    fn distributions(&self) -> Vec<PathBuf> {
        let mut dists = Vec::new();
        for root in &self.roots {
            if !root.is_dir() {
                debug!("Package root {} does not exist", root.display());
                continue;
            }
            dists.extend(
                WalkDir::new(root)
                    .min_depth(1)
                    .max_depth(1)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_dir())
                    .map(|e| e.into_path()),
            );
        }
        dists
    }

    fn find_distribution(&self, identifier: &str) -> Option<PathBuf> {
        let wanted = Self::normalize_name(identifier);
        self.distributions().into_iter().find(|dist| {
            dist.file_name()
                .and_then(|n| n.to_str())
                .map(|n| Self::normalize_name(n) == wanted)
                .unwrap_or(false)
        })
    }

    fn find_manifest(dist: &Path) -> Option<PathBuf> {
        let top = dist.join(KIT_MANIFEST_FILE);
        if top.is_file() {
            return Some(top);
        }

        WalkDir::new(dist)
            .min_depth(2)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| e.file_type().is_file() && e.file_name() == KIT_MANIFEST_FILE)
            .map(|e| e.into_path())
    }
}

impl KitSource for PackageSource {
    fn name(&self) -> &str {
        "package"
    }

    fn source_type(&self) -> SourceType {
        SourceType::Package
    }

    fn can_resolve(&self, identifier: &str) -> bool {
        self.find_distribution(identifier)
            .and_then(|dist| Self::find_manifest(&dist))
            .is_some()
    }

    fn resolve(&self, identifier: &str) -> Result<ResolvedKit> {
        let dist = self.find_distribution(identifier).ok_or_else(|| {
            DotkitError::NotFound(format!("No installed package provides '{}'", identifier))
        })?;

        let manifest_path = Self::find_manifest(&dist).ok_or_else(|| {
            DotkitError::NotFound(format!(
                "Package {} has no {}",
                dist.display(),
                KIT_MANIFEST_FILE
            ))
        })?;

        resolved_from_manifest(manifest_path, SourceType::Package, identifier)
    }

    fn list_available(&self) -> Result<Vec<String>> {
        Ok(self.distributions()
            .into_iter()
            .filter(|dist| Self::find_manifest(dist).is_some())
            .filter_map(|dist| dist.file_name().and_then(|n| n.to_str()).map(Self::normalize_name))
            .collect())
    }
}

/// Ordered list of sources; the first that can resolve an identifier wins.
pub struct SourceChain {
    sources: Vec<Box<dyn KitSource>>,
}

impl SourceChain {
    /// Create a chain from sources in priority order.
    pub fn new(sources: Vec<Box<dyn KitSource>>) -> Self {
        Self { sources }
    }

    /// Bundled data first, then installed packages.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut sources: Vec<Box<dyn KitSource>> = Vec::new();

        match settings.bundled_root() {
            Some(root) => sources.push(Box::new(BundledSource::new(root))),
            None => warn!("No bundled kit root could be determined; bundled kits are unavailable"),
        }
        sources.push(Box::new(PackageSource::new(settings.sources.package_roots.clone())));

        Self { sources }
    }

    /// Resolve an identifier using the first capable source.
    pub fn resolve(&self, identifier: &str) -> Result<ResolvedKit> {
        for source in &self.sources {
            if source.can_resolve(identifier) {
                info!("Source '{}' resolves kit '{}'", source.name(), identifier);
                return source.resolve(identifier);
            }
            debug!("Source '{}' cannot resolve kit '{}'", source.name(), identifier);
        }

        Err(DotkitError::NotFound(format!(
            "No source can resolve kit '{}'",
            identifier
        )))
    }

    /// List identifiers available across all sources, first source wins on duplicates.
    pub fn list_available(&self) -> Vec<(String, SourceType)> {
        let mut seen = HashSet::new();
        let mut available = Vec::new();

        for source in &self.sources {
            match source.list_available() {
                Ok(ids) => {
                    for id in ids {
                        if seen.insert(id.clone()) {
                            available.push((id, source.source_type()));
                        }
                    }
                }
                Err(e) => warn!("Source '{}' failed to list kits: {}", source.name(), e),
            }
        }

        available
    }
}
