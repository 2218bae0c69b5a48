//! Core trait definitions for dotkit abstractions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::errors::Result;
use crate::{KitId, SourceType};

/// A kit located by a source backend, ready for installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedKit {
    /// Kit identifier
    pub kit_id: KitId,
    /// Backend that resolved the kit
    pub source_type: SourceType,
    /// Identifier the kit was resolved by; re-resolving it must find the same kit
    pub source: String,
    /// Path to the kit manifest
    pub manifest_path: PathBuf,
    /// Directory the manifest's artifact paths are relative to
    pub artifacts_base: PathBuf,
}

/// Trait for kit source backends (bundled data, installed packages).
///
/// Implementers map an opaque identifier to a kit manifest on disk. They are
/// read-only: resolving never modifies the filesystem.
pub trait KitSource: Send + Sync {
    /// Get the backend name for diagnostics.
    fn name(&self) -> &str;

    /// Get the backend type.
    fn source_type(&self) -> SourceType;

    /// Check whether this backend can resolve the identifier.
    fn can_resolve(&self, identifier: &str) -> bool;

    /// Resolve the identifier to a kit.
    ///
    /// Returns `DotkitError::NotFound` when `can_resolve` would be false.
    fn resolve(&self, identifier: &str) -> Result<ResolvedKit>;

    /// List every identifier this backend can resolve.
    fn list_available(&self) -> Result<Vec<String>>;
}
