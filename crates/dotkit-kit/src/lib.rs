//! # dotkit Kit
//!
//! Complete kit lifecycle handling:
//! - Kit manifests and embedded provenance frontmatter
//! - Kit sources (bundled data, installed packages)
//! - Installation under conflict policies
//! - Installed-kit state per scope
//! - Version sync
//! - Provenance discovery of on-disk artifacts
//! - Hook manifests and the lifecycle hook router

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manifest;
pub mod frontmatter;
pub mod source;
pub mod install;
pub mod store;
pub mod sync;
pub mod repository;
pub mod hook;
pub mod router;

#[cfg(test)]
mod testing;

pub use manifest::{KitManifest, KIT_MANIFEST_FILE};
pub use frontmatter::ArtifactFrontmatter;
pub use source::{BundledSource, PackageSource, SourceChain};
pub use install::{install_kit, uninstall, ArtifactFilter};
pub use store::{remove_kit, update_kit, ConfigStore, InstalledKit, KitConfig};
pub use sync::{check_for_updates, sync_all_kits, sync_kit, KitSyncOutcome, SyncReport, SyncResult};
pub use repository::{discover_all_artifacts, InstalledArtifact};
pub use hook::{
    disable_hook, enable_hook, hook_root, list_hooks, set_hook_enabled, HookConfig, HookManifest,
    KitHook, HOOK_MANIFEST_FILE,
};
pub use router::{HookResult, HookRouter, RouterReport};
