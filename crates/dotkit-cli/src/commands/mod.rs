//! CLI command implementations.

pub mod install;
pub mod remove;
pub mod sync;
pub mod check;
pub mod search;
pub mod list;
pub mod hook;
pub mod route;

use anyhow::{Context as _, Result};
use dotkit_core::config::Settings;
use dotkit_kit::{ConfigStore, SourceChain};
use dotkit_types::{ConfigScope, KitId};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Shared state for a single invocation.
pub struct Context {
    pub settings: Settings,
    pub project_dir: PathBuf,
    pub store: ConfigStore,
}

impl Context {
    pub fn new(settings: Settings, project: Option<&Path>) -> Result<Self> {
        let project_dir = match project {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let store = ConfigStore::discover(project_dir.clone())?;

        Ok(Self { settings, project_dir, store })
    }

    pub fn sources(&self) -> SourceChain {
        SourceChain::from_settings(&self.settings)
    }

    pub fn hook_timeout(&self) -> Option<Duration> {
        self.settings.hooks.timeout_secs.map(Duration::from_secs)
    }
}

pub fn scope(user: bool) -> ConfigScope {
    if user {
        ConfigScope::User
    } else {
        ConfigScope::Project
    }
}

pub fn parse_kit_id(kit: &str) -> Result<KitId> {
    KitId::new(kit).with_context(|| format!("Invalid kit identifier '{}'", kit))
}
