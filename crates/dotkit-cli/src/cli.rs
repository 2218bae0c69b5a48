//! CLI structure and command definitions.

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotkit_core::config::Settings;
use dotkit_types::{ArtifactType, ConflictPolicy, LogLevel};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dotkit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kit artifact manager and lifecycle hook router", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a kit
    Install {
        /// Kit identifier
        kit: String,

        /// Install into the user scope instead of the project
        #[arg(short, long)]
        user: bool,

        /// Conflict policy (error, skip, overwrite)
        #[arg(short, long)]
        policy: Option<ConflictPolicy>,

        /// Only install artifacts of this type (repeatable)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        types: Vec<ArtifactType>,

        /// Only install artifacts with this name (repeatable)
        #[arg(short, long = "name", value_name = "NAME")]
        names: Vec<String>,
    },

    /// Remove an installed kit and its artifacts
    Remove {
        /// Kit identifier
        kit: String,

        /// Remove from the user scope
        #[arg(short, long)]
        user: bool,
    },

    /// Sync installed kits to the versions their sources provide
    Sync {
        /// Kit to sync (all kits if not specified)
        kit: Option<String>,

        /// Sync the user scope
        #[arg(short, long)]
        user: bool,

        /// Reinstall even when versions match
        #[arg(short, long)]
        force: bool,
    },

    /// Check installed kits for updates
    Check {
        /// Check the user scope
        #[arg(short, long)]
        user: bool,
    },

    /// Search available kits
    Search {
        /// Substring to filter kit identifiers by
        query: Option<String>,
    },

    /// List artifacts under the managed root with their provenance
    List {
        /// List the user scope
        #[arg(short, long)]
        user: bool,
    },

    /// Manage installed hooks
    Hook {
        #[command(subcommand)]
        action: HookCommands,
    },

    /// Dispatch a lifecycle event to installed hooks (reads context JSON on stdin)
    Route {
        /// Lifecycle event (SessionStart, PreToolUse, Stop, ...)
        lifecycle: String,

        /// Route to user-scope hooks
        #[arg(short, long)]
        user: bool,
    },
}

#[derive(Subcommand)]
pub enum HookCommands {
    /// List installed hooks
    List {
        /// List user-scope hooks
        #[arg(short, long)]
        user: bool,
    },

    /// Enable a hook
    Enable {
        /// Kit identifier
        kit: String,

        /// Hook name
        hook: String,

        /// Use the user scope
        #[arg(short, long)]
        user: bool,
    },

    /// Disable a hook
    Disable {
        /// Kit identifier
        kit: String,

        /// Hook name
        hook: String,

        /// Use the user scope
        #[arg(short, long)]
        user: bool,
    },
}

impl Cli {
    /// Whether this invocation is the hook router.
    pub fn is_route(&self) -> bool {
        matches!(self.command, Commands::Route { .. })
    }

    /// Log level requested by flags. The router stays quiet unless asked.
    pub fn log_level(&self) -> Option<LogLevel> {
        if self.debug {
            Some(LogLevel::Trace)
        } else if self.verbose {
            Some(LogLevel::Debug)
        } else if self.quiet || self.is_route() {
            Some(LogLevel::Warn)
        } else {
            None
        }
    }

    pub async fn execute(&self, settings: Settings) -> Result<()> {
        use crate::commands::*;

        let ctx = Context::new(settings, self.project.as_deref())?;

        match &self.command {
            Commands::Install { kit, user, policy, types, names } => {
                install::execute(&ctx, kit, *user, *policy, types, names).await
            }
            Commands::Remove { kit, user } => {
                remove::execute(&ctx, kit, *user).await
            }
            Commands::Sync { kit, user, force } => {
                sync::execute(&ctx, kit.as_deref(), *user, *force).await
            }
            Commands::Check { user } => {
                check::execute(&ctx, *user).await
            }
            Commands::Search { query } => {
                search::execute(&ctx, query.as_deref()).await
            }
            Commands::List { user } => {
                list::execute(&ctx, *user).await
            }
            Commands::Hook { action } => match action {
                HookCommands::List { user } => hook::list(&ctx, *user).await,
                HookCommands::Enable { kit, hook, user } => {
                    hook::set_enabled(&ctx, kit, hook, *user, true).await
                }
                HookCommands::Disable { kit, hook, user } => {
                    hook::set_enabled(&ctx, kit, hook, *user, false).await
                }
            },
            Commands::Route { lifecycle, user } => {
                route::execute(&ctx, lifecycle, *user).await
            }
        }
    }
}
