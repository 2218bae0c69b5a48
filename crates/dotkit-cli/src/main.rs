//! dotkit CLI entry point.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use dotkit_core::config::Settings;
use tracing::{error, warn};

mod cli;
mod commands;
mod ui;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (settings, settings_error) = match Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };

    let _log_guard = match dotkit_core::log::init(&settings.log, cli.log_level()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {}", "Warning:".yellow().bold(), e);
            None
        }
    };

    if let Some(e) = settings_error {
        if cli.is_route() {
            warn!("Using default settings: {}", e);
        } else {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }

    match cli.execute(settings).await {
        Ok(_) => Ok(()),
        Err(e) if cli.is_route() => {
            // The router reports success to its caller no matter what.
            error!("Hook routing failed: {:#}", e);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
