//! Check installed kits for updates.

use super::{scope, Context};
use anyhow::Result;
use colored::Colorize;
use dotkit_core::time::fuzzy_time;
use dotkit_kit::{check_for_updates, KitManifest};

pub async fn execute(ctx: &Context, user: bool) -> Result<()> {
    let scope = scope(user);
    let config = ctx.store.load(scope)?;

    println!("{} for updates ({} scope)", "Checking".green().bold(), scope);

    if config.kits.is_empty() {
        println!("  {} No kits installed", "!".yellow());
        return Ok(());
    }

    let sources = ctx.sources();
    let mut available = 0;

    for (kit_id, installed) in &config.kits {
        let label = kit_id.to_string().cyan();
        let installed_at = fuzzy_time(installed.installed_at);

        match check_for_updates(installed, &sources) {
            Ok((true, Some(resolved))) => {
                available += 1;
                let latest = KitManifest::load(&resolved.manifest_path)
                    .map(|m| m.version)
                    .unwrap_or_else(|_| "?".to_string());
                println!(
                    "  {} {} {} -> {} (installed {})",
                    "↑".yellow().bold(),
                    label,
                    installed.version,
                    latest.green(),
                    installed_at
                );
            }
            Ok((_, Some(_))) => {
                println!("  {} {} {} (installed {})", "✓".green(), label, installed.version, installed_at);
            }
            Ok((_, None)) => {
                println!("  {} {} no longer available from '{}'", "!".yellow(), label, installed.source);
            }
            Err(e) => {
                println!("  {} {} {}", "✗".red(), label, e);
            }
        }
    }

    if available > 0 {
        println!("{} update(s) available; run 'dotkit sync' to apply", available);
    }
    Ok(())
}
