//! Sync installed kits.

use super::{parse_kit_id, scope, Context};
use crate::ui::progress;
use anyhow::{bail, Result};
use colored::Colorize;
use dotkit_core::time::{measure, pretty_duration};
use dotkit_kit::{check_for_updates, sync_all_kits, sync_kit, update_kit};

pub async fn execute(ctx: &Context, kit: Option<&str>, user: bool, force: bool) -> Result<()> {
    match kit {
        Some(kit) => sync_one(ctx, kit, user, force),
        None => sync_all(ctx, user, force).await,
    }
}

fn sync_one(ctx: &Context, kit: &str, user: bool, force: bool) -> Result<()> {
    let scope = scope(user);
    let kit_id = parse_kit_id(kit)?;
    let config = ctx.store.load(scope)?;

    let Some(installed) = config.get(&kit_id) else {
        bail!("Kit '{}' is not installed in the {} scope", kit_id, scope);
    };

    println!("{} kit: {}", "Syncing".green().bold(), kit_id.to_string().cyan());

    let (has_update, resolved) = check_for_updates(installed, &ctx.sources())?;
    let Some(resolved) = resolved else {
        bail!("Kit '{}' is no longer available from '{}'", kit_id, installed.source);
    };

    if !has_update && !force {
        println!("  {} Already up to date ({})", "✓".green(), installed.version);
        return Ok(());
    }

    let dest = ctx.store.managed_root(scope);
    let result = sync_kit(&kit_id, installed, &resolved, &dest, force)?;
    ctx.store.save(scope, &update_kit(&config, result.updated_kit))?;

    println!(
        "{} {} -> {} ({} artifact(s) written)",
        "✓".green().bold(),
        result.old_version,
        result.new_version.cyan(),
        result.artifacts_updated
    );
    Ok(())
}

async fn sync_all(ctx: &Context, user: bool, force: bool) -> Result<()> {
    let scope = scope(user);
    let config = ctx.store.load(scope)?;

    if config.kits.is_empty() {
        println!("  {} No kits installed", "!".yellow());
        return Ok(());
    }

    println!("{} {} kit(s)", "Syncing".green().bold(), config.kits.len());

    let dest = ctx.store.managed_root(scope);
    let sources = ctx.sources();
    let spinner = progress::spinner("Syncing kits...");
    let (report, elapsed) = measure(async { sync_all_kits(&config, &sources, &dest, force) }).await;
    spinner.finish_and_clear();

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(result) if result.was_updated => println!(
                "  {} {} {} -> {}",
                "✓".green(),
                outcome.kit_id.to_string().cyan(),
                result.old_version,
                result.new_version
            ),
            Ok(result) => println!(
                "  {} {} up to date ({})",
                "-".dimmed(),
                outcome.kit_id.to_string().cyan(),
                result.old_version
            ),
            Err(e) => println!("  {} {} {}", "✗".red(), outcome.kit_id.to_string().cyan(), e),
        }
    }

    ctx.store.save(scope, &report.config)?;

    println!(
        "{} updated, {} failed in {}",
        report.updated_count(),
        report.failed_count(),
        pretty_duration(elapsed)
    );

    if report.failed_count() > 0 {
        bail!("{} kit(s) failed to sync", report.failed_count());
    }
    Ok(())
}
