//! Install a kit.

use super::{scope, Context};
use anyhow::{Context as _, Result};
use colored::Colorize;
use dotkit_kit::{install_kit, update_kit, ArtifactFilter};
use dotkit_types::{ArtifactType, ConflictPolicy};

pub async fn execute(
    ctx: &Context,
    kit: &str,
    user: bool,
    policy: Option<ConflictPolicy>,
    types: &[ArtifactType],
    names: &[String],
) -> Result<()> {
    let scope = scope(user);
    let config = ctx.store.load(scope).context("Failed to load kit configuration")?;
    let policy = policy.unwrap_or(config.default_conflict_policy);

    println!("{} kit: {}", "Installing".green().bold(), kit.cyan());

    let resolved = ctx.sources().resolve(kit)?;
    println!("  Source: {} ({})", resolved.source.cyan(), resolved.source_type);

    let mut filter = ArtifactFilter::default();
    if !types.is_empty() {
        filter = filter.with_types(types.iter().copied());
    }
    if !names.is_empty() {
        filter = filter.with_names(names.iter().cloned());
    }
    let filter = (filter != ArtifactFilter::default()).then_some(filter);

    let dest = ctx.store.managed_root(scope);
    let mut installed = install_kit(&resolved, &dest, policy, filter.as_ref())
        .with_context(|| format!("Failed to install kit '{}'", kit))?;

    for artifact in &installed.artifacts {
        println!("  {} {}", "+".green(), artifact);
    }

    // A reinstall keeps ownership of artifacts written by earlier installs.
    if let Some(previous) = config.get(&installed.kit_id) {
        let mut merged = previous.artifacts.clone();
        for artifact in &installed.artifacts {
            if !merged.contains(artifact) {
                merged.push(artifact.clone());
            }
        }
        installed.artifacts = merged;
    }

    let kit_id = installed.kit_id.clone();
    let version = installed.version.clone();
    ctx.store.save(scope, &update_kit(&config, installed))?;

    println!(
        "{} Installed {} {} into {}",
        "✓".green().bold(),
        kit_id.to_string().cyan(),
        version,
        dest.display()
    );
    Ok(())
}
