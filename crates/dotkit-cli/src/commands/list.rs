//! List artifacts and their provenance.

use super::{scope, Context};
use anyhow::Result;
use colored::Colorize;
use dotkit_kit::discover_all_artifacts;
use dotkit_types::Provenance;

pub async fn execute(ctx: &Context, user: bool) -> Result<()> {
    let scope = scope(user);
    let config = ctx.store.load(scope)?;
    let root = ctx.store.managed_root(scope);

    println!("{} artifacts in {}", "Listing".green().bold(), root.display());

    let artifacts = discover_all_artifacts(&root, &config)?;
    if artifacts.is_empty() {
        println!("  {} No artifacts found", "!".yellow());
        return Ok(());
    }

    let mut current_type = None;
    for artifact in &artifacts {
        if current_type != Some(artifact.artifact_type) {
            println!("\n{}:", artifact.artifact_type.dir_name().bold());
            current_type = Some(artifact.artifact_type);
        }

        let provenance = match artifact.provenance {
            Provenance::Managed => "managed".green(),
            Provenance::Unmanaged => "unmanaged".yellow(),
            Provenance::Local => "local".dimmed(),
        };

        match (&artifact.kit_id, &artifact.kit_version) {
            (Some(kit_id), Some(version)) => println!(
                "  {} [{}] {} {}",
                artifact.name.cyan(),
                provenance,
                kit_id,
                version
            ),
            _ => println!("  {} [{}]", artifact.name.cyan(), provenance),
        }
    }

    Ok(())
}
