//! Search available kits.

use super::Context;
use anyhow::Result;
use colored::Colorize;
use dotkit_kit::KitManifest;

pub async fn execute(ctx: &Context, query: Option<&str>) -> Result<()> {
    println!("{} available kits", "Listing".green().bold());

    let sources = ctx.sources();
    let query = query.map(str::to_lowercase);

    let matches: Vec<_> = sources
        .list_available()
        .into_iter()
        .filter(|(id, _)| query.as_deref().map_or(true, |q| id.contains(q)))
        .collect();

    if matches.is_empty() {
        println!("  {} No kits found", "!".yellow());
        return Ok(());
    }

    for (id, source_type) in matches {
        let details = sources
            .resolve(&id)
            .and_then(|resolved| KitManifest::load(&resolved.manifest_path));

        match details {
            Ok(manifest) if !manifest.description.is_empty() => println!(
                "  {} {} [{}] - {}",
                id.cyan(),
                manifest.version,
                source_type,
                manifest.description
            ),
            Ok(manifest) => println!("  {} {} [{}]", id.cyan(), manifest.version, source_type),
            Err(_) => println!("  {} [{}]", id.cyan(), source_type),
        }
    }

    Ok(())
}
