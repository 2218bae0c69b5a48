//! Remove an installed kit.

use super::{parse_kit_id, scope, Context};
use anyhow::{bail, Result};
use colored::Colorize;
use dotkit_kit::{remove_kit, uninstall};

pub async fn execute(ctx: &Context, kit: &str, user: bool) -> Result<()> {
    let scope = scope(user);
    let kit_id = parse_kit_id(kit)?;
    let config = ctx.store.load(scope)?;

    let Some(installed) = config.get(&kit_id) else {
        bail!("Kit '{}' is not installed in the {} scope", kit_id, scope);
    };

    println!("{} kit: {}", "Removing".green().bold(), kit_id.to_string().cyan());

    let removed = uninstall(installed, &ctx.store.managed_root(scope))?;
    ctx.store.save(scope, &remove_kit(&config, &kit_id))?;

    println!("{} Removed {} artifact(s)", "✓".green().bold(), removed);
    Ok(())
}
