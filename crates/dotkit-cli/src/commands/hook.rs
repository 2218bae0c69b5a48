//! Manage installed hooks.

use super::{parse_kit_id, scope, Context};
use anyhow::Result;
use colored::Colorize;
use dotkit_kit::{hook_root, list_hooks, set_hook_enabled};

pub async fn list(ctx: &Context, user: bool) -> Result<()> {
    let root = hook_root(&ctx.store.managed_root(scope(user)));
    println!("{} hooks in {}", "Listing".green().bold(), root.display());

    let hooks = list_hooks(&root);
    if hooks.is_empty() {
        println!("  {} No hooks installed", "!".yellow());
        return Ok(());
    }

    for hook in &hooks {
        let state = if hook.config.enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        };
        let matcher = if hook.config.matcher.is_empty() {
            String::new()
        } else {
            format!(" /{}/", hook.config.matcher)
        };

        println!(
            "  {}/{} {}{} [{}]",
            hook.kit_id.to_string().cyan(),
            hook.config.name.cyan().bold(),
            hook.config.lifecycle,
            matcher,
            state
        );
        if let Some(description) = &hook.config.description {
            println!("      {}", description.dimmed());
        }
    }

    Ok(())
}

pub async fn set_enabled(ctx: &Context, kit: &str, hook: &str, user: bool, enabled: bool) -> Result<()> {
    let kit_id = parse_kit_id(kit)?;
    let root = hook_root(&ctx.store.managed_root(scope(user)));

    set_hook_enabled(&root, &kit_id, hook, enabled)?;

    println!(
        "{} {} hook {}/{}",
        "✓".green().bold(),
        if enabled { "Enabled" } else { "Disabled" },
        kit_id,
        hook
    );
    Ok(())
}
