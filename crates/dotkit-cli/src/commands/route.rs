//! Route a lifecycle event to installed hooks.
//!
//! Stdout carries only relayed hook output; status goes to the log on stderr.

use super::{scope, Context};
use anyhow::{Context as _, Result};
use dotkit_core::time::{measure, pretty_duration};
use dotkit_kit::{hook_root, HookRouter};
use dotkit_types::Lifecycle;
use std::str::FromStr;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

pub async fn execute(ctx: &Context, lifecycle: &str, user: bool) -> Result<()> {
    let lifecycle = Lifecycle::from_str(lifecycle)?;

    let mut raw = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw)
        .await
        .context("Failed to read hook context from stdin")?;

    let router = HookRouter::new(hook_root(&ctx.store.managed_root(scope(user))))
        .with_timeout(ctx.hook_timeout())
        .with_cwd(&ctx.project_dir);

    let (report, elapsed) = measure(router.dispatch(lifecycle, &raw)).await;
    debug!(
        "{}: {} hook(s) in {}",
        report.lifecycle,
        report.results.len(),
        pretty_duration(elapsed)
    );

    if report.failed_count() > 0 {
        warn!("{} of {} hook(s) failed", report.failed_count(), report.results.len());
    }
    Ok(())
}
