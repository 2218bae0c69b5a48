//! Hook router: dispatches a lifecycle event to matching kit hooks.
//!
//! The router never fails on account of a hook. Broken manifests are skipped,
//! malformed matchers never match, and failing scripts are recorded in the
//! report while the remaining hooks keep running.

use crate::hook::{list_hooks, KitHook};
use dotkit_core::util::run_script;
use dotkit_types::{KitId, Lifecycle};
use regex::Regex;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Environment variables exported to hook scripts.
pub const ENV_KIT_ID: &str = "DOTKIT_KIT_ID";
/// Kit version exported to hook scripts.
pub const ENV_KIT_VERSION: &str = "DOTKIT_KIT_VERSION";
/// Hook name exported to hook scripts.
pub const ENV_HOOK_NAME: &str = "DOTKIT_HOOK_NAME";
/// Kit hook directory exported to hook scripts.
pub const ENV_HOOK_DIR: &str = "DOTKIT_HOOK_DIR";
/// Lifecycle event exported to hook scripts.
pub const ENV_LIFECYCLE: &str = "DOTKIT_LIFECYCLE";

/// Result from running one hook.
#[derive(Debug, Clone)]
pub struct HookResult {
    /// Declaring kit
    pub kit_id: KitId,
    /// Hook name
    pub hook_name: String,
    /// Exit code, if the script exited normally
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Whether the hook succeeded
    pub success: bool,
    /// Whether the hook was killed on timeout
    pub timed_out: bool,
    /// Failure to start or locate the script
    pub error: Option<String>,
    /// Wall-clock run time
    pub duration: Duration,
}

impl HookResult {
    /// Check if hook succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get hook output (stdout).
    pub fn output(&self) -> &str {
        &self.stdout
    }

    /// Get hook errors (stderr).
    pub fn errors(&self) -> &str {
        &self.stderr
    }

    fn failed(hook: &KitHook, error: String, duration: Duration) -> Self {
        Self {
            kit_id: hook.kit_id.clone(),
            hook_name: hook.config.name.clone(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            success: false,
            timed_out: false,
            error: Some(error),
            duration,
        }
    }
}

/// Everything that ran for one event.
#[derive(Debug, Clone)]
pub struct RouterReport {
    /// Dispatched event
    pub lifecycle: Lifecycle,
    /// Results in execution order
    pub results: Vec<HookResult>,
}

impl RouterReport {
    /// Number of hooks that failed.
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Serialize raw stdin context for matching and for hook stdin.
///
/// Valid JSON is re-serialized compactly; anything else is used as trimmed
/// text. Empty input becomes `{}`.
pub fn serialize_context(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "{}".to_string();
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => value.to_string(),
        Err(e) => {
            warn!("Hook context is not valid JSON ({}); matching against raw text", e);
            trimmed.to_string()
        }
    }
}

/// Whether a matcher selects a context. Empty matchers always match.
pub fn matches(matcher: &str, context: &str) -> bool {
    if matcher.is_empty() {
        return true;
    }

    match Regex::new(matcher) {
        Ok(re) => re.is_match(context),
        Err(e) => {
            warn!("Ignoring hook with invalid matcher '{}': {}", matcher, e);
            false
        }
    }
}

/// Interpreter used to run a hook script.
pub fn interpreter_for(script: &Path) -> &'static str {
    match script.extension().and_then(|e| e.to_str()) {
        Some("py") => "python3",
        _ => "bash",
    }
}

/// Routes lifecycle events to the hooks installed under a hook root.
#[derive(Debug, Clone)]
pub struct HookRouter {
    hook_root: PathBuf,
    timeout: Option<Duration>,
    cwd: Option<PathBuf>,
    relay: bool,
}

impl HookRouter {
    /// Create a router over a hook root (`<managed root>/hooks`).
    pub fn new(hook_root: impl Into<PathBuf>) -> Self {
        Self {
            hook_root: hook_root.into(),
            timeout: None,
            cwd: None,
            relay: true,
        }
    }

    /// Kill hooks that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run hooks from `cwd` instead of the current directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Whether hook output is copied to our own stdout/stderr.
    pub fn with_relay(mut self, relay: bool) -> Self {
        self.relay = relay;
        self
    }

    /// Enabled hooks registered for `lifecycle`, in execution order.
    pub fn discover(&self, lifecycle: Lifecycle) -> Vec<KitHook> {
        list_hooks(&self.hook_root)
            .into_iter()
            .filter(|hook| hook.config.enabled && hook.config.lifecycle == lifecycle)
            .collect()
    }

    /// Run every matching hook for an event, one after another.
    pub async fn dispatch(&self, lifecycle: Lifecycle, raw_context: &str) -> RouterReport {
        let context = serialize_context(raw_context);
        let candidates = self.discover(lifecycle);
        debug!("{} candidate hook(s) for {}", candidates.len(), lifecycle);

        let mut results = Vec::new();
        for hook in candidates {
            if !matches(&hook.config.matcher, &context) {
                debug!("Hook '{}/{}' does not match", hook.kit_id, hook.config.name);
                continue;
            }

            let result = self.execute(&hook, lifecycle, &context).await;
            if self.relay {
                relay(&result);
            }
            if !result.success {
                warn!(
                    "Hook '{}/{}' failed{}",
                    result.kit_id,
                    result.hook_name,
                    describe_failure(&result)
                );
            }
            results.push(result);
        }

        info!("Dispatched {}: {} hook(s) ran", lifecycle, results.len());
        RouterReport { lifecycle, results }
    }

    async fn execute(&self, hook: &KitHook, lifecycle: Lifecycle, context: &str) -> HookResult {
        let start = Instant::now();
        let script = hook.script_path();

        if !script.is_file() {
            return HookResult::failed(
                hook,
                format!("Script not found: {}", script.display()),
                start.elapsed(),
            );
        }

        let mut env_vars = HashMap::new();
        env_vars.insert(ENV_KIT_ID.to_string(), hook.kit_id.to_string());
        env_vars.insert(ENV_KIT_VERSION.to_string(), hook.kit_version.clone());
        env_vars.insert(ENV_HOOK_NAME.to_string(), hook.config.name.clone());
        env_vars.insert(ENV_HOOK_DIR.to_string(), hook.hook_dir.to_string_lossy().to_string());
        env_vars.insert(ENV_LIFECYCLE.to_string(), lifecycle.to_string());

        let script_arg = script.to_string_lossy().to_string();
        let program = interpreter_for(&script);
        debug!("Running hook '{}/{}' with {}", hook.kit_id, hook.config.name, program);

        match run_script(
            program,
            &[script_arg.as_str()],
            &env_vars,
            self.cwd.as_deref(),
            context.as_bytes(),
            self.timeout,
        )
        .await
        {
            Ok(output) => HookResult {
                kit_id: hook.kit_id.clone(),
                hook_name: hook.config.name.clone(),
                success: output.success(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
                timed_out: output.timed_out,
                error: None,
                duration: start.elapsed(),
            },
            Err(e) => HookResult::failed(hook, e.to_string(), start.elapsed()),
        }
    }
}

fn describe_failure(result: &HookResult) -> String {
    if result.timed_out {
        " (timed out)".to_string()
    } else if let Some(error) = &result.error {
        format!(": {}", error)
    } else {
        match result.exit_code {
            Some(code) => format!(" with exit code {}", code),
            None => " (terminated by signal)".to_string(),
        }
    }
}

fn relay(result: &HookResult) {
    // Relay failures (closed pipes) must not abort the remaining hooks.
    if !result.stdout.is_empty() {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(result.stdout.as_bytes());
        let _ = stdout.flush();
    }
    if !result.stderr.is_empty() {
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(result.stderr.as_bytes());
    }
}
