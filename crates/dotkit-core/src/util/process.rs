//! Process execution utilities.

use dotkit_types::{DotkitError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of a finished (or abandoned) child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal or timed out
    pub exit_code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Whether the timeout expired and the child was killed
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run a program asynchronously, piping `input` to its stdin.
///
/// Stdin is written from a separate task so a child that produces output
/// before draining its input cannot deadlock against us. With a `timeout`,
/// the child is killed once it expires.
pub async fn run_script(
    program: &str,
    args: &[&str],
    env_vars: &HashMap<String, String>,
    cwd: Option<&Path>,
    input: &[u8],
    timeout: Option<Duration>,
) -> Result<ProcessOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in env_vars {
        cmd.env(key, value);
    }

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn()
        .map_err(|e| DotkitError::Hook(format!("Failed to spawn {}: {}", program, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        let payload = input.to_vec();
        tokio::spawn(async move {
            // A child that exits without reading its input closes the pipe early.
            let _ = stdin.write_all(&payload).await;
            let _ = stdin.shutdown().await;
        });
    }

    let waited = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(result) => result,
            Err(_) => {
                return Ok(ProcessOutput {
                    exit_code: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    timed_out: true,
                });
            }
        },
        None => child.wait_with_output().await,
    };

    let output = waited
        .map_err(|e| DotkitError::Hook(format!("Failed to wait for {}: {}", program, e)))?;

    Ok(ProcessOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        timed_out: false,
    })
}
