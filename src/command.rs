//! External command execution
//!
//! One call spawns exactly one process; there is no retry logic here.
//! Retrying belongs to the poller, which re-invokes these helpers per tick.

use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Upper bound on any single external command invocation
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Captured output of a completed command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Combined stdout and stderr, in that order
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }
}

/// Render a program and arguments as a single display string
fn display(program: &str, args: &[&str]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Run a command and capture its output, without judging the exit status.
///
/// Returns the captured output and whether the command exited zero. Spawn
/// failures and the command timeout are still hard errors. Used by callers
/// that interpret failure themselves, e.g. the tolerated disconnect step.
pub async fn run_unchecked(program: &str, args: &[&str]) -> Result<(CommandOutput, bool)> {
    let command = display(program, args);
    debug!(command = %command, "running");

    let mut cmd = Command::new(program);
    cmd.args(args);

    let output = tokio::time::timeout(COMMAND_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            warn!(command = %command, "timed out after {:?}", COMMAND_TIMEOUT);
            Error::command(command.as_str(), format!("timed out after {:?}", COMMAND_TIMEOUT))
        })?
        .map_err(|e| Error::command(command.as_str(), format!("failed to execute: {}", e)))?;

    let captured = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };
    Ok((captured, output.status.success()))
}

/// Run a command, treating any non-zero exit as an error.
///
/// The error carries the command line and captured stderr so scenario
/// failures report the exact diagnostic output of the step that broke.
pub async fn run(program: &str, args: &[&str]) -> Result<CommandOutput> {
    let (output, success) = run_unchecked(program, args).await?;
    if success {
        Ok(output)
    } else {
        let command = display(program, args);
        warn!(command = %command, stderr = %output.stderr.trim(), "command failed");
        Err(Error::command(command, output.stderr.trim().to_string()))
    }
}

/// Check whether a tool is resolvable on PATH
pub async fn tool_available(tool: &str) -> bool {
    matches!(run_unchecked("which", &[tool]).await, Ok((_, true)))
}
