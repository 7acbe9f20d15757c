//! Subprocess execution for external tools
//!
//! A non-zero exit status is not an error here: ruff exits 1 whenever it
//! finds something, and the findings are exactly what we want.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Result from running an external tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalToolResult {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Error message if the process could not be run
    pub error: Option<String>,
}

impl ExternalToolResult {
    /// Output of a process that ran to completion, whatever its exit status
    pub fn completed(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            error: None,
        }
    }

    /// The process could not be run
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// Seam between the checks and the operating system
pub trait ToolRunner {
    /// Check if a tool is installed
    fn is_installed(&self, tool: &str) -> bool;

    /// Run `cmd[0]` with `cmd[1..]` as arguments
    fn run(&self, cmd: &[&str]) -> ExternalToolResult;
}

/// Runs tools as child processes inside one working directory
#[derive(Debug, Clone)]
pub struct SystemRunner {
    cwd: PathBuf,
}

impl SystemRunner {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

impl ToolRunner for SystemRunner {
    fn is_installed(&self, tool: &str) -> bool {
        Command::new(tool)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn run(&self, cmd: &[&str]) -> ExternalToolResult {
        run_external_tool(cmd, Some(&self.cwd))
    }
}

/// Run an external tool and capture its output as text
pub fn run_external_tool(cmd: &[&str], cwd: Option<&Path>) -> ExternalToolResult {
    let Some((program, args)) = cmd.split_first() else {
        return ExternalToolResult::failure("Empty command");
    };

    debug!("Running {} {:?}", program, args);

    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = match command.output() {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ExternalToolResult::failure(format!("{} not found. Please install it first.", program));
        }
        Err(e) => return ExternalToolResult::failure(format!("Failed to run {}: {}", program, e)),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    debug!("{} exited with {}", program, output.status);

    ExternalToolResult::completed(stdout, stderr)
}
