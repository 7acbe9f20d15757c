//! Running ruff and capturing its findings
//!
//! Two checks are run, both on the text output of ruff:
//!
//! - `ruff check --no-fix .` for code mistakes
//! - `ruff format --check .` for files that need reformatting
//!
//! When ruff is not installed each check logs a warning and yields nothing,
//! so an absent tool is only distinguishable from a clean run through the log.

mod parser;
mod runner;

pub use parser::{parse_lines, Grammar};
pub use runner::{run_external_tool, ExternalToolResult, SystemRunner, ToolRunner};

use tracing::{debug, info, warn};

/// Name of the linter executable
pub const RUFF: &str = "ruff";

/// One finding extracted from linter output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedLine {
    filename: String,
    line: u32,
    column: u32,
    description: String,
}

impl CapturedLine {
    /// Filename is trimmed, description loses trailing whitespace.
    pub fn new(filename: &str, line: u32, column: u32, description: &str) -> Self {
        Self {
            filename: filename.trim().to_string(),
            line,
            column,
            description: description.trim_end().to_string(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Detected errors in the files (`ruff check`)
pub fn check_code_mistakes(runner: &dyn ToolRunner) -> Vec<CapturedLine> {
    if !runner.is_installed(RUFF) {
        warn!("No code validation is done as ruff is not available.");
        return Vec::new();
    }
    capture(runner, &[RUFF, "check", "--no-fix", "."], Grammar::Diagnostic)
}

/// Files that would be reformatted (`ruff format --check`)
pub fn check_formatting(runner: &dyn ToolRunner) -> Vec<CapturedLine> {
    if !runner.is_installed(RUFF) {
        warn!("No format check is done because ruff is not available.");
        return Vec::new();
    }
    capture(runner, &[RUFF, "format", "--check", "."], Grammar::Reformat)
}

fn capture(runner: &dyn ToolRunner, cmd: &[&str], grammar: Grammar) -> Vec<CapturedLine> {
    let result = runner.run(cmd);
    if let Some(error) = &result.error {
        warn!("{}", error);
    }
    if !result.stderr.trim().is_empty() {
        debug!("{} stderr: {}", cmd.join(" "), result.stderr.trim());
    }

    let lines: Vec<CapturedLine> = parse_lines(&result.stdout, grammar).collect();
    info!("{}: {} finding(s)", cmd.join(" "), lines.len());
    lines
}
