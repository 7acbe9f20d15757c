//! Text grammars for ruff output

use super::CapturedLine;
use regex::{Captures, Regex};
use std::sync::OnceLock;

static DIAGNOSTIC: OnceLock<Regex> = OnceLock::new();
static REFORMAT: OnceLock<Regex> = OnceLock::new();

/// Which kind of ruff output a line is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `path:line:column: description` from `ruff check`
    Diagnostic,
    /// `Would reformat: path` from `ruff format --check`
    Reformat,
}

impl Grammar {
    fn regex(self) -> &'static Regex {
        match self {
            Grammar::Diagnostic => DIAGNOSTIC.get_or_init(|| {
                Regex::new(r"(?i)^(?P<filename>.*?):(?P<line>\d+):(?P<column>\d+):\s*(?P<description>.*)$")
                    .expect("valid regex")
            }),
            Grammar::Reformat => REFORMAT.get_or_init(|| {
                Regex::new(r"(?i)^(?P<description>Would reformat):?\s*(?P<filename>.*?)$")
                    .expect("valid regex")
            }),
        }
    }

    /// Parse one output line, or `None` when it doesn't match
    pub fn capture(self, line: &str) -> Option<CapturedLine> {
        let caps = self.regex().captures(line)?;
        let filename = group(&caps, "filename");
        let description = group(&caps, "description");

        match self {
            Grammar::Diagnostic => {
                let line = group(&caps, "line").parse().ok()?;
                let column = group(&caps, "column").parse().ok()?;
                Some(CapturedLine::new(filename, line, column, description))
            }
            Grammar::Reformat => Some(CapturedLine::new(filename, 0, 0, description)),
        }
    }
}

fn group<'h>(caps: &Captures<'h>, name: &str) -> &'h str {
    caps.name(name).map(|m| m.as_str()).unwrap_or_default()
}

/// Lazily parse every matching line of `output`; other lines are skipped.
///
/// Call again on the same text to restart.
pub fn parse_lines(output: &str, grammar: Grammar) -> impl Iterator<Item = CapturedLine> + '_ {
    output
        .trim()
        .lines()
        .filter_map(move |line| grammar.capture(line))
}
