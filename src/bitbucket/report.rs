//! Report payloads built from captured lines

use crate::linter::CapturedLine;
use serde::Serialize;

/// Report key, also the `reporter` of the statistics report
pub const REPORT_KEY: &str = "ruff2bitbucket";

/// Bitbucket accepts at most this many annotations per report
pub const MAX_ANNOTATIONS: usize = 1000;

const REFORMAT_MARKER: &str = "reformat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportResult {
    Pass,
    Fail,
}

/// One numeric facet of the statistics report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataPoint {
    pub title: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: usize,
}

impl DataPoint {
    fn number(title: &'static str, value: usize) -> Self {
        Self {
            title,
            kind: "NUMBER",
            value,
        }
    }
}

/// Body of `PUT .../reports/ruff2bitbucket`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsReport {
    pub result: ReportResult,
    pub title: &'static str,
    pub reporter: &'static str,
    pub report_type: &'static str,
    pub data: Vec<DataPoint>,
}

impl StatisticsReport {
    pub fn from_lines(lines: &[CapturedLine]) -> Self {
        let need_reformat = lines
            .iter()
            .filter(|l| l.description().contains(REFORMAT_MARKER))
            .count();

        Self {
            result: if lines.is_empty() {
                ReportResult::Pass
            } else {
                ReportResult::Fail
            },
            title: "ruff report",
            reporter: REPORT_KEY,
            report_type: "CODE_SMELL",
            data: vec![
                DataPoint::number("Need reformat", need_reformat),
                DataPoint::number("Issue count", lines.len() - need_reformat),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub report_key: &'static str,
    pub path: String,
    pub line: u32,
    pub message: String,
    pub severity: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<&CapturedLine> for Annotation {
    fn from(line: &CapturedLine) -> Self {
        Self {
            report_key: REPORT_KEY,
            path: line.filename().to_string(),
            line: line.line(),
            message: line.description().to_string(),
            severity: "LOW",
            kind: "CODE_SMELL",
        }
    }
}

/// Body of `PUT .../reports/ruff2bitbucket/annotations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationsReport {
    pub annotations: Vec<Annotation>,
}

impl AnnotationsReport {
    /// Only the first [`MAX_ANNOTATIONS`] lines are kept.
    pub fn from_lines(lines: &[CapturedLine]) -> Self {
        Self {
            annotations: lines.iter().take(MAX_ANNOTATIONS).map(Annotation::from).collect(),
        }
    }
}
