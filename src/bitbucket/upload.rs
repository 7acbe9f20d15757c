//! Uploading reports while probing credentials
//!
//! Candidates are tried in order. A 401 moves on to the next one; any other
//! status means the credential is right, so it is remembered and the loop
//! stops. Running out of candidates is fatal for the whole run.

use super::{AnnotationsReport, HttpReply, InsightsClient, RepoInfo, StatisticsReport};
use crate::credentials::{Credential, CredentialSet};
use crate::linter::CapturedLine;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, warn};

/// Status Bitbucket answers with for a wrong user/password
pub const UNAUTHORIZED: u16 = 401;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Cannot upload the {name} to bitbucket. No valid user/pass found.")]
    NoValidCredentials { name: &'static str },

    #[error("PUT {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to serialize the report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The two documents uploaded per commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Statistics,
    Annotations,
}

impl ReportKind {
    /// Name used in log messages
    pub fn name(self) -> &'static str {
        match self {
            ReportKind::Statistics => "report",
            ReportKind::Annotations => "annotations",
        }
    }

    /// Status meaning "authenticated, but the payload was rejected"
    pub fn validation_status(self) -> u16 {
        match self {
            ReportKind::Statistics => 400,
            ReportKind::Annotations => 404,
        }
    }
}

/// PUT `report` to `url` with the first credential the server accepts.
pub fn upload_report(
    client: &dyn InsightsClient,
    credentials: &mut CredentialSet,
    url: &str,
    report: &JsonValue,
    kind: ReportKind,
) -> Result<HttpReply, UploadError> {
    let candidates: Vec<Credential> = credentials.iter().cloned().collect();

    for credential in candidates {
        let reply = client.put_json(url, report, &credential)?;
        if reply.status == UNAUTHORIZED {
            debug!("'{}' was not accepted for the {}", credential.username(), kind.name());
            continue;
        }

        credentials.report_correct_combination(credential);

        if reply.status == kind.validation_status() {
            warn!("'PUT {}' reported one or more errors:", url);
            for line in pretty_body(&reply.body).lines() {
                warn!("{}", line);
            }
        }
        return Ok(reply);
    }

    Err(UploadError::NoValidCredentials { name: kind.name() })
}

/// Upload the statistics report, then the annotations.
pub fn publish(
    client: &dyn InsightsClient,
    credentials: &mut CredentialSet,
    repo: &RepoInfo,
    lines: &[CapturedLine],
) -> Result<(), UploadError> {
    let statistics = serde_json::to_value(StatisticsReport::from_lines(lines))?;
    upload_report(
        client,
        credentials,
        &repo.report_endpoint(),
        &statistics,
        ReportKind::Statistics,
    )?;

    let annotations = serde_json::to_value(AnnotationsReport::from_lines(lines))?;
    upload_report(
        client,
        credentials,
        &repo.annotations_endpoint(),
        &annotations,
        ReportKind::Annotations,
    )?;

    Ok(())
}

/// JSON bodies re-indented with four spaces; anything else verbatim
fn pretty_body(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<JsonValue>(body) else {
        return body.to_string();
    };

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    if value.serialize(&mut ser).is_err() {
        return body.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| body.to_string())
}
