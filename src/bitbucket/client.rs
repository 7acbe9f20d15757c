//! HTTP transport for the insights endpoints
//!
//! Uses ureq (sync HTTP) with status codes handed back to the caller, since
//! a 401 is an expected answer while probing credentials.

use super::UploadError;
use crate::credentials::Credential;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// Status and body of a server response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// PUT a JSON document with basic authentication
pub trait InsightsClient {
    /// Any status, including 4xx/5xx, is an `Ok` reply. `Err` means the
    /// request never got an answer.
    fn put_json(&self, url: &str, body: &JsonValue, credential: &Credential) -> Result<HttpReply, UploadError>;
}

/// Sync client for the Bitbucket REST API
pub struct UreqClient {
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(Duration::from_secs(60)))
        .build()
        .new_agent()
}

impl UreqClient {
    pub fn new() -> Self {
        Self { agent: make_agent() }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightsClient for UreqClient {
    fn put_json(&self, url: &str, body: &JsonValue, credential: &Credential) -> Result<HttpReply, UploadError> {
        debug!("PUT {} as '{}'", url, credential.username());

        let response = self
            .agent
            .put(url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("Authorization", &credential.basic_auth_header())
            .send_json(body)
            .map_err(|e| UploadError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = match response.into_body().read_to_string() {
            Ok(text) => text,
            Err(e) => {
                debug!("Failed to read the response body of PUT {}: {}", url, e);
                String::new()
            }
        };
        debug!("PUT {} -> {}", url, status);

        Ok(HttpReply::new(status, text))
    }
}
