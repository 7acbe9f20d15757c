//! Bitbucket Server code insights
//!
//! See the "insights" group of the Bitbucket Server REST API: a report is
//! PUT to `.../commits/{commit}/reports/{key}` and its annotations to
//! `.../reports/{key}/annotations`.

mod client;
mod report;
mod upload;

pub use client::{HttpReply, InsightsClient, UreqClient};
pub use report::{
    Annotation, AnnotationsReport, DataPoint, ReportResult, StatisticsReport, MAX_ANNOTATIONS, REPORT_KEY,
};
pub use upload::{publish, upload_report, ReportKind, UploadError, UNAUTHORIZED};

use crate::git::GitSource;
use anyhow::Result;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;
use ureq::http::Uri;

static SCM_PATH: OnceLock<Regex> = OnceLock::new();
static PROJECTS_PATH: OnceLock<Regex> = OnceLock::new();

/// The remote url can't be turned into REST endpoints
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("No git has been set up, so we can't upload anything to BitBucket.")]
    NoRemote,

    #[error("Couldn't interpret '{0}' as a BitBucket url. Please file an issue if this is in error!")]
    UnrecognizedUrl(String),
}

/// Addressing data for one commit of one Bitbucket repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub scheme: String,
    pub authority: String,
    pub repo_key: String,
    pub repo_slug: String,
    pub commit_id: String,
}

impl RepoInfo {
    /// Read the remote url and HEAD commit from git.
    pub fn locate(git: &dyn GitSource) -> Result<Self> {
        let url = git.remote_url()?;
        if url.trim().is_empty() {
            return Err(RepoError::NoRemote.into());
        }
        let commit_id = git.head_commit()?;
        let info = Self::from_remote(&url, &commit_id)?;
        debug!("Bitbucket repository {}/{} at {}", info.repo_key, info.repo_slug, info.commit_id);
        Ok(info)
    }

    /// Accepts `.../scm/<key>/<slug>.git` clone urls and
    /// `.../projects/<key>/repos/<slug>/...` browse urls.
    pub fn from_remote(url: &str, commit_id: &str) -> Result<Self, RepoError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RepoError::NoRemote);
        }
        let unrecognized = || RepoError::UnrecognizedUrl(url.to_string());

        let uri: Uri = url.parse().map_err(|_| unrecognized())?;
        let scheme = uri.scheme_str().ok_or_else(unrecognized)?;
        let authority = uri.authority().ok_or_else(unrecognized)?;

        let scm = SCM_PATH.get_or_init(|| Regex::new(r"(?i)/scm/(?P<key>.*?)/(?P<slug>.*?)\.git").expect("valid regex"));
        let projects = PROJECTS_PATH.get_or_init(|| {
            Regex::new(r"(?i)/projects/(?P<key>.*?)/repos/(?P<slug>.*?)[/\\.].*$").expect("valid regex")
        });

        let caps = scm
            .captures(uri.path())
            .or_else(|| projects.captures(uri.path()))
            .ok_or_else(unrecognized)?;

        Ok(Self {
            scheme: scheme.to_string(),
            authority: authority.as_str().to_string(),
            repo_key: caps["key"].to_string(),
            repo_slug: caps["slug"].to_string(),
            commit_id: commit_id.trim().to_string(),
        })
    }

    fn base(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    /// Endpoint for the statistics report
    pub fn report_endpoint(&self) -> String {
        format!(
            "{}/rest/insights/latest/projects/{}/repos/{}/commits/{}/reports/{}",
            self.base(),
            self.repo_key,
            self.repo_slug,
            self.commit_id,
            REPORT_KEY
        )
    }

    /// Endpoint for the annotations
    pub fn annotations_endpoint(&self) -> String {
        format!("{}/annotations", self.report_endpoint())
    }

    /// Web page of the commit, where the report shows up
    pub fn commit_url(&self) -> String {
        format!(
            "{}/projects/{}/repos/{}/commits/{}",
            self.base(),
            self.repo_key,
            self.repo_slug,
            self.commit_id
        )
    }
}
