//! Git lookups using libgit2
//!
//! Only two facts are needed from the checkout: the HEAD commit id and the
//! `remote.origin.url` setting. Failing to read either is fatal.

use anyhow::{Context, Result};
use git2::Repository;
use std::path::PathBuf;
use tracing::debug;

/// Source of the commit id and remote url
pub trait GitSource {
    /// Full hash of the commit HEAD points to
    fn head_commit(&self) -> Result<String>;

    /// Value of `remote.origin.url`
    fn remote_url(&self) -> Result<String>;
}

/// A checkout on disk. The repository is discovered from `path` upwards on
/// every lookup, so nothing is opened until a lookup is made.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    path: PathBuf,
}

impl LocalRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<Repository> {
        let repo = Repository::discover(&self.path)
            .with_context(|| format!("Failed to open git repository at {:?}", self.path))?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(repo)
    }
}

impl GitSource for LocalRepository {
    fn head_commit(&self) -> Result<String> {
        let repo = self.open()?;
        let commit = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .context("Failed to resolve HEAD to a commit")?;
        Ok(commit.id().to_string())
    }

    fn remote_url(&self) -> Result<String> {
        let repo = self.open()?;
        let url = repo
            .config()
            .and_then(|config| config.get_string("remote.origin.url"))
            .context("Failed to read remote.origin.url from the git config")?;
        Ok(url.trim().to_string())
    }
}
