//! Command-line interface and the run itself

use crate::bitbucket::{self, InsightsClient, RepoInfo, UreqClient};
use crate::credentials::{CredentialFlags, CredentialResolver, Environment};
use crate::git::{GitSource, LocalRepository};
use crate::linter::{self, SystemRunner, ToolRunner};
use anyhow::{bail, Result};
use clap::{Args, Parser};
use std::path::PathBuf;
use tracing::info;

/// Upload ruff findings to Bitbucket Server code insights
#[derive(Parser, Debug)]
#[command(name = "ruff2bitbucket")]
#[command(
    version,
    about = "Run ruff on a checkout and upload the findings as a Bitbucket Server code-insights report",
    after_help = "\
Authentication (first match wins):
  --user U --pass P           Explicit user and password
  --user U --token T          Personal access token
  --user U --service_name S   Password from the system keyring (needs the 'keyring' feature)
  --user UVAR --passvar PVAR  User and password read from the named environment variables
  (nothing)                   Every FOO_USER/FOO_PASS-style environment pair is tried

Examples:
  ruff2bitbucket                               Lint and upload the current directory
  ruff2bitbucket path/to/checkout --user ci --token \"$BB_TOKEN\""
)]
pub struct Cli {
    /// Path to the checkout (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(flatten)]
    pub auth: AuthArgs,
}

/// Authentication flags. At most one password source may be given, and each
/// one needs `--user`.
#[derive(Args, Debug, Default, Clone)]
pub struct AuthArgs {
    /// Username (or, with --passvar, the environment variable holding it)
    #[arg(long)]
    pub user: Option<String>,

    /// Password used for authentication
    #[arg(long = "pass", requires = "user", conflicts_with_all = ["token", "service_name", "passvar"])]
    pub pass: Option<String>,

    /// Bitbucket API token used for authentication
    #[arg(long, requires = "user", conflicts_with_all = ["pass", "service_name", "passvar"])]
    pub token: Option<String>,

    /// Service name for keyring authentication
    #[arg(long = "service_name", requires = "user", conflicts_with_all = ["pass", "token", "passvar"])]
    pub service_name: Option<String>,

    /// Environment variable holding the password
    #[arg(long, requires = "user", conflicts_with_all = ["pass", "token", "service_name"])]
    pub passvar: Option<String>,
}

impl AuthArgs {
    pub fn flags(&self) -> CredentialFlags {
        CredentialFlags {
            user: self.user.clone(),
            pass: self.pass.clone(),
            token: self.token.clone(),
            service_name: self.service_name.clone(),
            passvar: self.passvar.clone(),
        }
    }
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Both reports were uploaded
    Uploaded,
    /// Ruff found nothing, so nothing was sent
    NothingToReport,
}

/// The collaborators a run talks to
pub struct Services<'a> {
    pub runner: &'a dyn ToolRunner,
    pub git: &'a dyn GitSource,
    pub client: &'a dyn InsightsClient,
}

/// Build the real collaborators from the command line and run once.
pub fn run(cli: Cli) -> Result<RunOutcome> {
    let mut resolver = CredentialResolver::from_flags(&cli.auth.flags(), Environment::capture())?;

    let runner = SystemRunner::new(&cli.path);
    let git = LocalRepository::new(&cli.path);
    let client = UreqClient::new();

    execute(
        &mut resolver,
        &Services {
            runner: &runner,
            git: &git,
            client: &client,
        },
    )
}

/// Credentials → ruff → reports. Every error is fatal for the run.
pub fn execute(resolver: &mut CredentialResolver, services: &Services<'_>) -> Result<RunOutcome> {
    let credentials = resolver.resolve()?;
    if credentials.is_empty() {
        bail!("No valid credentials found.");
    }

    let mut captured = linter::check_code_mistakes(services.runner);
    captured.extend(linter::check_formatting(services.runner));

    if captured.is_empty() {
        info!("no errors detected. No report will be uploaded.");
        return Ok(RunOutcome::NothingToReport);
    }

    let repo = RepoInfo::locate(services.git)?;
    bitbucket::publish(services.client, credentials, &repo, &captured)?;

    info!("reports were succesfully uploaded:\n{}", repo.commit_url());
    Ok(RunOutcome::Uploaded)
}
