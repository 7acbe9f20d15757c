//! Credential resolution for the Bitbucket REST API
//!
//! Candidates come from exactly one [`CredentialSource`], chosen from the
//! command-line flags:
//!
//! - `--user` + `--pass`: an explicit pair
//! - `--user` + `--token`: a personal access token
//! - `--user` + `--service_name`: password looked up in the system keyring
//! - `--user` + `--passvar`: username and password read from the named
//!   environment variables
//! - nothing: every `<PREFIX>USER`/`<PREFIX>PASS`-style environment pair
//!
//! Resolution is two-phase. [`CredentialResolver::from_flags`] only checks the
//! flag structure; secret lookups and blank checks happen when
//! [`CredentialResolver::resolve`] materializes the candidates. The resulting
//! [`CredentialSet`] is cached until [`CredentialResolver::reset`].

mod source;
mod store;

pub use source::{CredentialFlags, CredentialSource, PASS_SUFFIXES, USER_SUFFIXES};
pub use store::{default_secret_store, SecretStore, SystemKeyring};

use base64::{engine::general_purpose, Engine as _};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Errors raised while building or materializing credentials
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("No username found. Please check the 'SECURITY' section in the readme on how to provide one.")]
    MissingUsername,

    #[error("No password found. Please check the 'SECURITY' section in the readme on how to provide one.")]
    MissingPassword,

    #[error(
        "I found a user without an authentication method? \
         Please provide one, or remove for automatic envvar checking."
    )]
    UserWithoutAuthMethod,

    #[error(
        "Couldn't use the system keyring: ruff2bitbucket was built without the 'keyring' feature. \
         Reinstall it with `cargo install ruff2bitbucket --features keyring`."
    )]
    SecretStoreUnavailable,

    #[error("Keyring lookup for service '{service}' failed: {message}")]
    SecretStore { service: String, message: String },
}

/// A username/password pair. Neither side is ever empty.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    username: String,
    password: String,
}

impl Credential {
    /// Build a credential, trimming both sides.
    pub fn new(username: &str, password: &str) -> Result<Self, CredentialError> {
        let username = username.trim();
        let password = password.trim();

        if username.is_empty() {
            return Err(CredentialError::MissingUsername);
        }
        if password.is_empty() {
            return Err(CredentialError::MissingPassword);
        }

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Value for an `Authorization` header
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", general_purpose::STANDARD.encode(raw))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Materialized candidates, narrowed to one once the server accepts a credential.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    candidates: Vec<Credential>,
    confirmed: Option<Credential>,
}

impl CredentialSet {
    pub fn new(candidates: Vec<Credential>) -> Self {
        Self {
            candidates,
            confirmed: None,
        }
    }

    /// Number of credentials left to try. Most likely just 1.
    pub fn len(&self) -> usize {
        if self.confirmed.is_some() {
            return 1;
        }
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The confirmed credential alone, or every candidate in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        match &self.confirmed {
            Some(confirmed) => std::slice::from_ref(confirmed).iter(),
            None => self.candidates.iter(),
        }
    }

    /// Restrict all further iteration to `credential`.
    pub fn report_correct_combination(&mut self, credential: Credential) {
        debug!("Bitbucket accepted the credentials of '{}'", credential.username());
        self.confirmed = Some(credential);
    }

    pub fn confirmed(&self) -> Option<&Credential> {
        self.confirmed.as_ref()
    }
}

impl<'a> IntoIterator for &'a CredentialSet {
    type Item = &'a Credential;
    type IntoIter = Box<dyn Iterator<Item = &'a Credential> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Snapshot of the process environment, in the order the OS reports it.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: Vec<(String, String)>,
}

impl Environment {
    /// Capture the current process environment. Non-UTF-8 entries are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Computes the [`CredentialSet`] once and hands out the cached copy afterwards.
pub struct CredentialResolver {
    source: CredentialSource,
    env: Environment,
    store: Box<dyn SecretStore>,
    resolved: Option<CredentialSet>,
}

impl CredentialResolver {
    pub fn new(source: CredentialSource, env: Environment, store: Box<dyn SecretStore>) -> Self {
        Self {
            source,
            env,
            store,
            resolved: None,
        }
    }

    /// Pick the source from the command-line flags, using the system keyring.
    ///
    /// Fails immediately only for structural problems (a user without any
    /// way to get a password).
    pub fn from_flags(flags: &CredentialFlags, env: Environment) -> Result<Self, CredentialError> {
        let source = CredentialSource::from_flags(flags)?;
        Ok(Self::new(source, env, default_secret_store()))
    }

    /// Materialize the candidates on first use; later calls return the cache,
    /// including any credential confirmed in the meantime.
    pub fn resolve(&mut self) -> Result<&mut CredentialSet, CredentialError> {
        let set = match self.resolved.take() {
            Some(set) => set,
            None => {
                let candidates = self.source.materialize(&self.env, self.store.as_ref())?;
                debug!(
                    "{} credential candidate(s) from {}",
                    candidates.len(),
                    self.source.kind()
                );
                CredentialSet::new(candidates)
            }
        };
        Ok(self.resolved.insert(set))
    }

    /// Drop the cached set (and any confirmed credential).
    pub fn reset(&mut self) {
        self.resolved = None;
    }
}
