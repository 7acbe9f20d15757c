//! Where credential candidates come from

use super::{Credential, CredentialError, Environment, SecretStore};
use tracing::debug;

/// Environment variable suffixes that mark a username
pub const USER_SUFFIXES: [&str; 2] = ["USER", "USR"];

/// Environment variable suffixes that mark a password
pub const PASS_SUFFIXES: [&str; 4] = ["PASS", "PW", "PWD", "PASSWORD"];

/// Raw authentication flags as given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialFlags {
    pub user: Option<String>,
    pub pass: Option<String>,
    pub token: Option<String>,
    pub service_name: Option<String>,
    pub passvar: Option<String>,
}

/// One variant per way of obtaining credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `--user` + `--pass`
    UserPass { user: String, password: String },
    /// `--user` + `--token`
    Token { user: String, token: String },
    /// `--user` + `--service_name`; password comes from the secret store
    Keyring { user: String, service_name: String },
    /// `--user` + `--passvar`; both name environment variables
    EnvVar { user_var: String, pass_var: String },
    /// Scan the environment for matching user/password variables
    Auto,
}

impl CredentialSource {
    /// Choose the source. First match wins: pass, token, service name, passvar.
    pub fn from_flags(flags: &CredentialFlags) -> Result<Self, CredentialError> {
        let user = flags.user.clone().unwrap_or_default();

        if let Some(password) = &flags.pass {
            return Ok(Self::UserPass {
                user,
                password: password.clone(),
            });
        }
        if let Some(token) = &flags.token {
            return Ok(Self::Token {
                user,
                token: token.clone(),
            });
        }
        if let Some(service_name) = &flags.service_name {
            return Ok(Self::Keyring {
                user,
                service_name: service_name.clone(),
            });
        }
        if let Some(pass_var) = &flags.passvar {
            return Ok(Self::EnvVar {
                user_var: user,
                pass_var: pass_var.clone(),
            });
        }

        if flags.user.is_some() {
            return Err(CredentialError::UserWithoutAuthMethod);
        }

        Ok(Self::Auto)
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserPass { .. } => "--user/--pass",
            Self::Token { .. } => "--user/--token",
            Self::Keyring { .. } => "keyring",
            Self::EnvVar { .. } => "--user/--passvar",
            Self::Auto => "environment auto-discovery",
        }
    }

    /// Produce the candidate list. Explicit sources yield exactly one
    /// credential or an error; auto-discovery drops blank pairs silently.
    pub fn materialize(
        &self,
        env: &Environment,
        store: &dyn SecretStore,
    ) -> Result<Vec<Credential>, CredentialError> {
        match self {
            Self::UserPass { user, password } => Ok(vec![Credential::new(user, password)?]),
            Self::Token { user, token } => Ok(vec![Credential::new(user, token)?]),
            Self::Keyring { user, service_name } => {
                let password = store.get_password(service_name, user)?;
                Ok(vec![Credential::new(user, password.as_deref().unwrap_or_default())?])
            }
            Self::EnvVar { user_var, pass_var } => {
                let user = env.get(user_var).unwrap_or_default();
                let password = env.get(pass_var).unwrap_or_default();
                Ok(vec![Credential::new(user, password)?])
            }
            Self::Auto => Ok(discover(env)),
        }
    }
}

/// `(value, prefix)` for every variable/suffix match, in environment order.
/// A variable matching several suffixes appears once per suffix.
fn suffixed<'a>(env: &'a Environment, suffixes: &[&str]) -> Vec<(&'a str, &'a str)> {
    env.iter()
        .flat_map(move |(name, value)| {
            suffixes
                .iter()
                .filter_map(move |suffix| name.strip_suffix(*suffix).map(|prefix| (value, prefix)))
        })
        .collect()
}

/// Pair every user-like variable with every pass-like variable sharing its prefix.
fn discover(env: &Environment) -> Vec<Credential> {
    let users = suffixed(env, &USER_SUFFIXES);
    let passes = suffixed(env, &PASS_SUFFIXES);

    let mut found = Vec::new();
    for (user, user_prefix) in &users {
        for (password, pass_prefix) in &passes {
            if user_prefix != pass_prefix {
                continue;
            }
            match Credential::new(user, password) {
                Ok(credential) => found.push(credential),
                Err(e) => debug!("Skipping {}USER-like pair: {}", user_prefix, e),
            }
        }
    }
    found
}
