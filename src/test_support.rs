//! In-memory stand-ins for the process, git, keyring and HTTP seams

use crate::bitbucket::{HttpReply, InsightsClient, UploadError};
use crate::credentials::{Credential, CredentialError, SecretStore};
use crate::git::GitSource;
use crate::linter::{ExternalToolResult, ToolRunner};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

pub const RUFF_CHECK_OUTPUT: &str = "\
src/some_repo/filter/fltr.py:337:21: G004 Logging statement uses f-string
src/some_repo/filter/wrk.py:24:66: Q000 [*] Single quotes found but double quotes preferred
[..]
Found 1592 errors.
[*] 993 fixable with the `--fix` option (218 hidden fixes can be enabled with the `--unsafe-fixes` option).
";

pub const RUFF_FORMAT_OUTPUT: &str = "\
Would reformat: src/some_repo/filter/fltr.py
Would reformat: src/some_repo/filter/wrk.py
37 files would be reformatted, 9 files left unchanged
";

/// Answers `ruff check` / `ruff format` with canned output
pub struct FakeRunner {
    installed: bool,
    check: String,
    format: String,
    calls: RefCell<Vec<String>>,
}

impl FakeRunner {
    pub fn with_output(check: &str, format: &str) -> Self {
        Self {
            installed: true,
            check: check.to_string(),
            format: format.to_string(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Two mistakes and two files to reformat
    pub fn ruff() -> Self {
        Self::with_output(RUFF_CHECK_OUTPUT, RUFF_FORMAT_OUTPUT)
    }

    pub fn without_ruff() -> Self {
        Self {
            installed: false,
            ..Self::with_output("", "")
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ToolRunner for FakeRunner {
    fn is_installed(&self, tool: &str) -> bool {
        self.installed && tool == "ruff"
    }

    fn run(&self, cmd: &[&str]) -> ExternalToolResult {
        let joined = cmd.join(" ");
        self.calls.borrow_mut().push(joined.clone());
        match joined.as_str() {
            "ruff check --no-fix ." => ExternalToolResult::completed(self.check.clone(), ""),
            "ruff format --check ." => ExternalToolResult::completed(self.format.clone(), ""),
            other => panic!("Unknown call to: {other}"),
        }
    }
}

pub struct FakeGit {
    url: String,
    commit: String,
}

impl FakeGit {
    pub fn new(url: &str, commit: &str) -> Self {
        Self {
            url: url.to_string(),
            commit: commit.to_string(),
        }
    }

    pub fn bitbucket() -> Self {
        Self::new("https://localhost:12345/scm/abc/repository.git\n\n", "abcde_commit_hash_fghij\n\n")
    }
}

impl GitSource for FakeGit {
    fn head_commit(&self) -> anyhow::Result<String> {
        Ok(self.commit.trim().to_string())
    }

    fn remote_url(&self) -> anyhow::Result<String> {
        Ok(self.url.trim().to_string())
    }
}

/// Keyring holding one password for every `(service, user)`
pub struct FakeStore {
    password: Option<String>,
    lookups: RefCell<Vec<(String, String)>>,
}

impl FakeStore {
    pub fn new(password: &str) -> Self {
        Self {
            password: Some(password.to_string()),
            lookups: RefCell::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self {
            password: None,
            lookups: RefCell::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<(String, String)> {
        self.lookups.borrow().clone()
    }
}

impl SecretStore for FakeStore {
    fn get_password(&self, service: &str, username: &str) -> Result<Option<String>, CredentialError> {
        self.lookups
            .borrow_mut()
            .push((service.to_string(), username.to_string()));
        Ok(self.password.clone())
    }
}

/// Behaves like a build without keyring support
pub struct MissingStore;

impl SecretStore for MissingStore {
    fn get_password(&self, _service: &str, _username: &str) -> Result<Option<String>, CredentialError> {
        Err(CredentialError::SecretStoreUnavailable)
    }
}

/// A recorded PUT
#[derive(Debug, Clone)]
pub struct Put {
    pub url: String,
    pub body: JsonValue,
    pub username: String,
    pub password: String,
}

/// Replies with queued statuses; the last one repeats once the queue runs dry.
pub struct FakeClient {
    replies: Vec<HttpReply>,
    reachable: bool,
    puts: RefCell<Vec<Put>>,
}

impl FakeClient {
    pub fn with_statuses(statuses: &[u16]) -> Self {
        Self {
            replies: statuses.iter().map(|s| HttpReply::new(*s, "")).collect(),
            reachable: true,
            puts: RefCell::new(Vec::new()),
        }
    }

    pub fn with_reply(status: u16, body: &str) -> Self {
        Self {
            replies: vec![HttpReply::new(status, body)],
            reachable: true,
            puts: RefCell::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::with_statuses(&[])
        }
    }

    pub fn puts(&self) -> Vec<Put> {
        self.puts.borrow().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.puts().into_iter().map(|p| p.url).collect()
    }

    pub fn users(&self) -> Vec<String> {
        self.puts().into_iter().map(|p| p.username).collect()
    }
}

impl InsightsClient for FakeClient {
    fn put_json(&self, url: &str, body: &JsonValue, credential: &Credential) -> Result<HttpReply, UploadError> {
        let mut puts = self.puts.borrow_mut();
        puts.push(Put {
            url: url.to_string(),
            body: body.clone(),
            username: credential.username().to_string(),
            password: credential.password().to_string(),
        });

        if !self.reachable {
            return Err(UploadError::Transport {
                url: url.to_string(),
                message: "Connection refused".to_string(),
            });
        }

        let idx = (puts.len() - 1).min(self.replies.len().saturating_sub(1));
        Ok(self.replies.get(idx).cloned().unwrap_or_else(|| HttpReply::new(200, "")))
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a subscriber that records every event, and return the log text
pub fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
