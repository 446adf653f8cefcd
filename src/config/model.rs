// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{CommandPipeline, Reference};

/// Configuration as read from (and written to) the TOML file.
///
/// ```toml
/// commands = ["npm install", ["sh", "-c", "npm run start"]]
///
/// [repository]
/// url = "https://github.com/owner/name"
/// token = "ghp_..."
/// path = "checkout"
/// reference = "HEAD"
///
/// [supervisor]
/// poll_interval = "30s"
/// max_retries = 10
/// ```
///
/// Only `[repository].url`, `[repository].path` and `commands` are required.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfigFile {
    /// Commands to run, in order.
    #[serde(default)]
    pub commands: Vec<CommandSpec>,

    pub repository: RepositorySection,

    #[serde(default)]
    pub supervisor: SupervisorSection,
}

/// A command either as one whitespace-separated line or as explicit tokens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandSpec {
    Line(String),
    Tokens(Vec<String>),
}

/// `[repository]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepositorySection {
    /// Remote URL, e.g. `https://github.com/owner/name`.
    pub url: String,

    /// Access token embedded into the URL for clone / ls-remote.
    ///
    /// The `GITVISOR_TOKEN` environment variable takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Local working copy; relative paths are resolved against the root
    /// directory.
    pub path: PathBuf,

    /// Remote reference to watch.
    #[serde(default)]
    pub reference: Reference,
}

/// `[supervisor]` section. Durations use `<n>ms`, `<n>s`, `<n>m` or `<n>h`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SupervisorSection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Full pipeline passes before the runner stops on its own.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// How long a command may take to exit after SIGTERM before it is killed.
    #[serde(default = "default_grace_period")]
    pub grace_period: String,

    /// Upper bound on one `ls-remote` query.
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout: String,

    /// Consecutive failed remote queries before giving up; `0` never gives up.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Restart instead of idling once the pass budget is used up.
    #[serde(default)]
    pub restart_when_exhausted: bool,
}

fn default_poll_interval() -> String {
    "30s".to_string()
}

fn default_max_retries() -> u32 {
    crate::exec::MAX_RETRIES
}

fn default_grace_period() -> String {
    "5s".to_string()
}

fn default_remote_timeout() -> String {
    "30s".to_string()
}

fn default_max_consecutive_failures() -> u32 {
    crate::watch::DEFAULT_MAX_CONSECUTIVE_FAILURES
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            max_retries: default_max_retries(),
            grace_period: default_grace_period(),
            remote_timeout: default_remote_timeout(),
            max_consecutive_failures: default_max_consecutive_failures(),
            restart_when_exhausted: false,
        }
    }
}

/// Validated configuration.
///
/// Construct via `ConfigFile::try_from(raw)` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub repository_url: String,
    pub token: Option<String>,
    pub local_path: PathBuf,
    pub reference: Reference,
    pub pipeline: CommandPipeline,
    pub poll_interval: Duration,
    pub max_retries: u32,
    pub grace_period: Duration,
    pub remote_timeout: Duration,
    pub max_consecutive_failures: u32,
    pub restart_when_exhausted: bool,
}

impl ConfigFile {
    /// Local path made absolute against `root`.
    pub fn local_path_in(&self, root: &std::path::Path) -> PathBuf {
        if self.local_path.is_absolute() {
            self.local_path.clone()
        } else {
            root.join(&self.local_path)
        }
    }
}
