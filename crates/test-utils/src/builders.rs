#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use gitvisor::config::{
    CommandSpec, ConfigFile, RawConfigFile, RepositorySection, SupervisorSection,
};
use gitvisor::engine::SupervisorOptions;
use gitvisor::exec::RunnerOptions;
use gitvisor::types::{Command, CommandPipeline, Reference};
use gitvisor::watch::WatcherOptions;

/// Builder for `RawConfigFile` / `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                commands: Vec::new(),
                repository: RepositorySection {
                    url: "https://example.com/owner/repo".to_string(),
                    token: None,
                    path: PathBuf::from("checkout"),
                    reference: Reference::default(),
                },
                supervisor: SupervisorSection::default(),
            },
        }
    }

    pub fn url(mut self, url: &str) -> Self {
        self.config.repository.url = url.to_string();
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.config.repository.token = Some(token.to_string());
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.config.repository.path = PathBuf::from(path);
        self
    }

    pub fn reference(mut self, reference: &str) -> Self {
        self.config.repository.reference = Reference::new(reference);
        self
    }

    pub fn command(mut self, line: &str) -> Self {
        self.config.commands.push(CommandSpec::Line(line.to_string()));
        self
    }

    pub fn command_tokens(mut self, tokens: &[&str]) -> Self {
        self.config
            .commands
            .push(CommandSpec::Tokens(tokens.iter().map(|t| t.to_string()).collect()));
        self
    }

    pub fn poll_interval(mut self, value: &str) -> Self {
        self.config.supervisor.poll_interval = value.to_string();
        self
    }

    pub fn max_retries(mut self, value: u32) -> Self {
        self.config.supervisor.max_retries = value;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `sh -c <script>` as a pipeline command.
pub fn sh(script: &str) -> Command {
    Command::from_tokens(["sh", "-c", script]).expect("non-empty command")
}

/// Pipeline of `sh -c` scripts.
pub fn sh_pipeline(scripts: &[&str]) -> CommandPipeline {
    scripts.iter().map(|s| sh(s)).collect()
}

/// Runner options with test-friendly timings.
pub fn runner_options(dir: &Path) -> RunnerOptions {
    RunnerOptions {
        working_dir: dir.to_path_buf(),
        max_retries: 10,
        grace_period: Duration::from_secs(2),
    }
}

/// Watcher options with a short poll interval.
pub fn watcher_options(poll: Duration) -> WatcherOptions {
    WatcherOptions {
        poll_interval: poll,
        query_timeout: Duration::from_secs(1),
        max_consecutive_failures: 5,
    }
}

pub fn supervisor_options(dir: &Path, poll: Duration) -> SupervisorOptions {
    SupervisorOptions {
        runner: runner_options(dir),
        watcher: watcher_options(poll),
        restart_when_exhausted: false,
    }
}

/// Read the lines a test pipeline appended to `file`.
pub fn read_lines(file: &Path) -> Vec<String> {
    std::fs::read_to_string(file)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}
