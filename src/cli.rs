// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `gitvisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gitvisor",
    version,
    about = "Run a command pipeline against a git checkout and restart when the remote changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML), relative to the root directory.
    #[arg(long, value_name = "PATH", default_value = "gitvisor.toml")]
    pub config: String,

    /// Root directory for the config file and a relative checkout path.
    ///
    /// Default: the current working directory at first launch.
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GITVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Override `[supervisor].poll_interval` (e.g. `10s`).
    #[arg(long, value_name = "DURATION")]
    pub poll_interval: Option<String>,

    /// Load and validate the config, print it, and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Fail instead of prompting when the config file is missing.
    #[arg(long)]
    pub no_prompt: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
