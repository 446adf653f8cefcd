// src/logging.rs

//! Logging setup for `gitvisor` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `GITVISOR_LOG` environment variable, any `EnvFilter` directive string
//!    (e.g. "debug" or "gitvisor::watch=trace,info")
//! 3. default to `info`
//!
//! Logs go to STDERR. Supervised commands inherit stdout and write to it
//! directly, so the two streams never interleave mid-line.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV: &str = "GITVISOR_LOG";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    match cli_level {
        Some(lvl) => EnvFilter::new(directive(lvl)),
        None => env
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| EnvFilter::try_new(s).ok())
            .unwrap_or_else(|| EnvFilter::new("info")),
    }
}

fn directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Warn), Some("trace"));
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn env_directive_is_used_without_flag() {
        let filter = build_filter(None, Some("gitvisor::watch=trace"));
        assert_eq!(filter.to_string(), "gitvisor::watch=trace");
    }

    #[test]
    fn invalid_or_missing_env_falls_back_to_info() {
        assert_eq!(build_filter(None, None).to_string(), "info");
        assert_eq!(build_filter(None, Some("  ")).to_string(), "info");
        assert_eq!(build_filter(None, Some("foo=notalevel")).to_string(), "info");
    }
}
