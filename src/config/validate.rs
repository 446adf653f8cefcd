// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{CommandSpec, ConfigFile, RawConfigFile};
use crate::errors::{GitvisorError, Result};
use crate::types::{Command, CommandPipeline};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = GitvisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_repository(&raw)?;
        let pipeline = build_pipeline(&raw.commands)?;

        let sup = &raw.supervisor;
        let poll_interval = parse_poll_interval(&sup.poll_interval)
            .map_err(|e| GitvisorError::ConfigError(format!("[supervisor].{e}")))?;
        if sup.max_retries == 0 {
            return Err(GitvisorError::ConfigError(
                "[supervisor].max_retries must be >= 1 (got 0)".to_string(),
            ));
        }
        let grace_period = parse_duration_field("grace_period", &sup.grace_period)?;
        let remote_timeout = parse_duration_field("remote_timeout", &sup.remote_timeout)?;

        Ok(ConfigFile {
            repository_url: raw.repository.url.trim().to_string(),
            token: raw.repository.token.filter(|t| !t.is_empty()),
            local_path: raw.repository.path,
            reference: raw.repository.reference,
            pipeline,
            poll_interval,
            max_retries: sup.max_retries,
            grace_period,
            remote_timeout,
            max_consecutive_failures: sup.max_consecutive_failures,
            restart_when_exhausted: sup.restart_when_exhausted,
        })
    }
}

fn validate_repository(cfg: &RawConfigFile) -> Result<()> {
    let url = cfg.repository.url.trim();
    if url.is_empty() {
        return Err(GitvisorError::ConfigError(
            "[repository].url must not be empty".to_string(),
        ));
    }
    if !url.contains("://") {
        return Err(GitvisorError::ConfigError(format!(
            "[repository].url '{url}' must include a scheme (e.g. https://)"
        )));
    }
    if cfg.repository.path.as_os_str().is_empty() {
        return Err(GitvisorError::ConfigError(
            "[repository].path must not be empty".to_string(),
        ));
    }
    if cfg.repository.reference.as_str().trim().is_empty() {
        return Err(GitvisorError::ConfigError(
            "[repository].reference must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn build_pipeline(specs: &[CommandSpec]) -> Result<CommandPipeline> {
    if specs.is_empty() {
        return Err(GitvisorError::ConfigError(
            "config must list at least one command in `commands`".to_string(),
        ));
    }

    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let cmd = match spec {
                CommandSpec::Line(line) => Command::parse(line),
                CommandSpec::Tokens(tokens) => Command::from_tokens(tokens.iter().cloned()),
            };
            cmd.map_err(|_| GitvisorError::ConfigError(format!("commands[{i}] is empty")))
        })
        .collect()
}

/// Longest duration any setting accepts.
pub const MAX_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

fn parse_duration_field(field: &str, value: &str) -> Result<Duration> {
    bounded_duration(field, value)
        .map_err(|e| GitvisorError::ConfigError(format!("[supervisor].{e}")))
}

fn bounded_duration(field: &str, value: &str) -> std::result::Result<Duration, String> {
    let parsed = parse_duration(value).map_err(|e| format!("{field}: {e}"))?;
    if parsed > MAX_DURATION {
        return Err(format!(
            "{field}: '{}' exceeds the maximum of {}h",
            value.trim(),
            MAX_DURATION.as_secs() / 3600
        ));
    }
    Ok(parsed)
}

/// Parse and check a poll interval: non-zero and at most [`MAX_DURATION`].
///
/// Shared by config validation and the `--poll-interval` override.
pub fn parse_poll_interval(value: &str) -> std::result::Result<Duration, String> {
    let interval = bounded_duration("poll_interval", value)?;
    if interval.is_zero() {
        return Err("poll_interval must be greater than zero".to_string());
    }
    Ok(interval)
}

/// Parse `<number><unit>` where unit is `ms`, `s`, `m` or `h`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit (ms, s, m or h)"))?;
    let (digits, unit) = s.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration number '{digits}': {e}"))?;

    let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        other => {
            return Err(format!(
                "unsupported duration unit '{other}'; expected ms, s, m, or h"
            ));
        }
    };

    value
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
