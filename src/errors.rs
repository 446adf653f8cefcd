// src/errors.rs

//! Crate-wide error type and result alias.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitvisorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("git {operation} failed: {message}")]
    Git { operation: String, message: String },

    #[error("remote query timed out after {0:?}")]
    RemoteQueryTimeout(Duration),

    #[error("remote unreachable after {failures} consecutive failed queries")]
    RemoteUnreachable { failures: u32 },

    #[error("command is empty")]
    EmptyCommand,

    #[error("failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("restart failed: {0}")]
    RestartFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GitvisorError {
    pub(crate) fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        GitvisorError::Git {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GitvisorError>;
