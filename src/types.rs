// src/types.rs

//! Small value types shared by the runner, the watcher and the supervisor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{GitvisorError, Result};

/// Opaque identifier of a repository snapshot.
///
/// Only equality is meaningful; the contents are never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommitId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Remote reference to watch (`HEAD`, `main`, `refs/heads/release`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Reference {
    fn default() -> Self {
        Self::new("HEAD")
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One executable invocation: program followed by its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    tokens: Vec<String>,
}

impl Command {
    /// Build a command from an explicit token list.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() || tokens[0].trim().is_empty() {
            return Err(GitvisorError::EmptyCommand);
        }
        Ok(Self { tokens })
    }

    /// Build a command from a command line split on whitespace.
    ///
    /// There is no shell quoting; use [`Command::from_tokens`] (or a TOML
    /// array in the config) when an argument contains spaces.
    pub fn parse(line: &str) -> Result<Self> {
        Self::from_tokens(line.split_whitespace())
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/// Ordered list of commands; order is execution order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandPipeline {
    commands: Vec<Command>,
}

impl CommandPipeline {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl FromIterator<Command> for CommandPipeline {
    fn from_iter<T: IntoIterator<Item = Command>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_whitespace() {
        let cmd = Command::parse("  npm   run start ").unwrap();
        assert_eq!(cmd.program(), "npm");
        assert_eq!(cmd.args(), ["run".to_string(), "start".to_string()]);
        assert_eq!(cmd.to_string(), "npm run start");
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(Command::parse("   "), Err(GitvisorError::EmptyCommand)));
        assert!(matches!(
            Command::from_tokens(Vec::<String>::new()),
            Err(GitvisorError::EmptyCommand)
        ));
    }

    #[test]
    fn explicit_tokens_keep_spaces() {
        let cmd = Command::from_tokens(["sh", "-c", "echo one two"]).unwrap();
        assert_eq!(cmd.args().len(), 2);
        assert_eq!(cmd.args()[1], "echo one two");
    }

    #[test]
    fn commit_ids_compare_by_value_only() {
        assert_eq!(CommitId::from("abc123"), CommitId::new("abc123".to_string()));
        assert_ne!(CommitId::from("abc123"), CommitId::from("def456"));
    }
}
