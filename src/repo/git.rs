// src/repo/git.rs

//! `git` CLI backed repository provider.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{GitvisorError, Result};
use crate::repo::mask::mask_credentials;
use crate::repo::{ProviderFuture, RepositoryStateProvider};
use crate::types::{CommitId, Reference};

/// A remote repository and its local working copy.
#[derive(Clone)]
pub struct GitRepository {
    url: String,
    token: Option<String>,
    path: PathBuf,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("path", &self.path)
            .finish()
    }
}

impl GitRepository {
    pub fn new(url: impl Into<String>, token: Option<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            token: token.filter(|t| !t.is_empty()),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remote URL with the access token embedded as user-info, when one is
    /// configured. Never log the result unmasked.
    pub fn authenticated_url(&self) -> String {
        match (&self.token, self.url.split_once("://")) {
            (Some(token), Some((scheme, rest))) => format!("{scheme}://{token}@{rest}"),
            _ => self.url.clone(),
        }
    }

    async fn git(&self, operation: &str, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        let mut cmd = Command::new("git");
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(operation, "running git");

        let output = cmd
            .output()
            .await
            .map_err(|e| GitvisorError::git(operation, format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitvisorError::git(
                operation,
                format!(
                    "exit code {:?}: {}",
                    output.status.code(),
                    mask_credentials(stderr.trim())
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// First column of the first line of `git ls-remote` output.
pub fn parse_ls_remote(output: &str) -> Option<CommitId> {
    output
        .lines()
        .find_map(|line| line.split_whitespace().next())
        .map(CommitId::new)
}

impl RepositoryStateProvider for GitRepository {
    fn local_head(&self) -> ProviderFuture<'_, CommitId> {
        Box::pin(async move {
            let sha = self
                .git("rev-parse", &["rev-parse", "HEAD"], Some(self.path.as_path()))
                .await?;
            if sha.is_empty() {
                return Err(GitvisorError::git("rev-parse", "empty output"));
            }
            Ok(CommitId::new(sha))
        })
    }

    fn remote_head<'a>(&'a self, reference: &'a Reference) -> ProviderFuture<'a, CommitId> {
        Box::pin(async move {
            let url = self.authenticated_url();
            let out = self
                .git("ls-remote", &["ls-remote", &url, reference.as_str()], None)
                .await?;
            parse_ls_remote(&out).ok_or_else(|| {
                GitvisorError::git(
                    "ls-remote",
                    format!("reference '{reference}' not found on remote"),
                )
            })
        })
    }

    fn ensure_cloned(&self) -> ProviderFuture<'_, bool> {
        Box::pin(async move {
            if self.path.exists() {
                return Ok(false);
            }
            info!(
                url = %mask_credentials(&self.authenticated_url()),
                path = %self.path.display(),
                "cloning repository"
            );
            let url = self.authenticated_url();
            let path = self.path.to_string_lossy();
            self.git("clone", &["clone", &url, &path], None).await?;
            Ok(true)
        })
    }

    fn pull(&self) -> ProviderFuture<'_, ()> {
        Box::pin(async move {
            info!(path = %self.path.display(), "pulling repository");
            let path = self.path.to_string_lossy();
            self.git("pull", &["-C", &path, "pull"], None).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_embedded_as_user_info() {
        let repo = GitRepository::new(
            "https://github.com/owner/name",
            Some("tok".to_string()),
            "checkout",
        );
        assert_eq!(repo.authenticated_url(), "https://tok@github.com/owner/name");
    }

    #[test]
    fn no_token_leaves_url_untouched() {
        let repo = GitRepository::new("https://github.com/owner/name", None, "checkout");
        assert_eq!(repo.authenticated_url(), "https://github.com/owner/name");

        let empty = GitRepository::new("https://github.com/o/n", Some(String::new()), "c");
        assert_eq!(empty.authenticated_url(), "https://github.com/o/n");
    }

    #[test]
    fn debug_output_hides_token() {
        let repo = GitRepository::new("https://h/o/n", Some("secret".to_string()), "c");
        let dbg = format!("{repo:?}");
        assert!(!dbg.contains("secret"));
    }

    #[test]
    fn parse_ls_remote_takes_first_sha() {
        let out = "3f2a9c\tHEAD\n77bb01\trefs/heads/main\n";
        assert_eq!(parse_ls_remote(out), Some(CommitId::from("3f2a9c")));
        assert_eq!(parse_ls_remote(""), None);
        assert_eq!(parse_ls_remote("\n\n"), None);
    }
}
