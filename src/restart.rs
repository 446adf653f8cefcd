// src/restart.rs

//! Full-process restart.
//!
//! After a change is detected the supervisor replaces its own process image
//! with a fresh invocation of the same executable and arguments. The new
//! process starts one directory above the execution directory (the local
//! repository) and finds its root again through [`RESTART_ROOT_ENV`], so the
//! restart does not depend on where the old process happened to be.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::errors::{GitvisorError, Result};

/// Root directory handed from a restarting process to its replacement.
pub const RESTART_ROOT_ENV: &str = "GITVISOR_RESTART_ROOT";

/// Number of restarts so far in this chain of processes.
pub const RESTART_COUNT_ENV: &str = "GITVISOR_RESTART_COUNT";

/// Executable identity captured at startup, before any directory changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPlan {
    exe: PathBuf,
    args: Vec<OsString>,
    restart_count: u32,
}

impl RestartPlan {
    /// Capture the running executable, its arguments and the restart count.
    pub fn capture() -> Result<Self> {
        let exe = env::current_exe()
            .and_then(|p| p.canonicalize())
            .map_err(|e| GitvisorError::RestartFailed(format!("cannot locate own executable: {e}")))?;
        let args = env::args_os().skip(1).collect();
        let restart_count = env::var(RESTART_COUNT_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        Ok(Self::from_parts(exe, args, restart_count))
    }

    pub fn from_parts(exe: impl Into<PathBuf>, args: Vec<OsString>, restart_count: u32) -> Self {
        Self {
            exe: exe.into(),
            args,
            restart_count,
        }
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    pub fn restart_count(&self) -> u32 {
        self.restart_count
    }

    /// Directory the replacement process starts in: the parent of
    /// `execution_dir`, or `execution_dir` itself when it has no parent.
    pub fn restart_dir(execution_dir: &Path) -> PathBuf {
        match execution_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => execution_dir.to_path_buf(),
        }
    }

    /// Build the replacement invocation without running it.
    pub fn command(&self, execution_dir: &Path, root: &Path) -> Command {
        let mut cmd = Command::new(&self.exe);
        cmd.args(&self.args)
            .current_dir(Self::restart_dir(execution_dir))
            .env(RESTART_ROOT_ENV, root)
            .env(RESTART_COUNT_ENV, (self.restart_count + 1).to_string());
        cmd
    }

    /// Replace the current process with a fresh invocation.
    ///
    /// Only returns if the replacement could not be started.
    pub fn exec(&self, execution_dir: &Path, root: &Path) -> GitvisorError {
        let mut cmd = self.command(execution_dir, root);
        info!(
            event = "restart",
            exe = %self.exe.display(),
            cwd = %Self::restart_dir(execution_dir).display(),
            restart = self.restart_count + 1,
            "restarting supervisor"
        );
        replace_process(&mut cmd, &self.exe)
    }
}

#[cfg(unix)]
fn replace_process(cmd: &mut Command, exe: &Path) -> GitvisorError {
    use std::os::unix::process::CommandExt;

    let err = cmd.exec();
    GitvisorError::RestartFailed(format!("exec of {} failed: {err}", exe.display()))
}

/// Without `exec`, run the replacement as a child and mirror its exit code.
#[cfg(not(unix))]
fn replace_process(cmd: &mut Command, exe: &Path) -> GitvisorError {
    match cmd.status() {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(err) => {
            GitvisorError::RestartFailed(format!("spawn of {} failed: {err}", exe.display()))
        }
    }
}

/// Pick the root directory for this process.
///
/// A root handed over by a restart wins, then the `--root` flag, then the
/// current directory. The result is absolute.
pub fn resolve_root(cli_root: Option<&Path>) -> Result<PathBuf> {
    let handed_over = env::var_os(RESTART_ROOT_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    let root = match (handed_over, cli_root) {
        (Some(root), _) => root,
        (None, Some(cli)) => cli.to_path_buf(),
        (None, None) => env::current_dir()?,
    };

    root.canonicalize().map_err(|e| {
        GitvisorError::ConfigError(format!("root directory {} is not usable: {e}", root.display()))
    })
}
