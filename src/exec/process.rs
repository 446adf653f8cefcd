// src/exec/process.rs

//! A single supervised child process.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command as TokioCommand};
use tracing::{debug, warn};

use crate::errors::{GitvisorError, Result};
use crate::types::Command;

/// Handle to one running external command.
///
/// The child inherits the supervisor's standard streams so its output goes
/// straight to the operator. `kill_on_drop` is set as a last resort; callers
/// are expected to either [`wait`](Self::wait) or
/// [`terminate`](Self::terminate) every handle they create.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    display: String,
}

impl ChildProcess {
    /// Spawn `command` with `cwd` as its working directory.
    pub fn spawn(command: &Command, cwd: &Path) -> Result<Self> {
        let command_display = command.to_string();

        let child = TokioCommand::new(command.program())
            .args(command.args())
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GitvisorError::SpawnFailed {
                command: command_display.clone(),
                source,
            })?;

        debug!(command = %command_display, pid = ?child.id(), "child spawned");

        Ok(Self {
            child,
            display: command_display,
        })
    }

    /// OS process id, or `None` once the child has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the child to exit on its own.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        Ok(self.child.wait().await?)
    }

    /// Ask the child to stop, escalating to a forced kill after `grace`.
    ///
    /// Always waits for the exit so the process is reaped before returning.
    pub async fn terminate(&mut self, grace: Duration) -> Result<ExitStatus> {
        if let Some(status) = self.child.try_wait()? {
            return Ok(status);
        }

        if let Err(e) = request_stop(&mut self.child) {
            debug!(command = %self.display, error = %e, "graceful stop request failed");
        }

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!(
                    command = %self.display,
                    ?grace,
                    "child ignored termination request; killing"
                );
                self.child.kill().await?;
                Ok(self.child.wait().await?)
            }
        }
    }
}

/// Send SIGTERM.
#[cfg(unix)]
fn request_stop(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    match child.id() {
        Some(pid) => kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(std::io::Error::from),
        None => Ok(()),
    }
}

/// No portable graceful stop outside Unix; fall back to killing.
#[cfg(not(unix))]
fn request_stop(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Instant;

    use super::*;

    fn sh(script: &str) -> Command {
        Command::from_tokens(["sh", "-c", script]).unwrap()
    }

    #[tokio::test]
    async fn wait_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let mut child = ChildProcess::spawn(&sh("exit 3"), dir.path()).unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(status.code(), Some(3));
    }

    #[tokio::test]
    async fn runs_in_given_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut child = ChildProcess::spawn(&sh("touch marker"), dir.path()).unwrap();
        assert!(child.wait().await.unwrap().success());
        assert!(dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn terminate_stops_cooperative_child_quickly() {
        let dir = tempfile::tempdir().unwrap();
        let mut child = ChildProcess::spawn(
            &Command::parse("sleep 30").unwrap(),
            dir.path(),
        )
        .unwrap();

        let started = Instant::now();
        let status = child.terminate(Duration::from_secs(5)).await.unwrap();
        assert!(!status.success());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn terminate_escalates_when_term_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut child = ChildProcess::spawn(
            &sh("trap '' TERM; while true; do sleep 0.1; done"),
            dir.path(),
        )
        .unwrap();
        // Let the shell install its trap.
        tokio::time::sleep(Duration::from_millis(200)).await;

        let started = Instant::now();
        let status = child.terminate(Duration::from_millis(300)).await.unwrap();
        assert!(!status.success());
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ChildProcess::spawn(
            &Command::parse("definitely-not-a-real-binary-xyz").unwrap(),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, GitvisorError::SpawnFailed { .. }));
    }
}
