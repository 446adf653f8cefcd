// tests/process_signals.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, process_alive, wait_for_pid, with_timeout};

use std::error::Error;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use gitvisor::config::TOKEN_ENV;
use gitvisor::restart::{RESTART_COUNT_ENV, RESTART_ROOT_ENV};

type TestResult = Result<(), Box<dyn Error>>;

fn git_available() -> bool {
    StdCommand::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args(["-c", "user.name=gitvisor", "-c", "user.email=gitvisor@example.com"])
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git runs");
    assert!(status.success(), "git {args:?} failed");
}

/// Root directory with an origin repository and a config whose single
/// command records its pid in `<root>/child.pid` and then sleeps.
fn supervised_root(root: &Path) {
    let origin = root.join("origin");
    std::fs::create_dir_all(&origin).expect("origin dir");
    git(&origin, &["init", "-q"]);
    git(&origin, &["commit", "--allow-empty", "-q", "-m", "initial"]);

    let config = format!(
        r#"commands = [["sh", "-c", "echo $$ > ../child.pid; exec sleep 300"]]

[repository]
url = "file://{}"
path = "checkout"

[supervisor]
poll_interval = "60s"
grace_period = "2s"
"#,
        origin.display()
    );
    std::fs::write(root.join("gitvisor.toml"), config).expect("config written");
}

async fn stop_supervisor_with(signal: Signal) -> TestResult {
    init_tracing();
    if !git_available() {
        eprintln!("git not installed; skipping");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    supervised_root(&root);

    let mut supervisor = tokio::process::Command::new(env!("CARGO_BIN_EXE_gitvisor"))
        .arg("--root")
        .arg(&root)
        .arg("--no-prompt")
        .env_remove(RESTART_ROOT_ENV)
        .env_remove(RESTART_COUNT_ENV)
        .env_remove(TOKEN_ENV)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;
    let supervisor_pid = supervisor.id().expect("supervisor running");

    let child_pid = wait_for_pid(&root.join("child.pid")).await;
    assert!(process_alive(child_pid));

    kill(Pid::from_raw(supervisor_pid as i32), signal)?;
    let status = with_timeout(supervisor.wait()).await?;

    assert!(status.success(), "supervisor exited with {status:?}");
    assert!(
        !process_alive(child_pid),
        "child {child_pid} outlived the supervisor after {signal:?}"
    );
    Ok(())
}

#[tokio::test]
async fn sigterm_stops_the_running_command_before_exiting() -> TestResult {
    stop_supervisor_with(Signal::SIGTERM).await
}

#[tokio::test]
async fn sigint_stops_the_running_command_before_exiting() -> TestResult {
    stop_supervisor_with(Signal::SIGINT).await
}
