// tests/git_repository.rs
#![cfg(unix)]

mod common;
use crate::common::init_tracing;
use crate::common::scripted_repo::ScriptedRepository;

use std::error::Error;
use std::path::Path;
use std::process::Command as StdCommand;

use gitvisor::repo::{bootstrap, GitRepository, RepositoryStateProvider};
use gitvisor::types::Reference;

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

fn commit(dir: &Path, message: &str) {
    git(dir, &["commit", "--allow-empty", "-q", "-m", message]);
}

fn origin(root: &Path) -> std::path::PathBuf {
    let origin = root.join("origin");
    std::fs::create_dir_all(&origin).expect("origin dir");
    git(&origin, &["init", "-q"]);
    commit(&origin, "initial");
    origin
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[tokio::test]
async fn clone_then_track_remote_head() -> TestResult {
    init_tracing();
    if !git_available() {
        eprintln!("git not installed; skipping");
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let origin = origin(dir.path());
    let checkout = dir.path().join("checkout");
    let repo = GitRepository::new(file_url(&origin), None, &checkout);

    assert!(repo.ensure_cloned().await?, "first call clones");
    assert!(!repo.ensure_cloned().await?, "second call finds the checkout");

    let head = Reference::default();
    let local = repo.local_head().await?;
    assert_eq!(repo.remote_head(&head).await?, local);

    commit(&origin, "second");
    let remote = repo.remote_head(&head).await?;
    assert_ne!(remote, local, "remote moved ahead");
    assert_eq!(repo.local_head().await?, local, "local copy is untouched");

    repo.pull().await?;
    assert_eq!(repo.local_head().await?, remote);
    Ok(())
}

#[tokio::test]
async fn missing_reference_is_an_error() -> TestResult {
    init_tracing();
    if !git_available() {
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let origin = origin(dir.path());
    let repo = GitRepository::new(file_url(&origin), None, dir.path().join("checkout"));

    let err = repo
        .remote_head(&Reference::new("refs/heads/does-not-exist"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ls-remote"), "{err}");
    Ok(())
}

#[tokio::test]
async fn unreachable_remote_fails_without_prompting() -> TestResult {
    init_tracing();
    if !git_available() {
        return Ok(());
    }

    let dir = tempfile::tempdir()?;
    let repo = GitRepository::new(
        file_url(&dir.path().join("nowhere")),
        Some("secret-token".to_string()),
        dir.path().join("checkout"),
    );

    let err = repo.remote_head(&Reference::default()).await.unwrap_err();
    assert!(!err.to_string().contains("secret-token"));
    Ok(())
}

#[tokio::test]
async fn bootstrap_pulls_existing_checkout() -> TestResult {
    init_tracing();

    let existing = ScriptedRepository::stable("abc123");
    bootstrap(&existing).await;
    assert_eq!(existing.clone_calls(), 1);
    assert_eq!(existing.pull_calls(), 1);

    let fresh = ScriptedRepository::stable("abc123").needs_clone();
    bootstrap(&fresh).await;
    assert_eq!(fresh.clone_calls(), 1);
    assert_eq!(fresh.pull_calls(), 0, "a fresh clone is not pulled");
    Ok(())
}
