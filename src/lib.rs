// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod repo;
pub mod restart;
pub mod signal;
pub mod types;
pub mod watch;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate, parse_poll_interval, resolve_config_path};
use crate::engine::{Outcome, Supervisor, SupervisorOptions};
use crate::errors::GitvisorError;
use crate::exec::RunnerOptions;
use crate::repo::{GitRepository, RepositoryStateProvider, mask_credentials};
use crate::watch::WatcherOptions;

/// Where the replacement process should start after a detected change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartRequest {
    /// Root directory handed to the new process.
    pub root: PathBuf,
    /// Directory the pipeline ran in; the restart starts from its parent.
    pub execution_dir: PathBuf,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - root directory and config loading (prompting on first run)
/// - clone / pull of the local checkout
/// - one supervision cycle (pipeline runner + change watcher)
/// - Ctrl-C handling
///
/// Returns `Some` when the caller should restart the process.
pub async fn run(args: CliArgs) -> Result<Option<RestartRequest>> {
    let root = restart::resolve_root(args.root.as_deref().map(Path::new))?;
    std::env::set_current_dir(&root)
        .with_context(|| format!("changing into root directory {}", root.display()))?;
    debug!(root = %root.display(), "root directory established");

    let config_path = resolve_config_path(&root, Path::new(&args.config));
    let mut cfg = load_or_prompt(&config_path, args.no_prompt)?;

    if let Some(ref interval) = args.poll_interval {
        cfg.poll_interval = parse_poll_interval(interval)
            .map_err(|e| GitvisorError::ConfigError(format!("--poll-interval: {e}")))?;
    }

    if args.dry_run {
        print_dry_run(&cfg, &root);
        return Ok(None);
    }

    let local_path = cfg.local_path_in(&root);
    let provider: Arc<dyn RepositoryStateProvider> = Arc::new(GitRepository::new(
        cfg.repository_url.clone(),
        cfg.token.clone(),
        local_path.clone(),
    ));

    // Installed before anything is spawned so a SIGTERM cannot take the
    // default action and orphan a child.
    let shutdown = shutdown_signal();

    repo::bootstrap(provider.as_ref()).await;

    let supervisor = Supervisor::new(
        cfg.pipeline.clone(),
        provider,
        cfg.reference.clone(),
        supervisor_options(&cfg, &local_path),
    );

    let report = supervisor.run_cycle(shutdown).await?;

    match report.outcome {
        Outcome::Restart => Ok(Some(RestartRequest {
            root,
            execution_dir: local_path,
        })),
        Outcome::Exit(reason) => {
            info!(?reason, "supervisor exiting without restart");
            Ok(None)
        }
    }
}

/// Future that resolves on the first operator stop request: Ctrl-C, or
/// SIGTERM on Unix.
///
/// Handlers are registered when this is called, not when it is first polled.
/// A source that cannot be registered is logged and never fires.
#[cfg(unix)]
pub fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = signal(SignalKind::terminate())
        .map_err(|e| warn!(error = %e, "failed to install SIGTERM handler"))
        .ok();
    let mut int = signal(SignalKind::interrupt())
        .map_err(|e| warn!(error = %e, "failed to install SIGINT handler"))
        .ok();

    async move {
        tokio::select! {
            Some(()) = recv_or_pending(term.as_mut()) => info!("SIGTERM received"),
            Some(()) = recv_or_pending(int.as_mut()) => info!("interrupt received"),
            else => std::future::pending::<()>().await,
        }
    }
}

#[cfg(unix)]
async fn recv_or_pending(stream: Option<&mut tokio::signal::unix::Signal>) -> Option<()> {
    match stream {
        Some(stream) => stream.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(not(unix))]
pub fn shutdown_signal() -> impl Future<Output = ()> + Send + 'static {
    async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupt received"),
            Err(e) => {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Build runner / watcher options from a validated config.
pub fn supervisor_options(cfg: &ConfigFile, working_dir: &Path) -> SupervisorOptions {
    SupervisorOptions {
        runner: RunnerOptions {
            working_dir: working_dir.to_path_buf(),
            max_retries: cfg.max_retries,
            grace_period: cfg.grace_period,
        },
        watcher: WatcherOptions {
            poll_interval: cfg.poll_interval,
            query_timeout: cfg.remote_timeout,
            max_consecutive_failures: cfg.max_consecutive_failures,
        },
        restart_when_exhausted: cfg.restart_when_exhausted,
    }
}

fn load_or_prompt(path: &Path, no_prompt: bool) -> Result<ConfigFile> {
    if path.exists() {
        info!(path = %path.display(), "configuration loaded from file");
        return Ok(load_and_validate(path)?);
    }

    if no_prompt {
        return Err(GitvisorError::ConfigError(format!(
            "config file {} not found",
            path.display()
        ))
        .into());
    }

    info!(path = %path.display(), "no configuration found; starting interactive setup");
    let raw = {
        let stdin = std::io::stdin();
        config::prompt::collect(stdin.lock(), std::io::stderr())?
    };
    config::save(path, &raw)?;
    Ok(load_and_validate(path)?)
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &ConfigFile, root: &Path) {
    println!("gitvisor dry-run");
    println!("  root = {}", root.display());
    println!("  repository.url = {}", mask_credentials(&cfg.repository_url));
    println!(
        "  repository.token = {}",
        if cfg.token.is_some() { "***" } else { "(none)" }
    );
    println!("  repository.path = {}", cfg.local_path_in(root).display());
    println!("  repository.reference = {}", cfg.reference);
    println!("  supervisor.poll_interval = {:?}", cfg.poll_interval);
    println!("  supervisor.max_retries = {}", cfg.max_retries);
    println!("  supervisor.grace_period = {:?}", cfg.grace_period);
    println!("  supervisor.remote_timeout = {:?}", cfg.remote_timeout);
    println!(
        "  supervisor.max_consecutive_failures = {}",
        cfg.max_consecutive_failures
    );
    println!(
        "  supervisor.restart_when_exhausted = {}",
        cfg.restart_when_exhausted
    );
    println!();

    println!("commands ({}):", cfg.pipeline.len());
    for (i, cmd) in cfg.pipeline.commands().iter().enumerate() {
        println!("  {i}: {cmd}");
    }

    debug!("dry-run complete (no execution)");
}
