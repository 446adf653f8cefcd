// src/engine/supervisor.rs

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{GitvisorError, Result};
use crate::exec::{PipelineRunner, RunReport, RunnerExit, RunnerOptions};
use crate::repo::RepositoryStateProvider;
use crate::signal::CancellationSignal;
use crate::types::{CommandPipeline, Reference};
use crate::watch::{ChangeWatcher, WatchOutcome, WatcherOptions};

use super::{CycleReport, ExitReason, Outcome};

/// Extra time granted on top of the grace period when draining the runner.
const DRAIN_SLACK: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub runner: RunnerOptions,
    pub watcher: WatcherOptions,
    /// When the runner uses up its pass budget without a change, end the
    /// cycle with a restart instead of idling until the watcher fires.
    pub restart_when_exhausted: bool,
}

/// Runs the pipeline and the change watcher concurrently for one cycle.
pub struct Supervisor {
    pipeline: CommandPipeline,
    provider: Arc<dyn RepositoryStateProvider>,
    reference: Reference,
    options: SupervisorOptions,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("pipeline", &self.pipeline)
            .field("reference", &self.reference)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(
        pipeline: CommandPipeline,
        provider: Arc<dyn RepositoryStateProvider>,
        reference: Reference,
        options: SupervisorOptions,
    ) -> Self {
        Self {
            pipeline,
            provider,
            reference,
            options,
        }
    }

    /// One cycle with no external stop source.
    pub async fn supervise_once(&self) -> Result<Outcome> {
        Ok(self.run_cycle(std::future::pending()).await?.outcome)
    }

    /// One cycle that also ends when `shutdown` resolves.
    ///
    /// A shutdown sets the same cancellation signal a detected change does,
    /// so the running command goes through the same graceful termination.
    pub async fn run_cycle<F>(&self, shutdown: F) -> Result<CycleReport>
    where
        F: Future<Output = ()>,
    {
        let signal = CancellationSignal::new();

        let runner_handle = self.spawn_runner(signal.clone());
        let mut watcher_handle = self.spawn_watcher(signal.clone());

        tokio::pin!(shutdown);

        let (joined, interrupted) = tokio::select! {
            res = &mut watcher_handle => (res, false),
            _ = &mut shutdown => {
                info!("shutdown requested; stopping pipeline");
                signal.set();
                ((&mut watcher_handle).await, true)
            }
        };

        let watch = match joined {
            Ok(watch) => watch,
            Err(err) => {
                signal.set();
                self.drain(runner_handle).await;
                return Err(anyhow::Error::from(err).into());
            }
        };

        debug!(?watch, "watcher finished");

        if let WatchOutcome::Unreachable { failures } = watch {
            signal.set();
            self.drain(runner_handle).await;
            return Err(GitvisorError::RemoteUnreachable { failures });
        }

        let outcome = if signal.is_set() {
            if interrupted {
                Outcome::Exit(ExitReason::Interrupted)
            } else {
                Outcome::Restart
            }
        } else {
            warn!("watcher stopped without a stop request");
            signal.set();
            Outcome::Exit(ExitReason::WatcherStopped)
        };

        let runner = self.drain(runner_handle).await;

        // Both readers are gone; nothing can still be stopping because of it.
        signal.clear();

        info!(?outcome, "supervision cycle finished");

        Ok(CycleReport {
            outcome,
            watch,
            runner,
        })
    }

    fn spawn_runner(&self, signal: CancellationSignal) -> JoinHandle<RunReport> {
        let runner = PipelineRunner::new(self.pipeline.clone(), self.options.runner.clone());
        let restart_when_exhausted = self.options.restart_when_exhausted;

        tokio::spawn(async move {
            let report = runner.run(&signal).await;
            if report.exit == RunnerExit::RetriesExhausted {
                if restart_when_exhausted {
                    if signal.set() {
                        info!(passes = report.passes, "pipeline exhausted; requesting restart");
                    }
                } else {
                    info!(
                        passes = report.passes,
                        "pipeline exhausted; idling until the remote changes"
                    );
                }
            }
            report
        })
    }

    fn spawn_watcher(&self, signal: CancellationSignal) -> JoinHandle<WatchOutcome> {
        let mut watcher = ChangeWatcher::new(
            Arc::clone(&self.provider),
            self.reference.clone(),
            self.options.watcher.clone(),
        );

        tokio::spawn(async move { watcher.watch(&signal).await })
    }

    /// Wait for the runner after the signal was set, bounded by the grace
    /// period plus some slack. On timeout the task is aborted, which drops
    /// its child handle and kills the process.
    async fn drain(&self, mut handle: JoinHandle<RunReport>) -> Option<RunReport> {
        let bound = drain_bound(self.options.runner.grace_period);
        match tokio::time::timeout(bound, &mut handle).await {
            Ok(Ok(report)) => {
                debug!(?report, "runner drained");
                Some(report)
            }
            Ok(Err(err)) => {
                warn!(error = %err, "runner task failed");
                None
            }
            Err(_) => {
                warn!(?bound, "runner did not stop in time; aborting");
                handle.abort();
                let _ = handle.await;
                None
            }
        }
    }
}

/// How long to wait for the runner once the signal is set.
fn drain_bound(grace_period: Duration) -> Duration {
    grace_period.saturating_add(DRAIN_SLACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_bound_adds_slack_without_overflowing() {
        assert_eq!(drain_bound(Duration::from_secs(5)), Duration::from_secs(7));
        assert_eq!(drain_bound(Duration::MAX), Duration::MAX);
    }
}
