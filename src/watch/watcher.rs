// src/watch/watcher.rs

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::GitvisorError;
use crate::repo::RepositoryStateProvider;
use crate::signal::CancellationSignal;
use crate::types::{CommitId, Reference};

/// Default interval between two remote queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default upper bound on a single remote query.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of consecutive failed queries tolerated.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;

#[derive(Debug, Clone)]
pub struct WatcherOptions {
    pub poll_interval: Duration,
    pub query_timeout: Duration,
    /// `0` means failures never escalate.
    pub max_consecutive_failures: u32,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

/// How a [`ChangeWatcher::watch`] call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The remote moved away from the baseline; this watcher set the signal.
    ChangeDetected {
        baseline: CommitId,
        current: CommitId,
        tick: u64,
    },
    /// The signal was set by someone else.
    Cancelled,
    /// Too many consecutive failed queries. The signal is left untouched.
    Unreachable { failures: u32 },
}

/// Polls the remote reference and raises the cancellation signal once it
/// diverges from the local commit captured at entry.
pub struct ChangeWatcher {
    provider: Arc<dyn RepositoryStateProvider>,
    reference: Reference,
    options: WatcherOptions,
    baseline: Option<CommitId>,
}

impl std::fmt::Debug for ChangeWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeWatcher")
            .field("reference", &self.reference)
            .field("options", &self.options)
            .field("baseline", &self.baseline)
            .finish_non_exhaustive()
    }
}

impl ChangeWatcher {
    pub fn new(
        provider: Arc<dyn RepositoryStateProvider>,
        reference: Reference,
        options: WatcherOptions,
    ) -> Self {
        Self {
            provider,
            reference,
            options,
            baseline: None,
        }
    }

    /// Local commit this watcher compares against, once captured.
    pub fn baseline(&self) -> Option<&CommitId> {
        self.baseline.as_ref()
    }

    /// Poll until the remote diverges, the signal is set elsewhere, or the
    /// remote stays unreachable for too long.
    ///
    /// The baseline is read from the provider once. If that first read fails
    /// it is retried on later ticks, and those failures count toward the
    /// consecutive failure bound like failed remote queries do.
    pub async fn watch(&mut self, signal: &CancellationSignal) -> WatchOutcome {
        if self.baseline.is_none() {
            self.capture_baseline().await;
        }

        let mut tick: u64 = 0;
        let mut failures: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = signal.cancelled() => {
                    debug!("watcher observed external cancellation");
                    return WatchOutcome::Cancelled;
                }
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }
            if signal.is_set() {
                return WatchOutcome::Cancelled;
            }
            tick += 1;

            let baseline = match &self.baseline {
                Some(b) => b.clone(),
                None => match self.capture_baseline().await {
                    Some(b) => b,
                    None => {
                        failures += 1;
                        if let Some(outcome) = self.check_failure_bound(failures) {
                            return outcome;
                        }
                        continue;
                    }
                },
            };

            let queried = tokio::select! {
                biased;
                _ = signal.cancelled() => {
                    debug!(tick, "watcher cancelled during remote query");
                    return WatchOutcome::Cancelled;
                }
                res = self.query_remote() => res,
            };

            match queried {
                Ok(current) => {
                    failures = 0;
                    info!(
                        event = "poll_tick",
                        tick,
                        remote = %current,
                        baseline = %baseline,
                        "checked remote for updates"
                    );

                    if current != baseline {
                        if !signal.set() {
                            return WatchOutcome::Cancelled;
                        }
                        info!(
                            event = "change_detected",
                            from = %baseline,
                            to = %current,
                            "remote changed; stopping pipeline"
                        );
                        return WatchOutcome::ChangeDetected {
                            baseline,
                            current,
                            tick,
                        };
                    }
                }
                Err(err) => {
                    failures += 1;
                    warn!(
                        event = "remote_query_failed",
                        tick,
                        consecutive_failures = failures,
                        error = %err,
                        "remote query failed; will retry next tick"
                    );
                    if let Some(outcome) = self.check_failure_bound(failures) {
                        return outcome;
                    }
                }
            }
        }
    }

    async fn capture_baseline(&mut self) -> Option<CommitId> {
        match self.provider.local_head().await {
            Ok(head) => {
                info!(baseline = %head, reference = %self.reference, "watching for remote changes");
                self.baseline = Some(head.clone());
                Some(head)
            }
            Err(err) => {
                warn!(error = %err, "could not read local commit; will retry");
                None
            }
        }
    }

    async fn query_remote(&self) -> crate::errors::Result<CommitId> {
        let timeout = self.options.query_timeout;
        match tokio::time::timeout(timeout, self.provider.remote_head(&self.reference)).await {
            Ok(res) => res,
            Err(_) => Err(GitvisorError::RemoteQueryTimeout(timeout)),
        }
    }

    fn check_failure_bound(&self, failures: u32) -> Option<WatchOutcome> {
        let max = self.options.max_consecutive_failures;
        if max > 0 && failures >= max {
            warn!(failures, "remote unreachable; giving up");
            Some(WatchOutcome::Unreachable { failures })
        } else {
            None
        }
    }
}
