// src/engine/mod.rs

//! Supervision engine.
//!
//! One supervision cycle runs the [`PipelineRunner`](crate::exec::PipelineRunner)
//! and the [`ChangeWatcher`](crate::watch::ChangeWatcher) side by side, joined
//! only by a fresh [`CancellationSignal`](crate::signal::CancellationSignal).
//! The cycle ends when the watcher ends; the runner is then drained and the
//! cycle reports an [`Outcome`]. Replacing the process image on
//! [`Outcome::Restart`] is the caller's job (see [`crate::restart`]).

use crate::exec::RunReport;
use crate::watch::WatchOutcome;

pub mod supervisor;

pub use supervisor::{Supervisor, SupervisorOptions};

/// What the caller should do after a supervision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A change was detected (or a restart was requested); re-exec the process.
    Restart,
    /// Stop without restarting.
    Exit(ExitReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Operator interrupt (Ctrl-C) routed through the cancellation signal.
    Interrupted,
    /// The watcher stopped without any stop request. Not expected in practice.
    WatcherStopped,
}

/// Everything observed during one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub outcome: Outcome,
    pub watch: WatchOutcome,
    /// `None` if the runner had to be aborted while draining.
    pub runner: Option<RunReport>,
}
