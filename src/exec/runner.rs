// src/exec/runner.rs

//! Sequential command pipeline runner.
//!
//! Commands run one at a time in configuration order. A command that exits
//! non-zero (or fails to spawn) does **not** stop the pipeline: the runner
//! logs it and moves on to the next command. Only two things end a run:
//!
//! - the shared [`CancellationSignal`] being set, which terminates the current
//!   child and returns immediately, and
//! - the pass budget running out (`max_retries` full passes).
//!
//! Every child spawned by a run is waited for or terminated before the run
//! returns.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::exec::process::ChildProcess;
use crate::signal::CancellationSignal;
use crate::types::CommandPipeline;

/// Number of full pipeline passes before the runner gives up.
pub const MAX_RETRIES: u32 = 10;

/// Time a child gets to exit after a termination request before it is killed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerExit {
    /// The cancellation signal was observed.
    Cancelled,
    /// All passes completed without cancellation.
    RetriesExhausted,
}

/// Summary of one [`PipelineRunner::run`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub exit: RunnerExit,
    /// Fully completed passes.
    pub passes: u32,
    /// Commands spawned across all passes, including the interrupted one.
    pub commands_started: u64,
    /// Commands that exited non-zero or failed to spawn.
    pub commands_failed: u64,
}

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Working directory for every command (the local repository path).
    pub working_dir: PathBuf,
    pub max_retries: u32,
    pub grace_period: Duration,
}

impl RunnerOptions {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            max_retries: MAX_RETRIES,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineRunner {
    pipeline: CommandPipeline,
    options: RunnerOptions,
}

impl PipelineRunner {
    pub fn new(pipeline: CommandPipeline, options: RunnerOptions) -> Self {
        Self { pipeline, options }
    }

    pub fn pipeline(&self) -> &CommandPipeline {
        &self.pipeline
    }

    /// Execute the pipeline until cancelled or out of passes.
    pub async fn run(&self, signal: &CancellationSignal) -> RunReport {
        let mut report = RunReport {
            exit: RunnerExit::RetriesExhausted,
            passes: 0,
            commands_started: 0,
            commands_failed: 0,
        };

        while report.passes < self.options.max_retries {
            let pass = report.passes + 1;

            for (index, command) in self.pipeline.commands().iter().enumerate() {
                if signal.is_set() {
                    info!(pass, "cancellation observed before next command");
                    report.exit = RunnerExit::Cancelled;
                    return report;
                }

                info!(
                    event = "command_start",
                    pass,
                    index,
                    command = %command,
                    "running command"
                );

                let mut child = match ChildProcess::spawn(command, &self.options.working_dir) {
                    Ok(child) => child,
                    Err(err) => {
                        warn!(command = %command, error = %err, "command could not be started; continuing");
                        report.commands_failed += 1;
                        continue;
                    }
                };
                report.commands_started += 1;

                tokio::select! {
                    biased;

                    _ = signal.cancelled() => {
                        info!(command = %command, "cancellation requested; terminating running command");
                        if let Err(err) = child.terminate(self.options.grace_period).await {
                            warn!(command = %command, error = %err, "failed to terminate command");
                        }
                        report.exit = RunnerExit::Cancelled;
                        return report;
                    }

                    status = child.wait() => match status {
                        Ok(status) => {
                            let code = status.code().unwrap_or(-1);
                            info!(
                                event = "command_exit",
                                command = %command,
                                exit_code = code,
                                success = status.success(),
                                "command exited"
                            );
                            if !status.success() {
                                report.commands_failed += 1;
                            }
                        }
                        Err(err) => {
                            warn!(command = %command, error = %err, "waiting for command failed");
                            report.commands_failed += 1;
                            if let Err(err) = child.terminate(self.options.grace_period).await {
                                warn!(command = %command, error = %err, "failed to reap command");
                            }
                        }
                    },
                }
            }

            report.passes = pass;
        }

        if signal.is_set() {
            report.exit = RunnerExit::Cancelled;
        } else {
            info!(
                passes = report.passes,
                "pipeline pass budget exhausted; runner stopping"
            );
        }
        report
    }
}
