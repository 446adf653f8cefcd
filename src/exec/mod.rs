// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] wraps a single `tokio::process::Child` with graceful
//!   termination (SIGTERM, then kill after a grace period).
//! - [`runner`] owns the sequential pipeline loop, pass budget and
//!   cancellation handling.

pub mod process;
pub mod runner;

pub use process::ChildProcess;
pub use runner::{
    DEFAULT_GRACE_PERIOD, MAX_RETRIES, PipelineRunner, RunReport, RunnerExit, RunnerOptions,
};
