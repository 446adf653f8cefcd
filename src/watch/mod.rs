// src/watch/mod.rs

//! Remote change detection.
//!
//! The watcher compares the commit of the local working copy (captured once)
//! against the watched remote reference on a fixed interval and raises the
//! shared cancellation signal on the first mismatch. It knows nothing about
//! the pipeline it is stopping.

pub mod watcher;

pub use watcher::{
    ChangeWatcher, DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_POLL_INTERVAL,
    DEFAULT_QUERY_TIMEOUT, WatchOutcome, WatcherOptions,
};
