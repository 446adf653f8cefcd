use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use gitvisor::errors::GitvisorError;
use gitvisor::repo::{ProviderFuture, RepositoryStateProvider};
use gitvisor::types::{CommitId, Reference};

/// One scripted answer to `remote_head`.
#[derive(Debug, Clone)]
pub enum RemoteAnswer {
    Commit(String),
    Fail(String),
    /// Never answers; exercises the query timeout.
    Hang,
}

/// A fake provider that:
/// - always reports `local` as the local head
/// - answers `remote_head` from a script, repeating the last answer forever
/// - counts how often each operation was called.
#[derive(Debug)]
pub struct ScriptedRepository {
    local: CommitId,
    remote: Mutex<VecDeque<RemoteAnswer>>,
    last: Mutex<RemoteAnswer>,
    local_calls: AtomicUsize,
    remote_calls: AtomicUsize,
    clone_calls: AtomicUsize,
    pull_calls: AtomicUsize,
    cloned: bool,
}

impl ScriptedRepository {
    /// Remote always reports the same commit as the local checkout.
    pub fn stable(local: &str) -> Self {
        Self::new(local, vec![RemoteAnswer::Commit(local.to_string())])
    }

    /// Remote answers come from `remote` commits in order.
    pub fn with_remote_commits(local: &str, remote: &[&str]) -> Self {
        Self::new(
            local,
            remote
                .iter()
                .map(|c| RemoteAnswer::Commit(c.to_string()))
                .collect(),
        )
    }

    pub fn new(local: &str, script: Vec<RemoteAnswer>) -> Self {
        let last = script
            .last()
            .cloned()
            .unwrap_or_else(|| RemoteAnswer::Commit(local.to_string()));
        Self {
            local: CommitId::new(local),
            remote: Mutex::new(script.into()),
            last: Mutex::new(last),
            local_calls: AtomicUsize::new(0),
            remote_calls: AtomicUsize::new(0),
            clone_calls: AtomicUsize::new(0),
            pull_calls: AtomicUsize::new(0),
            cloned: false,
        }
    }

    /// Make `ensure_cloned` report a fresh clone.
    pub fn needs_clone(mut self) -> Self {
        self.cloned = true;
        self
    }

    pub fn local_calls(&self) -> usize {
        self.local_calls.load(Ordering::SeqCst)
    }

    pub fn remote_calls(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    pub fn clone_calls(&self) -> usize {
        self.clone_calls.load(Ordering::SeqCst)
    }

    pub fn pull_calls(&self) -> usize {
        self.pull_calls.load(Ordering::SeqCst)
    }

    fn next_answer(&self) -> RemoteAnswer {
        let mut script = self.remote.lock().unwrap();
        match script.pop_front() {
            Some(answer) => {
                *self.last.lock().unwrap() = answer.clone();
                answer
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

impl RepositoryStateProvider for ScriptedRepository {
    fn local_head(&self) -> ProviderFuture<'_, CommitId> {
        self.local_calls.fetch_add(1, Ordering::SeqCst);
        let local = self.local.clone();
        Box::pin(async move { Ok(local) })
    }

    fn remote_head<'a>(&'a self, _reference: &'a Reference) -> ProviderFuture<'a, CommitId> {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.next_answer();
        Box::pin(async move {
            match answer {
                RemoteAnswer::Commit(c) => Ok(CommitId::new(c)),
                RemoteAnswer::Fail(msg) => Err(fake_error(msg)),
                RemoteAnswer::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(fake_error("hang elapsed".to_string()))
                }
            }
        })
    }

    fn ensure_cloned(&self) -> ProviderFuture<'_, bool> {
        self.clone_calls.fetch_add(1, Ordering::SeqCst);
        let cloned = self.cloned;
        Box::pin(async move { Ok(cloned) })
    }

    fn pull(&self) -> ProviderFuture<'_, ()> {
        self.pull_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(()) })
    }
}

fn fake_error(message: String) -> GitvisorError {
    GitvisorError::Git {
        operation: "ls-remote".to_string(),
        message,
    }
}
