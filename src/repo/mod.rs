// src/repo/mod.rs

//! Repository state as seen by the supervisor.
//!
//! The supervision engine only needs two questions answered: which commit the
//! local working copy is on, and which commit the watched remote reference
//! points at. [`RepositoryStateProvider`] abstracts that so tests can script
//! commit sequences without touching git. [`GitRepository`] is the production
//! implementation backed by the `git` CLI.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::types::{CommitId, Reference};

pub mod git;
pub mod mask;

pub use git::GitRepository;
pub use mask::mask_credentials;

/// Boxed future returned by provider operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Source of local and remote commit identifiers, plus the checkout side
/// effects run once before supervision starts.
pub trait RepositoryStateProvider: Send + Sync {
    /// Commit the local working copy is currently on.
    fn local_head(&self) -> ProviderFuture<'_, CommitId>;

    /// Commit the given remote reference currently points at.
    fn remote_head<'a>(&'a self, reference: &'a Reference) -> ProviderFuture<'a, CommitId>;

    /// Clone the repository if the local copy does not exist yet.
    ///
    /// Returns `true` when a fresh clone was made.
    fn ensure_cloned(&self) -> ProviderFuture<'_, bool>;

    /// Bring an existing local copy up to date.
    fn pull(&self) -> ProviderFuture<'_, ()>;
}

/// Prepare the local working copy: clone it when missing, pull otherwise.
///
/// Failures are logged and swallowed; supervision proceeds with whatever is
/// on disk.
pub async fn bootstrap(provider: &dyn RepositoryStateProvider) {
    match provider.ensure_cloned().await {
        Ok(true) => tracing::info!("repository cloned"),
        Ok(false) => {
            if let Err(err) = provider.pull().await {
                tracing::warn!(error = %err, "git pull failed; continuing with local copy");
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "git clone failed; continuing without a fresh checkout");
        }
    }
}
