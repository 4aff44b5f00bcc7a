//! Client-side caches of the last fetched list and detail per resource.
//!
//! Each store publishes a revision number on a `watch` channel that ticks
//! on every mutation, so front ends can redraw without polling. State lives
//! behind `parking_lot` locks that are never held across an await.

pub mod analyses;
pub mod auth;
pub mod datasets;

pub use analyses::AnalysisStore;
pub use auth::AuthStore;
pub use datasets::DatasetStore;

use parking_lot::RwLock;
use tokio::sync::watch;

/// Monotonic change counter shared by a store and its subscribers.
pub struct Revision {
    tx: watch::Sender<u64>,
}

impl Default for Revision {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }
}

impl Revision {
    pub fn bump(&self) {
        self.tx.send_modify(|revision| *revision += 1);
    }

    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

/// Sets a store's busy flag and clears it on drop, whichever way the fetch
/// ends.
pub(crate) struct LoadingGuard<'a> {
    flag: &'a RwLock<bool>,
    revision: &'a Revision,
}

impl<'a> LoadingGuard<'a> {
    pub(crate) fn start(flag: &'a RwLock<bool>, revision: &'a Revision) -> Self {
        *flag.write() = true;
        revision.bump();
        Self { flag, revision }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.flag.write() = false;
        self.revision.bump();
    }
}
