//! Serialized rebuild scheduling.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Notify;

/// Single-slot rebuild queue.
///
/// At most one pass runs at a time. Any number of requests made while a pass
/// is running schedule exactly one follow-up pass.
#[derive(Debug, Clone, Default)]
pub struct RebuildQueue {
    pending: Arc<Notify>,
}

impl RebuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a rebuild.
    pub fn request(&self) {
        self.pending.notify_one();
    }

    /// Run `pass` once per coalesced request, forever.
    pub async fn run<F, Fut>(&self, mut pass: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            self.pending.notified().await;
            pass().await;
        }
    }
}
