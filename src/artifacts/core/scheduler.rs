//! Keyed one-shot timers with cancel-on-reschedule semantics
//!
//! Backs the auto-save debounce: scheduling under a key that already has a
//! pending task aborts that task first, so only the latest schedule for a
//! key ever fires. Distinct keys are independent.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
pub struct DebounceScheduler {
    pending: HashMap<String, JoinHandle<()>>,
}

impl DebounceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, superseding any pending task for `key`
    pub fn debounce<F>(&mut self, key: &str, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.retain(|_, handle| !handle.is_finished());

        if let Some(handle) = self.pending.remove(key) {
            handle.abort();
            debug!(key, "pending task superseded");
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        self.pending.insert(key.to_string(), handle);
    }

    /// Abort the pending task for `key`, reporting whether one existed
    pub fn cancel(&mut self, key: &str) -> bool {
        match self.pending.remove(key) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn shutdown(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
