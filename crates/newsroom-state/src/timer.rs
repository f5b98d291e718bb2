//! Deferred session teardown.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Holds at most one pending expiry task.
#[derive(Debug, Default)]
pub(crate) struct SessionTimer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SessionTimer {
    /// Run `on_fire` after `delay`, replacing any pending task.
    pub(crate) fn arm<F>(&self, delay: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire.await;
        });

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
        debug!(?delay, "Session timer armed");
    }

    /// Abort the pending task, if any.
    pub(crate) fn cancel(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(task) = pending {
            task.abort();
            debug!("Session timer cancelled");
        }
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
