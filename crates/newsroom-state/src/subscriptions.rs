//! Live subscription slots.
//!
//! One background task per kind. Arming a kind aborts whatever task held the
//! slot before.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// What a live subscription is watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    /// `headlines/{slug}/comments`
    Comments,
    /// `users/{email}/feed`
    Feed,
}

#[derive(Debug)]
struct Armed {
    target: String,
    task: JoinHandle<()>,
}

#[derive(Debug, Default)]
pub(crate) struct Subscriptions {
    slots: Mutex<HashMap<SubscriptionKind, Armed>>,
}

impl Subscriptions {
    /// Install `task` for `kind`, aborting the previous one.
    pub(crate) fn arm(&self, kind: SubscriptionKind, target: impl Into<String>, task: JoinHandle<()>) {
        let target = target.into();
        let previous = self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind, Armed {
                target: target.clone(),
                task,
            });
        if let Some(previous) = previous {
            previous.task.abort();
        }
        debug!(kind = ?kind, target = %target, "Subscription armed");
    }

    /// Abort the task for `kind`, if any.
    pub(crate) fn cancel(&self, kind: SubscriptionKind) -> bool {
        let removed = self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&kind);
        match removed {
            Some(armed) => {
                armed.task.abort();
                debug!(kind = ?kind, target = %armed.target, "Subscription cancelled");
                true
            }
            None => false,
        }
    }

    /// Abort the task for `kind` unless it watches `target`.
    pub(crate) fn cancel_unless(&self, kind: SubscriptionKind, target: &str) {
        if self.target(kind).as_deref() != Some(target) {
            self.cancel(kind);
        }
    }

    /// Id the `kind` slot is watching, if armed and still running.
    pub(crate) fn target(&self, kind: SubscriptionKind) -> Option<String> {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .filter(|armed| !armed.task.is_finished())
            .map(|armed| armed.target.clone())
    }

    pub(crate) fn cancel_all(&self) {
        let drained: Vec<_> = self
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .collect();
        for (_, armed) in drained {
            armed.task.abort();
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
