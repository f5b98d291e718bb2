//! Live subscription fan-out for in-process stores.
//!
//! # Design Principles
//!
//! - Subscribers are notified after a write is applied
//! - Every notification carries the full collection, sorted per subscriber
//! - A subscriber receives the collection as it was when it subscribed, then
//!   every later state; nothing from before

use crate::path::CollectionPath;
use crate::traits::SnapshotStream;
use crate::types::{Document, OrderBy, QuerySnapshot};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedSender};

#[derive(Debug)]
struct Subscriber {
    order: Option<OrderBy>,
    sender: UnboundedSender<QuerySnapshot>,
}

impl Subscriber {
    fn send(&self, docs: &[Document]) -> bool {
        let mut docs = docs.to_vec();
        if let Some(order) = &self.order {
            order.sort(&mut docs);
        }
        self.sender.send(QuerySnapshot::new(docs)).is_ok()
    }
}

/// A hub that manages live subscriptions for all collections.
#[derive(Debug, Default)]
pub struct LiveHub {
    /// Map of collection path to subscribers
    subscribers: RwLock<HashMap<CollectionPath, Vec<Subscriber>>>,
}

impl LiveHub {
    /// Creates a new empty hub with no active subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and immediately delivers `current` to it.
    ///
    /// Callers must hold whatever lock guards `current` until this returns,
    /// otherwise a concurrent write could slip between the read and the
    /// registration.
    pub fn subscribe(
        &self,
        collection: &CollectionPath,
        order: Option<OrderBy>,
        current: &[Document],
    ) -> SnapshotStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscriber = Subscriber { order, sender };
        subscriber.send(current);

        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        subscribers
            .entry(collection.clone())
            .or_default()
            .push(subscriber);

        SnapshotStream::new(receiver)
    }

    /// Broadcasts the collection's new contents to its subscribers.
    ///
    /// Dead subscribers (receiver dropped) are removed during this call.
    pub fn notify(&self, collection: &CollectionPath, docs: &[Document]) {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner());

        if let Some(list) = subscribers.get_mut(collection) {
            list.retain(|subscriber| subscriber.send(docs));
            if list.is_empty() {
                subscribers.remove(collection);
            }
        }
    }

    /// Count of registered subscribers for a collection.
    ///
    /// May include dead subscribers that have not been pruned by a
    /// `notify()` yet.
    pub fn subscriber_count(&self, collection: &CollectionPath) -> usize {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner());
        subscribers.get(collection).map(Vec::len).unwrap_or(0)
    }
}
