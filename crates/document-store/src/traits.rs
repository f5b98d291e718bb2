//! The document store contract.

use crate::path::{CollectionPath, DocumentPath};
use crate::types::{Document, OrderBy, QuerySnapshot};
use crate::DocumentResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Receiving end of a live subscription.
///
/// Yields one full [`QuerySnapshot`] per change. Dropping the stream cancels
/// the subscription, including any background polling task behind it.
#[derive(Debug)]
pub struct SnapshotStream {
    receiver: mpsc::UnboundedReceiver<QuerySnapshot>,
    task: Option<JoinHandle<()>>,
}

impl SnapshotStream {
    /// Wrap a channel fed by an in-process notifier.
    pub fn new(receiver: mpsc::UnboundedReceiver<QuerySnapshot>) -> Self {
        Self {
            receiver,
            task: None,
        }
    }

    /// Wrap a channel fed by a background task that is aborted on drop.
    pub fn with_task(
        receiver: mpsc::UnboundedReceiver<QuerySnapshot>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            receiver,
            task: Some(task),
        }
    }

    /// Wait for the next snapshot. `None` once the subscription is closed.
    pub async fn next(&mut self) -> Option<QuerySnapshot> {
        self.receiver.recv().await
    }

    /// Take a snapshot if one is already queued.
    pub fn try_next(&mut self) -> Option<QuerySnapshot> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for SnapshotStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Hierarchical document store with live collection subscriptions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document. A missing document is `Ok(None)`.
    async fn get(&self, path: &DocumentPath) -> DocumentResult<Option<Document>>;

    /// Read several documents, preserving input order.
    async fn get_all(&self, paths: &[DocumentPath]) -> DocumentResult<Vec<Option<Document>>> {
        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            docs.push(self.get(path).await?);
        }
        Ok(docs)
    }

    /// Create or fully overwrite a document. `data` must be a JSON object.
    async fn set(&self, path: &DocumentPath, data: Value) -> DocumentResult<()>;

    /// Merge top-level fields into an existing document.
    async fn update(&self, path: &DocumentPath, fields: Map<String, Value>) -> DocumentResult<()>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, path: &DocumentPath) -> DocumentResult<()>;

    /// Read a whole collection, optionally ordered by one field.
    async fn query(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> DocumentResult<QuerySnapshot>;

    /// Subscribe to a collection. The current snapshot is delivered first,
    /// then one snapshot per change.
    async fn subscribe(
        &self,
        collection: &CollectionPath,
        order: Option<OrderBy>,
    ) -> DocumentResult<SnapshotStream>;
}
