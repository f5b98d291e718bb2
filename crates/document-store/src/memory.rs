//! In-process document store.
//!
//! Collections iterate in ascending document-id order, which is the tie-break
//! order for ordered queries. The store can be switched "offline" to exercise
//! transient-failure paths.

use crate::live::LiveHub;
use crate::path::{CollectionPath, DocumentPath};
use crate::traits::{DocumentStore, SnapshotStream};
use crate::types::{Document, OrderBy, QuerySnapshot};
use crate::{DocumentError, DocumentResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::debug;

type Collection = BTreeMap<String, Map<String, Value>>;

/// Document store held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<CollectionPath, Collection>>,
    hub: LiveHub,
    unavailable: AtomicBool,
    writes: AtomicU64,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with [`DocumentError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful `set`/`update`/`delete` calls that changed data.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of live subscribers on a collection.
    pub fn subscriber_count(&self, collection: &CollectionPath) -> usize {
        self.hub.subscriber_count(collection)
    }

    /// Number of documents in a collection.
    pub fn document_count(&self, collection: &CollectionPath) -> usize {
        self.read()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn check_available(&self) -> DocumentResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DocumentError::Unavailable(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<CollectionPath, Collection>> {
        self.collections.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<CollectionPath, Collection>> {
        self.collections.write().unwrap_or_else(|e| e.into_inner())
    }

    fn docs_of(collection: Option<&Collection>) -> Vec<Document> {
        collection
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document::new(id.clone(), Value::Object(data.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn committed(&self, collections: &HashMap<CollectionPath, Collection>, parent: &CollectionPath) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.hub.notify(parent, &Self::docs_of(collections.get(parent)));
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> DocumentResult<Option<Document>> {
        self.check_available()?;
        let collections = self.read();
        Ok(collections
            .get(&path.parent())
            .and_then(|docs| docs.get(path.id()))
            .map(|data| Document::new(path.id(), Value::Object(data.clone()))))
    }

    async fn set(&self, path: &DocumentPath, data: Value) -> DocumentResult<()> {
        self.check_available()?;
        let Value::Object(fields) = data else {
            return Err(DocumentError::InvalidData(format!(
                "`{path}` body must be a JSON object"
            )));
        };

        let parent = path.parent();
        let mut collections = self.write();
        collections
            .entry(parent.clone())
            .or_default()
            .insert(path.id().to_string(), fields);
        self.committed(&collections, &parent);

        debug!(path = %path, "Document set");
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Map<String, Value>) -> DocumentResult<()> {
        self.check_available()?;
        let parent = path.parent();
        let mut collections = self.write();
        let existing = collections
            .get_mut(&parent)
            .and_then(|docs| docs.get_mut(path.id()))
            .ok_or_else(|| DocumentError::NotFound(path.to_string()))?;

        for (key, value) in fields {
            existing.insert(key, value);
        }
        self.committed(&collections, &parent);

        debug!(path = %path, "Document updated");
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> DocumentResult<()> {
        self.check_available()?;
        let parent = path.parent();
        let mut collections = self.write();
        let removed = collections
            .get_mut(&parent)
            .and_then(|docs| docs.remove(path.id()))
            .is_some();

        if removed {
            self.committed(&collections, &parent);
            debug!(path = %path, "Document deleted");
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> DocumentResult<QuerySnapshot> {
        self.check_available()?;
        let mut docs = Self::docs_of(self.read().get(collection));
        if let Some(order) = order {
            order.sort(&mut docs);
        }
        Ok(QuerySnapshot::new(docs))
    }

    async fn subscribe(
        &self,
        collection: &CollectionPath,
        order: Option<OrderBy>,
    ) -> DocumentResult<SnapshotStream> {
        self.check_available()?;
        let collections = self.read();
        let current = Self::docs_of(collections.get(collection));
        let stream = self.hub.subscribe(collection, order, &current);
        drop(collections);

        debug!(collection = %collection, "Subscribed to collection");
        Ok(stream)
    }
}
