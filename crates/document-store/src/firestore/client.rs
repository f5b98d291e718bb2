//! Firestore REST client.

use super::value::{decode_document, encode_fields};
use crate::path::{CollectionPath, DocumentPath};
use crate::traits::{DocumentStore, SnapshotStream};
use crate::types::{Document, OrderBy, QuerySnapshot};
use crate::{DocumentError, DocumentResult};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Firestore REST API client implementing [`DocumentStore`].
#[derive(Clone)]
pub struct FirestoreClient {
    http_client: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: String,
    access_token: Arc<RwLock<Option<String>>>,
    poll_interval: Duration,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    ///
    /// # Arguments
    /// * `project_id` - The Firebase project id
    /// * `api_key` - The web API key, sent as the `key` query parameter
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            api_key: api_key.into(),
            access_token: Arc::new(RwLock::new(None)),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Point the client at another host, e.g. the local emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// How often live subscriptions re-read their collection.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set or clear the bearer token sent with every request.
    ///
    /// Shared by all clones of this client.
    pub fn set_access_token(&self, token: Option<String>) {
        let mut guard = self
            .access_token
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    fn url_for(&self, segments: &[String]) -> String {
        let mut url = self.documents_root();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    /// URL of the document (or root) that owns a collection, for `runQuery`.
    fn query_parent_url(&self, collection: &CollectionPath) -> String {
        match collection.parent() {
            Some(parent) => self.url_for(parent.segments()),
            None => self.documents_root(),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.query(&[("key", self.api_key.as_str())]);
        let token = self
            .access_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn fetch_collection(&self, collection: &CollectionPath) -> DocumentResult<Vec<Document>> {
        let url = format!("{}:runQuery", self.query_parent_url(collection));
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection.id() }],
                "orderBy": [{ "field": { "fieldPath": "__name__" }, "direction": "ASCENDING" }]
            }
        });

        let response = self
            .authorize(self.http_client.post(&url))
            .json(&body)
            .send()
            .await?;
        let response = self.check_response(response).await?;
        let rows: Vec<Value> = response.json().await?;

        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(decode_document)
            .collect()
    }

    /// Check HTTP response for errors.
    async fn check_response(&self, response: reqwest::Response) -> DocumentResult<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!("Firestore request failed: {} - {}", status, body);
            return Err(DocumentError::Remote {
                status,
                message: body,
            });
        }
        Ok(response)
    }
}

/// Field paths that are not plain identifiers must be backquoted.
fn quote_field_path(field: &str) -> String {
    let mut chars = field.chars();
    let simple = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, path: &DocumentPath) -> DocumentResult<Option<Document>> {
        let url = self.url_for(path.segments());
        let response = self.authorize(self.http_client.get(&url)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check_response(response).await?;
        let resource: Value = response.json().await?;
        decode_document(&resource).map(Some)
    }

    async fn set(&self, path: &DocumentPath, data: Value) -> DocumentResult<()> {
        let Value::Object(fields) = data else {
            return Err(DocumentError::InvalidData(format!(
                "`{path}` body must be a JSON object"
            )));
        };
        let url = self.url_for(path.segments());
        let body = json!({ "fields": encode_fields(&fields) });

        debug!(path = %path, "Writing document to Firestore");
        let response = self
            .authorize(self.http_client.patch(&url))
            .json(&body)
            .send()
            .await?;
        self.check_response(response).await?;
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Map<String, Value>) -> DocumentResult<()> {
        let url = self.url_for(path.segments());
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", quote_field_path(key)))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));
        let body = json!({ "fields": encode_fields(&fields) });

        debug!(path = %path, fields = fields.len(), "Updating document in Firestore");
        let response = self
            .authorize(self.http_client.patch(&url))
            .query(&query)
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DocumentError::NotFound(path.to_string()));
        }
        self.check_response(response).await?;
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> DocumentResult<()> {
        let url = self.url_for(path.segments());
        let response = self.authorize(self.http_client.delete(&url)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!(path = %path, "Document already absent");
            return Ok(());
        }
        self.check_response(response).await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        order: Option<&OrderBy>,
    ) -> DocumentResult<QuerySnapshot> {
        // Firestore drops documents lacking the order field, so order locally.
        let mut docs = self.fetch_collection(collection).await?;
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
        let initial = self.query(collection, order.as_ref()).await?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let _ = sender.send(initial.clone());

        let client = self.clone();
        let collection = collection.clone();
        let task = tokio::spawn(async move {
            let mut last = initial;
            let mut ticker = tokio::time::interval(client.poll_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if sender.is_closed() {
                    break;
                }
                match client.query(&collection, order.as_ref()).await {
                    Ok(snapshot) if snapshot != last => {
                        if sender.send(snapshot.clone()).is_err() {
                            break;
                        }
                        last = snapshot;
                    }
                    Ok(_) => {}
                    Err(e) => warn!(collection = %collection, error = %e, "Snapshot poll failed"),
                }
            }
            debug!(collection = %collection, "Snapshot poller stopped");
        });

        Ok(SnapshotStream::with_task(receiver, task))
    }
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}
