//! # Document Store
//!
//! The remote document store contract used by the newsroom state layer, plus
//! two implementations.
//!
//! ## Model
//!
//! ```text
//! collection / document / collection / document ...
//! headlines/{slug}
//! headlines/{slug}/comments/{id}
//! users/{email}/feed/{key}
//! ```
//!
//! - Documents are JSON objects addressed by string path segments.
//! - `set` is a full-overwrite upsert, `update` is a partial merge that fails
//!   on a missing document, `delete` is idempotent.
//! - Queries order by a single field.
//! - Subscriptions deliver the **full** collection snapshot on arm and after
//!   every change. Receivers never see diffs.
//!
//! ## Crate Structure
//!
//! - [`path`] - Collection and document paths
//! - [`types`] - Documents, snapshots, ordering
//! - [`traits`] - The [`DocumentStore`] trait and [`SnapshotStream`]
//! - [`live`] - Subscriber fan-out for in-process stores
//! - [`memory`] - [`InMemoryDocumentStore`]
//! - [`firestore`] - [`FirestoreClient`] over the Firestore REST API

pub mod firestore;
pub mod live;
pub mod memory;
pub mod path;
pub mod traits;
pub mod types;

pub use firestore::FirestoreClient;
pub use live::LiveHub;
pub use memory::InMemoryDocumentStore;
pub use path::{CollectionPath, DocumentPath};
pub use traits::{DocumentStore, SnapshotStream};
pub use types::{Direction, Document, OrderBy, QuerySnapshot};

use thiserror::Error;

/// Errors that can occur in document store operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Store could not be reached.
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    /// Partial update targeted a document that does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Path segment was empty or contained a separator.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Document body was not a JSON object or could not be decoded.
    #[error("Invalid document data: {0}")]
    InvalidData(String),

    /// Transport-level HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote store returned a non-success status.
    #[error("Remote store error: {status} - {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocumentError {
    /// Returns true if the failure is transient (network, timeout, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            DocumentError::Unavailable(_) => true,
            DocumentError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                e.status().map(|s| s.is_server_error()).unwrap_or(false)
            }
            DocumentError::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for document store operations.
pub type DocumentResult<T> = Result<T, DocumentError>;
