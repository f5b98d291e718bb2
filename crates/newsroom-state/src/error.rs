//! Error types for state operations.

use document_store::DocumentError;
use newsroom_auth::AuthError;
use newsroom_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by [`crate::NewsroomStore`] operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// Document store failure
    #[error("Document store error: {0}")]
    Document(#[from] DocumentError),

    /// Identity provider or auth state machine failure
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Durable local storage failure
    #[error("Local storage error: {0}")]
    Storage(#[from] StorageError),

    /// News source answered with a non-success status
    #[error("News source error: {status} - {message}")]
    NewsSource { status: u16, message: String },

    /// News source transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed news source URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation needs a current headline
    #[error("No headline selected")]
    NoHeadlineSelected,

    /// Operation needs a signed-in user
    #[error("Not logged in")]
    NotLoggedIn,
}

impl StateError {
    /// Returns true if the failure is transient and the caller may retry.
    pub fn is_transient(&self) -> bool {
        match self {
            StateError::Document(e) => e.is_transient(),
            StateError::Auth(e) => e.is_transient(),
            StateError::NewsSource { status, .. } => *status >= 500 || *status == 429,
            StateError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                e.status().map(|s| s.is_server_error()).unwrap_or(false)
            }
            _ => false,
        }
    }
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;
