//! Durable local key-value storage for the newsroom client.
//!
//! This crate provides:
//! - **`LocalStorage`**: the string key/value contract the session layer persists through
//! - **`MemoryStorage`**: process-local backend (tests, ephemeral runs)
//! - **`FileStorage`**: JSON-file backend that survives process restarts
//! - **`SessionVault`**: reads and writes the `{jwt, expiresIn, user, avatar}` session record

mod file;
mod keys;
mod memory;
mod traits;
mod vault;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::LocalStorage;
pub use vault::{SessionVault, StoredSession};

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
