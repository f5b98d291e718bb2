//! Firestore REST backend.
//!
//! Documents are read and written through the v1 REST API. Live
//! subscriptions poll the collection and emit only when its contents change.

mod client;
mod value;

pub use client::FirestoreClient;
pub use value::{decode_document, decode_fields, decode_value, encode_fields, encode_value};
