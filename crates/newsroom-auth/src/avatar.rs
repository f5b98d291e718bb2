//! Avatar derivation.

use sha2::{Digest, Sha256};

const AVATAR_BASE: &str = "https://gravatar.com/avatar";

/// Trimmed, lowercased email. This is the form users are keyed by.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Gravatar URL for an email, falling back to a generated identicon.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(normalize_email(email).as_bytes());
    format!("{}/{}?d=identicon", AVATAR_BASE, hex::encode(digest))
}
