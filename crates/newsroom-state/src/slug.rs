//! Title to URL slug normalization.

use deunicode::deunicode;
use sha2::{Digest, Sha256};

/// Stable, lowercase, URL-safe identifier for a headline title.
///
/// The title is transliterated to ASCII (`é` to `e`, `ß` to `ss`).
/// Whitespace and `-` runs collapse to one `-`; anything else outside
/// `[a-z0-9]` is dropped, including the punctuation `* + ~ . ( ) ' " ! : @`
/// and friends. Titles that strip down to nothing fall back to a
/// digest-based slug so the result is never empty.
pub fn slugify(title: &str) -> String {
    let ascii = deunicode(title);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_separator = false;

    for c in ascii.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_whitespace() || c == '-' {
            pending_separator = true;
            continue;
        }
        if !c.is_ascii_alphanumeric() {
            continue;
        }
        if pending_separator && !slug.is_empty() {
            slug.push('-');
        }
        pending_separator = false;
        slug.push(c);
    }

    if slug.is_empty() {
        let digest = hex::encode(Sha256::digest(title.as_bytes()));
        return format!("headline-{}", &digest[..16]);
    }
    slug
}
