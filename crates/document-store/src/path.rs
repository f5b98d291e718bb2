//! Collection and document paths.
//!
//! Paths alternate collection and document segments, starting with a
//! collection. A [`CollectionPath`] always has an odd number of segments and a
//! [`DocumentPath`] an even number.

use crate::{DocumentError, DocumentResult};
use std::fmt;

fn validate_segment(segment: &str) -> DocumentResult<()> {
    if segment.is_empty() || segment == "." || segment == ".." || segment.contains('/') {
        return Err(DocumentError::InvalidPath(format!(
            "invalid path segment `{segment}`"
        )));
    }
    Ok(())
}

fn split(path: &str) -> DocumentResult<Vec<String>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(DocumentError::InvalidPath("path is empty".to_string()));
    }
    trimmed
        .split('/')
        .map(|segment| {
            validate_segment(segment)?;
            Ok(segment.to_string())
        })
        .collect()
}

/// Address of a collection, e.g. `headlines` or `headlines/abc/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// Root collection with the given id.
    pub fn new(id: impl Into<String>) -> DocumentResult<Self> {
        let id = id.into();
        validate_segment(&id)?;
        Ok(Self { segments: vec![id] })
    }

    /// Parse a `/`-separated path with an odd number of segments.
    pub fn parse(path: &str) -> DocumentResult<Self> {
        let segments = split(path)?;
        if segments.len() % 2 == 0 {
            return Err(DocumentError::InvalidPath(format!(
                "`{path}` addresses a document, not a collection"
            )));
        }
        Ok(Self { segments })
    }

    /// Document with the given id inside this collection.
    pub fn doc(&self, id: impl Into<String>) -> DocumentResult<DocumentPath> {
        let id = id.into();
        validate_segment(&id)?;
        let mut segments = self.segments.clone();
        segments.push(id);
        Ok(DocumentPath { segments })
    }

    /// Collection id (last segment).
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Owning document for sub-collections, `None` for root collections.
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() < 3 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// Address of a single document, e.g. `headlines/abc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Parse a `/`-separated path with an even number of segments.
    pub fn parse(path: &str) -> DocumentResult<Self> {
        let segments = split(path)?;
        if segments.len() % 2 == 1 {
            return Err(DocumentError::InvalidPath(format!(
                "`{path}` addresses a collection, not a document"
            )));
        }
        Ok(Self { segments })
    }

    /// Document id (last segment).
    pub fn id(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Collection holding this document.
    pub fn parent(&self) -> CollectionPath {
        CollectionPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        }
    }

    /// Sub-collection under this document.
    pub fn collection(&self, id: impl Into<String>) -> DocumentResult<CollectionPath> {
        let id = id.into();
        validate_segment(&id)?;
        let mut segments = self.segments.clone();
        segments.push(id);
        Ok(CollectionPath { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
