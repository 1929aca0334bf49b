//! Durable document store boundary
//!
//! The core creates, updates, and loads documents given content plus
//! metadata; everything below that (network calls, stream formats, anchoring)
//! belongs to the implementation.

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque document identifier returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata attached to every document write.
///
/// The core sets these; it never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Schema identifier the content conforms to
    pub schema: String,
    /// Application family classification
    pub family: String,
    /// Free-form classification tags
    pub tags: Vec<String>,
}

impl DocumentMetadata {
    /// Metadata for a Strata-family document with the given schema and tags.
    pub fn strata(schema: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            schema: schema.into(),
            family: "strata".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A loaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document content
    pub content: serde_json::Value,
    /// Controlling DIDs
    pub owners: Vec<String>,
    /// Metadata recorded at write time
    pub metadata: DocumentMetadata,
}

/// Low-level document storage I/O.
///
/// The storage resource gates every write on its session and fills in the
/// owning DIDs; implementations surface failures as
/// [`crate::StrataError::Storage`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document, returning its id.
    async fn create(&self, document: Document) -> Result<DocumentId>;

    /// Replace an existing document.
    async fn update(&self, id: &DocumentId, document: Document) -> Result<()>;

    /// Load a document.
    async fn get(&self, id: &DocumentId) -> Result<Document>;
}
