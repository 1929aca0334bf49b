//! Effect interfaces for external collaborators
//!
//! Pure trait signatures only. Production implementations live with the
//! embedding application; in-memory implementations for tests live in
//! `strata-testkit`. The core consumes these at its boundary and never
//! specifies their internal protocols.

/// Durable document store boundary
pub mod document;

/// Indexing collaborator boundary
pub mod indexer;

/// Local key-value persistence boundary
pub mod keyvalue;

pub use document::{Document, DocumentId, DocumentMetadata, DocumentStore};
pub use indexer::{IndexTarget, Indexer};
pub use keyvalue::KeyValueStore;
