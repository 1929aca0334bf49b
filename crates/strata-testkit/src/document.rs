//! In-memory document store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use strata_core::effects::{Document, DocumentId, DocumentStore};
use strata_core::errors::{Result, StrataError};

/// Stores documents in a `HashMap` keyed by a monotonically assigned id.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: Mutex<StoreState>,
}

#[derive(Debug, Default)]
struct StoreState {
    documents: HashMap<String, Document>,
    next_id: u64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, document: Document) -> Result<DocumentId> {
        let mut state = self.state.lock().unwrap();
        let id = format!("doc-{}", state.next_id);
        state.next_id += 1;
        state.documents.insert(id.clone(), document);
        Ok(DocumentId(id))
    }

    async fn update(&self, id: &DocumentId, document: Document) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.documents.contains_key(&id.0) {
            return Err(StrataError::storage(format!("unknown document {}", id.0)));
        }
        state.documents.insert(id.0.clone(), document);
        Ok(())
    }

    async fn get(&self, id: &DocumentId) -> Result<Document> {
        let state = self.state.lock().unwrap();
        state
            .documents
            .get(&id.0)
            .cloned()
            .ok_or_else(|| StrataError::storage(format!("unknown document {}", id.0)))
    }
}
