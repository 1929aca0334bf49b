//! Indexing collaborator boundary
//!
//! Submissions are fire-and-forget from the core's perspective: the
//! orchestrator hands the completion back to the caller as an awaitable and
//! never awaits it internally.

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What is being submitted for (re)indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexTarget {
    /// A user profile, keyed by DID
    Profile,
    /// A document, keyed by document id
    Document,
}

/// Indexing submission boundary.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Submit a resource for priority reindexing; resolves when the indexer
    /// acknowledges completion.
    async fn submit_for_indexing(&self, resource_id: &str, target: IndexTarget) -> Result<()>;
}
