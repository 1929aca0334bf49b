//! Recording indexer double.

use async_trait::async_trait;
use std::sync::Mutex;

use strata_core::effects::{IndexTarget, Indexer};
use strata_core::errors::{Result, StrataError};

/// Records every submission so tests can assert what was forwarded,
/// optionally failing to exercise best-effort paths.
#[derive(Debug, Default)]
pub struct RecordingIndexer {
    submissions: Mutex<Vec<(String, IndexTarget)>>,
    fail: Mutex<bool>,
}

impl RecordingIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent submissions fail.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn submissions(&self) -> Vec<(String, IndexTarget)> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Indexer for RecordingIndexer {
    async fn submit_for_indexing(&self, resource_id: &str, target: IndexTarget) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(StrataError::indexing("indexer unavailable"));
        }
        self.submissions
            .lock()
            .unwrap()
            .push((resource_id.to_owned(), target));
        Ok(())
    }
}
