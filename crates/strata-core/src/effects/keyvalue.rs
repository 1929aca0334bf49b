//! Local key-value persistence boundary
//!
//! Holds the persisted session bundle between process runs. Browser builds
//! back this with local storage; native builds with a file or keychain.

use crate::errors::Result;
use async_trait::async_trait;

/// String key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when absent.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value.
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing an absent key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;
}
