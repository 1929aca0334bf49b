//! Persisted session bundle
//!
//! One JSON document under a fixed key holds everything needed to restore a
//! connection: the serialized session for each resource (or `false` when the
//! resource had none, a shape kept for compatibility with existing stored
//! bundles) plus the authenticated user.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use strata_core::effects::KeyValueStore;
use strata_core::{AuthenticatedUser, Result, StrataError};

/// Key the bundle is stored under.
pub const BUNDLE_KEY: &str = "strata-session";

/// A resource's slot in the bundle: a serialized session, or `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionSlot {
    /// Serialized session string
    Active(String),
    /// No session; serialized as the JSON literal `false`
    Inactive(bool),
}

impl SessionSlot {
    /// The empty slot.
    pub fn inactive() -> Self {
        SessionSlot::Inactive(false)
    }

    /// Wrap an optional serialized session.
    pub fn from_option(serialized: Option<String>) -> Self {
        match serialized {
            Some(s) => SessionSlot::Active(s),
            None => SessionSlot::inactive(),
        }
    }

    /// The serialized session, when one is held.
    pub fn as_active(&self) -> Option<&str> {
        match self {
            SessionSlot::Active(s) => Some(s),
            SessionSlot::Inactive(_) => None,
        }
    }
}

/// The persisted connection state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedBundle {
    /// Storage session slot
    pub storage: SessionSlot,
    /// Encryption session slot
    pub encryption: SessionSlot,
    /// The user all slots belong to
    #[serde(rename = "userInformation")]
    pub user_information: AuthenticatedUser,
}

impl PersistedBundle {
    /// Parse a bundle from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            StrataError::serialization(format!("persisted bundle is malformed: {err}"))
        })
    }

    /// Serialize to the stored JSON form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(StrataError::from)
    }
}

/// Load the stored bundle, if any.
pub async fn load(store: &Arc<dyn KeyValueStore>) -> Result<Option<PersistedBundle>> {
    match store.get_item(BUNDLE_KEY).await? {
        Some(json) => Ok(Some(PersistedBundle::from_json(&json)?)),
        None => Ok(None),
    }
}

/// Write the bundle.
pub async fn save(store: &Arc<dyn KeyValueStore>, bundle: &PersistedBundle) -> Result<()> {
    store.set_item(BUNDLE_KEY, &bundle.to_json()?).await
}

/// Remove the bundle.
pub async fn erase(store: &Arc<dyn KeyValueStore>) -> Result<()> {
    store.remove_item(BUNDLE_KEY).await
}
