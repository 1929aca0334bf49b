//! Resource kinds and capability scope descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// The independently authorizable resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Durable document store
    Storage,
    /// Content-encryption service
    Encryption,
}

impl ResourceKind {
    /// Both kinds, in a stable order.
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Storage, ResourceKind::Encryption];

    /// Wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Storage => "storage",
            ResourceKind::Encryption => "encryption",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scope descriptor a resource presents when requesting a signed
/// authentication message. Bound into the message so a signature cannot be
/// replayed against a different resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceScope {
    /// Stable resource identifier (e.g. `"ceramic"`, `"lit"`)
    pub id: String,
    /// Human-readable name shown in wallet prompts
    pub user_friendly_name: String,
    /// Which capability this scope authorizes
    pub resource_type: ResourceKind,
    /// Resource URIs embedded in the signed message
    pub siwx_resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ResourceKind::Storage).unwrap(),
            "\"storage\""
        );
        assert_eq!(
            serde_json::from_str::<ResourceKind>("\"encryption\"").unwrap(),
            ResourceKind::Encryption
        );
    }
}
