//! Signed authentication message construction
//!
//! Builds the canonical, chain-agnostic message a wallet signs to prove
//! control of an identity for a bounded set of resource scopes. The resource
//! URIs of the scope are embedded in the message, so a signature cannot be
//! replayed against a different resource.

use rand::Rng;
use serde::{Deserialize, Serialize};
use strata_core::{Chain, ResourceScope};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Default origin recorded in messages when the embedder supplies none.
const DEFAULT_DOMAIN: &str = "strata.app";

/// Caller-supplied overrides for individual message fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiwxOverrides {
    /// Requesting origin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Human-readable signing statement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    /// URI the session key is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Address override (e.g. lowercased EVM address for storage auth)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl SiwxOverrides {
    /// These overrides with the bound URI replaced.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// These overrides with the address replaced.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// A canonical sign-in message before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiwxMessage {
    /// Requesting origin
    pub domain: String,
    /// Signer address
    pub address: String,
    /// Chain family the account lives on
    pub chain: Chain,
    /// Human-readable statement
    pub statement: String,
    /// URI the resulting session is bound to
    pub uri: String,
    /// Message format version
    pub version: String,
    /// Random nonce
    pub nonce: String,
    /// Issuance timestamp, RFC 3339
    pub issued_at: String,
    /// Resource URIs this signature authorizes
    pub resources: Vec<String>,
}

impl SiwxMessage {
    /// Build a message for one resource scope.
    pub fn for_scope(
        chain: Chain,
        address: &str,
        scope: &ResourceScope,
        overrides: Option<&SiwxOverrides>,
    ) -> Self {
        let domain = overrides
            .and_then(|o| o.domain.clone())
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
        let statement = overrides.and_then(|o| o.statement.clone()).unwrap_or_else(|| {
            format!("Give this application access to {}", scope.user_friendly_name)
        });
        let uri = overrides
            .and_then(|o| o.uri.clone())
            .unwrap_or_else(|| format!("https://{domain}"));
        let address = overrides
            .and_then(|o| o.address.clone())
            .unwrap_or_else(|| address.to_string());

        Self {
            domain,
            address,
            chain,
            statement,
            uri,
            version: "1".to_string(),
            nonce: generate_nonce(),
            issued_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            resources: scope.siwx_resources.clone(),
        }
    }

    /// The canonical multi-line string the wallet signs.
    pub fn to_canonical_string(&self) -> String {
        let mut out = format!(
            "{domain} wants you to sign in with your {chain} account:\n{address}\n\n{statement}\n\n\
             URI: {uri}\nVersion: {version}\nNonce: {nonce}\nIssued At: {issued_at}",
            domain = self.domain,
            chain = self.chain,
            address = self.address,
            statement = self.statement,
            uri = self.uri,
            version = self.version,
            nonce = self.nonce,
            issued_at = self.issued_at,
        );

        if !self.resources.is_empty() {
            out.push_str("\nResources:");
            for resource in &self.resources {
                out.push_str("\n- ");
                out.push_str(resource);
            }
        }

        out
    }
}

fn generate_nonce() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..12)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ResourceKind;

    fn scope() -> ResourceScope {
        ResourceScope {
            id: "ceramic".into(),
            user_friendly_name: "Ceramic Network".into(),
            resource_type: ResourceKind::Storage,
            siwx_resources: vec!["ceramic://*".into()],
        }
    }

    #[test]
    fn message_embeds_scope_resources() {
        let message = SiwxMessage::for_scope(Chain::Evm, "0xAbC", &scope(), None);
        let canonical = message.to_canonical_string();

        assert!(canonical.contains("sign in with your ethereum account"));
        assert!(canonical.contains("0xAbC"));
        assert!(canonical.contains("Resources:\n- ceramic://*"));
    }

    #[test]
    fn overrides_replace_uri_and_address() {
        let overrides = SiwxOverrides::default()
            .with_uri("did:key:z6MkExample")
            .with_address("0xabc");
        let message = SiwxMessage::for_scope(Chain::Evm, "0xAbC", &scope(), Some(&overrides));

        assert_eq!(message.uri, "did:key:z6MkExample");
        assert_eq!(message.address, "0xabc");
        assert!(message
            .to_canonical_string()
            .contains("URI: did:key:z6MkExample"));
    }

    #[test]
    fn nonces_are_fresh_per_message() {
        let a = SiwxMessage::for_scope(Chain::Evm, "0x1", &scope(), None);
        let b = SiwxMessage::for_scope(Chain::Evm, "0x1", &scope(), None);
        assert_ne!(a.nonce, b.nonce);
    }
}
