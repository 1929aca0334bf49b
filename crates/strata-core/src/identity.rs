//! Chain and identity model
//!
//! Strata identifies signers by DID. A DID string deterministically maps to a
//! [`ChainIdentity`] (chain family + extractable address); the canonical
//! post-authentication identity is [`AuthenticatedUser`], the join key across
//! all resource sessions.

use crate::errors::{Result, StrataError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain families a signer identity can belong to.
///
/// Serialized names are the backend wire names and must not change: compiled
/// conditions and persisted sessions embed them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    /// EVM family (Ethereum mainnet and compatible chains)
    #[serde(rename = "ethereum")]
    Evm,
    /// Solana
    #[serde(rename = "solana")]
    Solana,
    /// Tezos
    #[serde(rename = "tezos")]
    Tezos,
    /// Stacks
    #[serde(rename = "stacks")]
    Stacks,
    /// Local key DID (ed25519 `did:key`), no external wallet involved
    #[serde(rename = "key-did")]
    KeyDid,
}

impl Chain {
    /// Wire name of this chain, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Evm => "ethereum",
            Chain::Solana => "solana",
            Chain::Tezos => "tezos",
            Chain::Stacks => "stacks",
            Chain::KeyDid => "key-did",
        }
    }

    /// Address equality under this chain's case rule.
    ///
    /// EVM addresses are checksum-cased and safe to compare
    /// case-insensitively; every other chain requires an exact match.
    pub fn addresses_equal(&self, a: &str, b: &str) -> bool {
        match self {
            Chain::Evm => a.eq_ignore_ascii_case(b),
            _ => a == b,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signer identity derived deterministically from a DID string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainIdentity {
    /// The source DID
    pub did: String,
    /// Chain family the DID resolves to
    pub chain: Chain,
    /// Extracted signing address, when the scheme carries one
    pub address: Option<String>,
}

impl ChainIdentity {
    /// Parse a DID string into its chain identity.
    ///
    /// Supported schemes:
    /// - `did:pkh:eip155:<chain-id>:<address>`
    /// - `did:pkh:solana:<network>:<address>`
    /// - `did:pkh:tezos:<network>:<address>`
    /// - `did:pkh:stacks:<network>:<address>`
    /// - `did:key:<multibase>`
    ///
    /// Anything else fails with [`StrataError::MalformedIdentifier`].
    pub fn from_did(did: &str) -> Result<Self> {
        let malformed = || StrataError::MalformedIdentifier {
            did: did.to_string(),
        };

        let mut parts = did.split(':');
        if parts.next() != Some("did") {
            return Err(malformed());
        }

        match parts.next() {
            Some("pkh") => {
                let namespace = parts.next().ok_or_else(malformed)?;
                let chain = match namespace {
                    "eip155" => Chain::Evm,
                    "solana" => Chain::Solana,
                    "tezos" => Chain::Tezos,
                    "stacks" => Chain::Stacks,
                    _ => return Err(malformed()),
                };

                // Reference (chain id / network) then address; both required.
                let _reference = parts.next().ok_or_else(malformed)?;
                let address = parts.next().ok_or_else(malformed)?;
                if address.is_empty() || parts.next().is_some() {
                    return Err(malformed());
                }

                Ok(Self {
                    did: did.to_string(),
                    chain,
                    address: Some(address.to_string()),
                })
            }
            Some("key") => {
                let key = parts.next().ok_or_else(malformed)?;
                if key.is_empty() || parts.next().is_some() {
                    return Err(malformed());
                }

                Ok(Self {
                    did: did.to_string(),
                    chain: Chain::KeyDid,
                    address: Some(key.to_string()),
                })
            }
            _ => Err(malformed()),
        }
    }
}

/// The canonical identity of the authenticated user.
///
/// Exactly one is active at a time per orchestrator instance. The `metadata`
/// map carries chain-specific extras (wallet `address`, Tezos `publicKey`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// The user's DID
    pub did: String,
    /// Chain the identity was authenticated on
    pub chain: Chain,
    /// Authenticator-provided metadata (address, public key, ...)
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl AuthenticatedUser {
    /// The signing address recorded by the authenticator, if any.
    pub fn address(&self) -> Option<&str> {
        self.metadata.get("address").and_then(|v| v.as_str())
    }

    /// Check a candidate address against this identity, using the chain's
    /// case rule. `false` when no address is recorded.
    pub fn matches_address(&self, candidate: &str) -> bool {
        self.address()
            .map(|addr| self.chain.addresses_equal(addr, candidate))
            .unwrap_or(false)
    }
}

/// The signed authentication artifact an encryption backend consumes.
///
/// Field names are the backend wire format; [`crate::effects`] collaborators
/// validate this structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSig {
    /// Hex-encoded signature
    pub sig: String,
    /// Derivation method tag identifying how the signature is verifiable
    pub derived_via: String,
    /// Canonical serialized message that was signed
    pub signed_message: String,
    /// Signing address
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_evm_pkh_did() {
        let id =
            ChainIdentity::from_did("did:pkh:eip155:1:0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B")
                .unwrap();
        assert_eq!(id.chain, Chain::Evm);
        assert_eq!(
            id.address.as_deref(),
            Some("0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B")
        );
    }

    #[test]
    fn parses_solana_pkh_did() {
        let id = ChainIdentity::from_did(
            "did:pkh:solana:4sGjMW1sUnHzSxGspuhpqLDx6wiyjNtZ:7S3P4HxJpyyigGzodYwHtCxZyUQe9JiBMHyRWXArAaKv",
        )
        .unwrap();
        assert_eq!(id.chain, Chain::Solana);
        assert_eq!(
            id.address.as_deref(),
            Some("7S3P4HxJpyyigGzodYwHtCxZyUQe9JiBMHyRWXArAaKv")
        );
    }

    #[test]
    fn parses_key_did() {
        let id = ChainIdentity::from_did("did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK")
            .unwrap();
        assert_eq!(id.chain, Chain::KeyDid);
        assert!(id.address.is_some());
    }

    #[test]
    fn rejects_unknown_schemes() {
        for did in [
            "did:web:example.com",
            "did:pkh:cosmos:cosmoshub-3:cosmos1xyz",
            "did:pkh:eip155:1",
            "not-a-did",
            "did:pkh",
        ] {
            assert!(
                matches!(
                    ChainIdentity::from_did(did),
                    Err(StrataError::MalformedIdentifier { .. })
                ),
                "expected {did} to be rejected"
            );
        }
    }

    #[test]
    fn evm_addresses_compare_case_insensitively() {
        assert!(Chain::Evm.addresses_equal("0xABCDEF", "0xabcdef"));
        assert!(!Chain::Solana.addresses_equal("Addr", "addr"));
    }

    #[test]
    fn user_address_matching_uses_chain_case_rule() {
        let mut metadata = serde_json::Map::new();
        metadata.insert("address".into(), serde_json::json!("0xAbC123"));
        let user = AuthenticatedUser {
            did: "did:pkh:eip155:1:0xAbC123".into(),
            chain: Chain::Evm,
            metadata,
        };

        assert!(user.matches_address("0xabc123"));

        let user_sol = AuthenticatedUser {
            chain: Chain::Solana,
            ..user
        };
        assert!(!user_sol.matches_address("0xabc123"));
        assert!(user_sol.matches_address("0xAbC123"));
    }
}
