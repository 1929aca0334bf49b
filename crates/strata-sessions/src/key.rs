//! Direct-key sessions
//!
//! A [`KeySession`] wraps a 32-byte random seed. The seed deterministically
//! derives an ed25519 `did:key` identifier, so a restored session can be
//! re-verified against a user's DID without any network access.

use ed25519_dalek::SigningKey;
use rand::RngCore;
use std::fmt;
use strata_core::{Result, StrataError};

/// Serialization prefix for key sessions.
const SESSION_PREFIX: &str = "did:key:session:";

/// Multicodec prefix for an ed25519 public key (0xed varint-encoded).
const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// A session backed by a local key seed.
#[derive(Clone, PartialEq, Eq)]
pub struct KeySession {
    seed: [u8; 32],
}

impl KeySession {
    /// Create a session from an existing seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { seed }
    }

    /// Generate a session with a fresh random seed.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self { seed }
    }

    /// The raw seed.
    pub fn seed(&self) -> &[u8; 32] {
        &self.seed
    }

    /// Deterministically derive the `did:key` identifier for this seed.
    ///
    /// Identical seeds always yield identical identifiers: the seed is the
    /// ed25519 secret key, and the DID is the multibase (base58btc) encoding
    /// of the multicodec-prefixed public key.
    pub fn derived_did(&self) -> String {
        let verifying_key = SigningKey::from_bytes(&self.seed).verifying_key();

        let mut prefixed = Vec::with_capacity(2 + 32);
        prefixed.extend_from_slice(&ED25519_MULTICODEC);
        prefixed.extend_from_slice(verifying_key.as_bytes());

        format!("did:key:z{}", bs58::encode(prefixed).into_string())
    }

    /// Whether a persisted string is in the key-session format.
    pub fn matches_serialized(serialized: &str) -> bool {
        serialized.starts_with(SESSION_PREFIX)
    }

    /// Serialize to the persisted string form.
    pub fn serialize(&self) -> String {
        format!("{SESSION_PREFIX}{}", hex::encode(self.seed))
    }

    /// Parse the persisted string form.
    pub fn deserialize(serialized: &str) -> Result<Self> {
        let seed_hex = serialized.strip_prefix(SESSION_PREFIX).ok_or_else(|| {
            StrataError::UnrecognizedSessionFormat {
                message: "missing key session prefix".to_string(),
            }
        })?;

        let bytes =
            hex::decode(seed_hex).map_err(|err| StrataError::UnrecognizedSessionFormat {
                message: format!("seed is not valid hex: {err}"),
            })?;

        let seed: [u8; 32] =
            bytes
                .try_into()
                .map_err(|_| StrataError::UnrecognizedSessionFormat {
                    message: "seed must be exactly 32 bytes".to_string(),
                })?;

        Ok(Self { seed })
    }
}

impl fmt::Debug for KeySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log the seed.
        f.debug_struct("KeySession")
            .field("did", &self.derived_did())
            .finish_non_exhaustive()
    }
}
