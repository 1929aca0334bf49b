//! Encryption backend boundary
//!
//! The backend owns the cryptographic primitives (symmetric encryption and
//! distributed key custody). This core treats "encrypt bytes" and "release a
//! key when conditions hold" as opaque capabilities and only specifies their
//! signatures.

use crate::conditions::CompiledCondition;
use crate::envelope::ConditionSet;
use async_trait::async_trait;
use strata_core::{AuthSig, Chain, Result};

/// Result of a content encryption: transport-encoded ciphertext plus the
/// symmetric key that must be sealed with the backend before storage.
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    /// Base64 ciphertext
    pub cipher_text: String,
    /// Raw symmetric key bytes
    pub symmetric_key: Vec<u8>,
}

/// Content-encryption service boundary.
#[async_trait]
pub trait EncryptionBackend: Send + Sync {
    /// Stable backend identifier recorded in envelopes (e.g. `"lit"`).
    fn id(&self) -> &str;

    /// Establish the backend connection. Idempotent; failures surface as
    /// [`strata_core::StrataError::Connection`].
    async fn connect(&self) -> Result<()>;

    /// Encrypt content under a fresh symmetric key.
    async fn encrypt_content(&self, plaintext: &[u8]) -> Result<EncryptedPayload>;

    /// Decrypt content with a released symmetric key.
    async fn decrypt_content(&self, cipher_text: &str, symmetric_key: &[u8]) -> Result<Vec<u8>>;

    /// Seal a symmetric key under the compiled conditions, returning the
    /// encrypted key bytes to persist.
    async fn save_encryption_key(
        &self,
        auth: &AuthSig,
        chain: Chain,
        symmetric_key: &[u8],
        conditions: &[CompiledCondition],
    ) -> Result<Vec<u8>>;

    /// Request release of a sealed symmetric key; the backend validates the
    /// conditions against the authenticated identity.
    async fn get_encryption_key(
        &self,
        auth: &AuthSig,
        chain: Chain,
        encrypted_key: &[u8],
        conditions: &ConditionSet,
    ) -> Result<Vec<u8>>;
}
