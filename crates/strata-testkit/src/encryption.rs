//! Mock encryption backend.
//!
//! Content encryption is a keyed XOR over base64, which is reversible and
//! obviously not secure. Key release walks the stored conditions and only
//! hands the key back when an address-equality condition names the caller's
//! address, so revocation scenarios behave like a real gating service.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use std::sync::Mutex;

use strata_core::errors::{Result, StrataError};
use strata_core::{AuthSig, Chain};
use strata_gating::{
    CompiledCondition, ConditionSet, EncryptedPayload, EncryptionBackend,
};

const SEAL_TAG: &[u8] = b"sealed:";

#[derive(Debug, Default)]
pub struct MockEncryptionBackend {
    fail_connect: Mutex<bool>,
    connect_calls: Mutex<u32>,
    key_counter: Mutex<u64>,
}

impl MockEncryptionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `connect` fail until cleared.
    pub fn set_fail_connect(&self, fail: bool) {
        *self.fail_connect.lock().unwrap() = fail;
    }

    pub fn connect_calls(&self) -> u32 {
        *self.connect_calls.lock().unwrap()
    }

    fn next_key(&self) -> Vec<u8> {
        let mut counter = self.key_counter.lock().unwrap();
        *counter += 1;
        Sha256::digest(counter.to_be_bytes()).to_vec()
    }
}

fn xor_with_key(bytes: &[u8], key: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .zip(key.iter().cycle())
        .map(|(b, k)| b ^ k)
        .collect()
}

/// True when any condition in the tree grants the address via a direct
/// equality test (the shape produced for DID recipients).
fn grants_address(conditions: &[CompiledCondition], address: &str) -> bool {
    conditions.iter().any(|condition| match condition {
        CompiledCondition::Evm(evm) => {
            evm.return_value_test.comparator == "="
                && evm.return_value_test.value.eq_ignore_ascii_case(address)
        }
        CompiledCondition::Sol(sol) => {
            sol.return_value_test.comparator == "=" && sol.return_value_test.value == address
        }
        CompiledCondition::Group(inner) => grants_address(inner, address),
        CompiledCondition::Operator { .. } => false,
    })
}

#[async_trait]
impl EncryptionBackend for MockEncryptionBackend {
    fn id(&self) -> &str {
        "mock"
    }

    async fn connect(&self) -> Result<()> {
        *self.connect_calls.lock().unwrap() += 1;
        if *self.fail_connect.lock().unwrap() {
            return Err(StrataError::connection(
                strata_core::ResourceKind::Encryption,
                "mock backend offline",
            ));
        }
        Ok(())
    }

    async fn encrypt_content(&self, plaintext: &[u8]) -> Result<EncryptedPayload> {
        let symmetric_key = self.next_key();
        let cipher_text = BASE64.encode(xor_with_key(plaintext, &symmetric_key));
        Ok(EncryptedPayload {
            cipher_text,
            symmetric_key,
        })
    }

    async fn decrypt_content(&self, cipher_text: &str, symmetric_key: &[u8]) -> Result<Vec<u8>> {
        let bytes = BASE64
            .decode(cipher_text)
            .map_err(|e| StrataError::decryption(format!("ciphertext is not base64: {e}")))?;
        Ok(xor_with_key(&bytes, symmetric_key))
    }

    async fn save_encryption_key(
        &self,
        _auth: &AuthSig,
        _chain: Chain,
        symmetric_key: &[u8],
        conditions: &[CompiledCondition],
    ) -> Result<Vec<u8>> {
        if conditions.is_empty() {
            return Err(StrataError::EmptyAccessConditions);
        }
        let mut sealed = SEAL_TAG.to_vec();
        sealed.extend_from_slice(symmetric_key);
        Ok(sealed)
    }

    async fn get_encryption_key(
        &self,
        auth: &AuthSig,
        _chain: Chain,
        encrypted_key: &[u8],
        conditions: &ConditionSet,
    ) -> Result<Vec<u8>> {
        let key = encrypted_key
            .strip_prefix(SEAL_TAG)
            .ok_or_else(|| StrataError::decryption("sealed key has an unknown format"))?;
        let granted = [&conditions.evm, &conditions.solana, &conditions.unified]
            .into_iter()
            .flatten()
            .any(|family| grants_address(family, &auth.address));
        if !granted {
            return Err(StrataError::decryption(format!(
                "conditions do not grant {}",
                auth.address
            )));
        }
        Ok(key.to_vec())
    }
}
