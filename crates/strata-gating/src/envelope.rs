//! Encrypted-envelope storage codec
//!
//! An [`EncryptedEnvelope`] is what encryption produces and decryption
//! consumes. For storage it flattens into an [`IndexedEncryptedRecord`]:
//! condition families become JSON strings in named fields, and absent
//! families stay absent (never empty arrays) so the record round-trips
//! without information loss.

use crate::conditions::CompiledCondition;
use serde::{Deserialize, Serialize};
use strata_core::{Result, StrataError};

/// Content descriptor for encrypted files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentKind {
    /// Original file name
    pub name: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// Compiled conditions split by family.
///
/// The backend accepts each family through a separate named field; at least
/// one must be present for decryption to be possible.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionSet {
    /// EVM-family conditions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evm: Option<Vec<CompiledCondition>>,
    /// Solana conditions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solana: Option<Vec<CompiledCondition>>,
    /// Mixed-family (unified) conditions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unified: Option<Vec<CompiledCondition>>,
}

impl ConditionSet {
    /// A set holding only unified conditions, the shape the compiler emits.
    pub fn unified(conditions: Vec<CompiledCondition>) -> Self {
        Self {
            unified: Some(conditions),
            ..Self::default()
        }
    }

    /// True when no family is present.
    pub fn is_empty(&self) -> bool {
        self.evm.is_none() && self.solana.is_none() && self.unified.is_none()
    }
}

/// Cipher material plus the conditions it was sealed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    /// Backend identifier that produced this envelope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Base64 ciphertext of the content
    pub cipher_text: String,
    /// Hex-encoded encrypted symmetric key
    pub symmetric_key_cipher: String,
    /// Conditions gating key release
    pub conditions: ConditionSet,
    /// File descriptor, for encrypted files only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_kind: Option<ContentKind>,
}

/// The flat, JSON-serializable storage form of an envelope.
///
/// Field names are the indexed row format and must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedEncryptedRecord {
    /// Backend identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Base64 ciphertext
    pub encrypted_string: String,
    /// Hex-encoded encrypted symmetric key
    pub encrypted_symmetric_key: String,
    /// EVM condition family, JSON-encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_control_conditions: Option<String>,
    /// Solana condition family, JSON-encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sol_rpc_conditions: Option<String>,
    /// Unified condition family, JSON-encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_control_conditions: Option<String>,
    /// File descriptor for encrypted files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_metadata: Option<ContentKind>,
}

impl EncryptedEnvelope {
    /// Flatten into the storable record form.
    pub fn to_indexed(&self) -> Result<IndexedEncryptedRecord> {
        let encode = |family: &Option<Vec<CompiledCondition>>| -> Result<Option<String>> {
            family
                .as_ref()
                .map(|conditions| serde_json::to_string(conditions).map_err(StrataError::from))
                .transpose()
        };

        Ok(IndexedEncryptedRecord {
            client: self.client.clone(),
            encrypted_string: self.cipher_text.clone(),
            encrypted_symmetric_key: self.symmetric_key_cipher.clone(),
            access_control_conditions: encode(&self.conditions.evm)?,
            sol_rpc_conditions: encode(&self.conditions.solana)?,
            unified_control_conditions: encode(&self.conditions.unified)?,
            content_metadata: self.content_kind.clone(),
        })
    }

    /// Rebuild an envelope from its storable record form.
    pub fn from_indexed(record: &IndexedEncryptedRecord) -> Result<Self> {
        let decode = |family: &Option<String>| -> Result<Option<Vec<CompiledCondition>>> {
            family
                .as_ref()
                .map(|json| serde_json::from_str(json).map_err(StrataError::from))
                .transpose()
        };

        Ok(EncryptedEnvelope {
            client: record.client.clone(),
            cipher_text: record.encrypted_string.clone(),
            symmetric_key_cipher: record.encrypted_symmetric_key.clone(),
            conditions: ConditionSet {
                evm: decode(&record.access_control_conditions)?,
                solana: decode(&record.sol_rpc_conditions)?,
                unified: decode(&record.unified_control_conditions)?,
            },
            content_kind: record.content_metadata.clone(),
        })
    }
}
