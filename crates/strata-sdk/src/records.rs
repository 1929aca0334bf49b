//! Content operations
//!
//! Profile and record writes on top of the authenticated capabilities.
//! Records carry their body in the clear, or as an indexed encrypted record
//! when access rules are attached; decrypt-on-read supports a per-item
//! degradation policy so one revoked recipient never sinks a whole page.

use serde::{Deserialize, Serialize};

use strata_core::effects::{DocumentId, DocumentMetadata, IndexTarget};
use strata_core::{AuthenticatedUser, ResourceKind, Result, StrataError};
use strata_gating::{AccessRule, EncryptedEnvelope, IndexedEncryptedRecord};

use crate::client::{IndexingTicket, StrataClient};

/// Schema identifier for profile documents.
pub const PROFILE_SCHEMA: &str = "strata/profile";
/// Schema identifier for record documents.
pub const RECORD_SCHEMA: &str = "strata/record";
/// Schema identifier for encrypted profile emails.
pub const ENCRYPTED_EMAIL_SCHEMA: &str = "strata/encrypted-email";

/// A user-authored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Optional title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Plaintext body; emptied when the body is encrypted
    #[serde(default)]
    pub body: String,
    /// Encrypted body in its stored form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_body: Option<IndexedEncryptedRecord>,
}

impl Record {
    /// A plain-body record.
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    /// A titled record.
    pub fn titled(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: body.into(),
            encrypted_body: None,
        }
    }
}

/// How batch decryption treats per-item failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecryptPolicy {
    /// Log each failure and degrade that item; other items still decrypt
    #[default]
    Silent,
    /// Propagate the first failure
    Strict,
}

/// The body of one record after decrypt-on-read.
#[derive(Debug)]
pub enum BodyContent {
    /// Decrypted successfully
    Plain(String),
    /// Decryption failed under the silent policy; the stored encrypted body
    /// is retained untouched
    Degraded {
        /// The body as it sits in storage
        encrypted_body: IndexedEncryptedRecord,
        /// Why it could not be decrypted
        error: StrataError,
    },
    /// The record was never encrypted
    NotEncrypted(String),
}

impl BodyContent {
    /// The readable text, when there is one.
    pub fn text(&self) -> Option<&str> {
        match self {
            BodyContent::Plain(text) | BodyContent::NotEncrypted(text) => Some(text),
            BodyContent::Degraded { .. } => None,
        }
    }
}

impl StrataClient {
    /// Write a profile document and submit it for indexing.
    pub async fn update_profile(
        &self,
        content: serde_json::Value,
    ) -> Result<(DocumentId, IndexingTicket)> {
        let user = self.require_session(&[ResourceKind::Storage]).await?;
        let id = self
            .storage()
            .create_document(content, DocumentMetadata::strata(PROFILE_SCHEMA, &["profile"]))
            .await?;
        let ticket = self.spawn_profile_indexing(&user);
        Ok((id, ticket))
    }

    /// Store a profile email encrypted to the indexing node and the caller.
    pub async fn set_profile_email(
        &self,
        email: &str,
    ) -> Result<(DocumentId, IndexingTicket)> {
        let user = self
            .require_session(&[ResourceKind::Storage, ResourceKind::Encryption])
            .await?;

        let rules = [AccessRule::dids([
            self.indexer_did().to_string(),
            user.did.clone(),
        ])];
        let envelope = self
            .encryption_resource()?
            .encrypt_string(email, &rules)
            .await?;

        let content = serde_json::json!({ "encryptedEmail": envelope.to_indexed()? });
        let id = self
            .storage()
            .create_document(
                content,
                DocumentMetadata::strata(ENCRYPTED_EMAIL_SCHEMA, &["email"]),
            )
            .await?;
        let ticket = self.spawn_profile_indexing(&user);
        Ok((id, ticket))
    }

    /// Create a record, encrypting its body when access rules are given.
    pub async fn create_record(
        &self,
        record: Record,
        rules: Option<&[AccessRule]>,
    ) -> Result<(DocumentId, IndexingTicket)> {
        let (record, _user) = self.prepare_record(record, rules).await?;
        let id = self
            .storage()
            .create_document(
                serde_json::to_value(&record)?,
                DocumentMetadata::strata(RECORD_SCHEMA, &["record"]),
            )
            .await?;
        let ticket = self.spawn_indexing(id.0.clone(), IndexTarget::Document);
        Ok((id, ticket))
    }

    /// Replace a record, encrypting its body when access rules are given.
    pub async fn update_record(
        &self,
        id: &DocumentId,
        record: Record,
        rules: Option<&[AccessRule]>,
    ) -> Result<IndexingTicket> {
        let (record, _user) = self.prepare_record(record, rules).await?;
        self.storage()
            .update_document(
                id,
                serde_json::to_value(&record)?,
                DocumentMetadata::strata(RECORD_SCHEMA, &["record"]),
            )
            .await?;
        Ok(self.spawn_indexing(id.0.clone(), IndexTarget::Document))
    }

    /// Tombstone a record in place.
    pub async fn delete_record(&self, id: &DocumentId) -> Result<IndexingTicket> {
        self.require_session(&[ResourceKind::Storage]).await?;
        self.storage()
            .update_document(
                id,
                serde_json::json!({ "deleted": true }),
                DocumentMetadata::strata(RECORD_SCHEMA, &["deleted"]),
            )
            .await?;
        Ok(self.spawn_indexing(id.0.clone(), IndexTarget::Document))
    }

    /// Decrypt one record's body.
    pub async fn decrypt_record(&self, record: &Record) -> Result<String> {
        self.require_session(&[ResourceKind::Encryption]).await?;
        let indexed = record
            .encrypted_body
            .as_ref()
            .ok_or_else(|| StrataError::invalid("record carries no encrypted body"))?;
        let envelope = EncryptedEnvelope::from_indexed(indexed)?;
        self.encryption_resource()?.decrypt_string(&envelope).await
    }

    /// Decrypt a batch of records, one [`BodyContent`] per input record.
    pub async fn decrypt_records(
        &self,
        records: &[Record],
        policy: DecryptPolicy,
    ) -> Result<Vec<BodyContent>> {
        self.require_session(&[ResourceKind::Encryption]).await?;
        let encryption = self.encryption_resource()?;

        let mut bodies = Vec::with_capacity(records.len());
        for record in records {
            let Some(indexed) = record.encrypted_body.as_ref() else {
                bodies.push(BodyContent::NotEncrypted(record.body.clone()));
                continue;
            };

            let decrypted = match EncryptedEnvelope::from_indexed(indexed) {
                Ok(envelope) => encryption.decrypt_string(&envelope).await,
                Err(err) => Err(err),
            };

            match (decrypted, policy) {
                (Ok(text), _) => bodies.push(BodyContent::Plain(text)),
                (Err(err), DecryptPolicy::Strict) => return Err(err),
                (Err(err), DecryptPolicy::Silent) => {
                    tracing::warn!("degrading undecryptable record: {err}");
                    bodies.push(BodyContent::Degraded {
                        encrypted_body: indexed.clone(),
                        error: err,
                    });
                }
            }
        }
        Ok(bodies)
    }

    /// Encrypt the body in place when rules are attached, gating on the
    /// capabilities the write needs.
    async fn prepare_record(
        &self,
        mut record: Record,
        rules: Option<&[AccessRule]>,
    ) -> Result<(Record, AuthenticatedUser)> {
        let user = match rules {
            Some(_) => {
                self.require_session(&[ResourceKind::Storage, ResourceKind::Encryption])
                    .await?
            }
            None => self.require_session(&[ResourceKind::Storage]).await?,
        };

        if let Some(rules) = rules {
            if record.body.is_empty() {
                return Err(StrataError::invalid(
                    "record body is empty, nothing to encrypt",
                ));
            }
            let envelope = self
                .encryption_resource()?
                .encrypt_string(&record.body, rules)
                .await?;
            record.encrypted_body = Some(envelope.to_indexed()?);
            record.body = String::new();
        }

        Ok((record, user))
    }
}
