//! Encryption resource
//!
//! Wraps a key-custody encryption backend (Lit-shaped). Only signing
//! authenticators on EVM or Solana can authorize; the backend connection is
//! established lazily, so a user without the encryption capability never
//! pays for (or fails on) it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::resource::AuthenticatedResource;
use strata_core::{AuthenticatedUser, Chain, ResourceKind, ResourceScope, Result, StrataError};
use strata_gating::{
    compile, AccessRule, ConditionSet, ContentKind, EncryptedEnvelope, EncryptionBackend,
};
use strata_sessions::{Authenticator, SignedSession, SiwxOverrides};

const SUPPORTED_CHAINS: [Chain; 2] = [Chain::Evm, Chain::Solana];

#[derive(Default)]
struct EncryptionState {
    connected: bool,
    user: Option<AuthenticatedUser>,
    session: Option<SignedSession>,
}

/// The encryption capability: session state machine plus the encrypt and
/// decrypt operations gated on it.
pub struct EncryptionResource {
    backend: Arc<dyn EncryptionBackend>,
    state: Mutex<EncryptionState>,
}

impl EncryptionResource {
    pub fn new(backend: Arc<dyn EncryptionBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(EncryptionState::default()),
        }
    }

    /// The held session in its structured form.
    pub async fn session(&self) -> Option<SignedSession> {
        self.state.lock().await.session.clone()
    }

    async fn require_session(&self) -> Result<SignedSession> {
        self.state
            .lock()
            .await
            .session
            .clone()
            .ok_or(StrataError::MissingCapability {
                resource: ResourceKind::Encryption,
            })
    }

    /// Encrypt content under compiled access rules.
    ///
    /// Compilation yielding no conditions is refused: sealing a key under an
    /// empty condition set would make the content undecryptable for everyone.
    pub async fn encrypt(
        &self,
        plaintext: &[u8],
        rules: &[AccessRule],
        content_kind: Option<ContentKind>,
    ) -> Result<EncryptedEnvelope> {
        self.connect().await?;
        let session = self.require_session().await?;

        let conditions = compile(rules);
        if conditions.is_empty() {
            return Err(StrataError::EmptyAccessConditions);
        }

        let payload = self.backend.encrypt_content(plaintext).await?;
        let sealed_key = self
            .backend
            .save_encryption_key(
                session.auth_sig(),
                session.chain(),
                &payload.symmetric_key,
                &conditions,
            )
            .await?;

        tracing::debug!(
            chain = %session.chain(),
            conditions = conditions.len(),
            "encrypted content"
        );

        Ok(EncryptedEnvelope {
            client: Some(self.backend.id().to_string()),
            cipher_text: payload.cipher_text,
            symmetric_key_cipher: hex::encode(sealed_key),
            conditions: ConditionSet::unified(conditions),
            content_kind,
        })
    }

    /// Convenience wrapper for string content.
    pub async fn encrypt_string(
        &self,
        plaintext: &str,
        rules: &[AccessRule],
    ) -> Result<EncryptedEnvelope> {
        self.encrypt(plaintext.as_bytes(), rules, None).await
    }

    /// Request key release for an envelope and decrypt its content.
    pub async fn decrypt(&self, envelope: &EncryptedEnvelope) -> Result<Vec<u8>> {
        self.connect().await?;
        let session = self.require_session().await?;

        let sealed_key = hex::decode(&envelope.symmetric_key_cipher)
            .map_err(|e| StrataError::decryption(format!("sealed key is not hex: {e}")))?;

        let symmetric_key = self
            .backend
            .get_encryption_key(
                session.auth_sig(),
                session.chain(),
                &sealed_key,
                &envelope.conditions,
            )
            .await?;

        self.backend
            .decrypt_content(&envelope.cipher_text, &symmetric_key)
            .await
    }

    /// Decrypt an envelope and decode the content as UTF-8.
    pub async fn decrypt_string(&self, envelope: &EncryptedEnvelope) -> Result<String> {
        let bytes = self.decrypt(envelope).await?;
        String::from_utf8(bytes)
            .map_err(|e| StrataError::decryption(format!("content is not valid UTF-8: {e}")))
    }
}

#[async_trait]
impl AuthenticatedResource for EncryptionResource {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Encryption
    }

    fn scope(&self) -> ResourceScope {
        ResourceScope {
            id: self.backend.id().to_string(),
            user_friendly_name: "Encryption service".to_string(),
            resource_type: ResourceKind::Encryption,
            siwx_resources: Vec::new(),
        }
    }

    fn supported_chains(&self) -> &'static [Chain] {
        &SUPPORTED_CHAINS
    }

    async fn connect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.connected {
            return Ok(());
        }
        self.backend.connect().await?;
        state.connected = true;
        Ok(())
    }

    async fn authorize(
        &self,
        authenticator: &Authenticator,
        overrides: Option<&SiwxOverrides>,
    ) -> Result<String> {
        self.connect().await?;

        if !authenticator.supports_signing() {
            return Err(StrataError::unsupported_authenticator(
                ResourceKind::Encryption,
                "encryption requires a signing authenticator",
            ));
        }

        let user = authenticator.user_information().await?;
        if !self.supports_chain(user.chain) {
            return Err(StrataError::UnsupportedChain {
                chain: user.chain,
                resource: ResourceKind::Encryption,
            });
        }

        let signed = authenticator
            .authenticate_signed(&self.scope(), overrides)
            .await?;

        // The backend expects hex signatures; Solana wallets sign in base58.
        let signature = if signed.chain == Chain::Solana {
            let raw = bs58::decode(&signed.signature)
                .into_vec()
                .map_err(|e| StrataError::invalid(format!("solana signature is not base58: {e}")))?;
            hex::encode(raw)
        } else {
            signed.signature
        };

        let session =
            SignedSession::new(signed.chain, signature, signed.serialized, signed.address)?;
        let serialized = session.serialize()?;

        tracing::info!(did = %user.did, chain = %user.chain, "authorized encryption session");

        let mut state = self.state.lock().await;
        state.user = Some(user);
        state.session = Some(session);
        Ok(serialized)
    }

    async fn set_session(&self, user: &AuthenticatedUser, serialized: &str) -> Result<()> {
        self.connect().await?;

        let session = SignedSession::deserialize(serialized)?;
        if !self.supports_chain(session.chain()) {
            return Err(StrataError::UnsupportedChain {
                chain: session.chain(),
                resource: ResourceKind::Encryption,
            });
        }

        let matches = user
            .address()
            .map(|address| session.chain().addresses_equal(session.address(), address))
            .unwrap_or(false);

        if !matches {
            self.clear_session().await;
            tracing::warn!(did = %user.did, "rejected restored encryption session");
            return Err(StrataError::identity_mismatch(
                ResourceKind::Encryption,
                format!(
                    "session was signed by {}, which is not the authenticated identity",
                    session.address()
                ),
            ));
        }

        let mut state = self.state.lock().await;
        state.user = Some(user.clone());
        state.session = Some(session);
        Ok(())
    }

    async fn clear_session(&self) {
        let mut state = self.state.lock().await;
        state.user = None;
        state.session = None;
    }

    async fn is_current_user(&self, user: &AuthenticatedUser) -> bool {
        let state = self.state.lock().await;
        state.session.is_some() && state.user.as_ref() == Some(user)
    }

    async fn serialized_session(&self) -> Result<Option<String>> {
        let state = self.state.lock().await;
        state
            .session
            .as_ref()
            .map(SignedSession::serialize)
            .transpose()
    }

    async fn user(&self) -> Option<AuthenticatedUser> {
        self.state.lock().await.user.clone()
    }
}
