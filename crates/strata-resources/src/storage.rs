//! Storage resource
//!
//! Ceramic-shaped document storage. Accepts every chain family: wallets
//! authenticate with a signed SIWX message, local-key authenticators bind
//! their seed session directly. Document writes require an active session.

use async_trait::async_trait;
use std::sync::Arc;

use crate::resource::AuthenticatedResource;
use tokio::sync::Mutex;

use strata_core::effects::{Document, DocumentId, DocumentMetadata, DocumentStore};
use strata_core::{AuthenticatedUser, Chain, ResourceKind, ResourceScope, Result, StrataError};
use strata_sessions::{Authenticator, KeySession, SignedSession, SiwxOverrides};

/// Chains the storage network can authorize.
const SUPPORTED_CHAINS: [Chain; 5] = [
    Chain::Evm,
    Chain::Solana,
    Chain::Tezos,
    Chain::Stacks,
    Chain::KeyDid,
];

/// A storage session in either of its two forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSession {
    /// Seed-derived local key session
    Key(KeySession),
    /// Wallet-signed session
    Signed(SignedSession),
}

impl StorageSession {
    /// Serialize to the persisted string form.
    pub fn serialize(&self) -> Result<String> {
        match self {
            StorageSession::Key(key) => Ok(key.serialize()),
            StorageSession::Signed(signed) => signed.serialize(),
        }
    }

    /// Parse the persisted string form, dispatching on its shape.
    pub fn deserialize(serialized: &str) -> Result<Self> {
        if KeySession::matches_serialized(serialized) {
            Ok(StorageSession::Key(KeySession::deserialize(serialized)?))
        } else {
            Ok(StorageSession::Signed(SignedSession::deserialize(
                serialized,
            )?))
        }
    }
}

#[derive(Default)]
struct StorageState {
    connected: bool,
    user: Option<AuthenticatedUser>,
    session: Option<StorageSession>,
}

/// The storage capability: session state machine plus gated document I/O.
pub struct StorageResource {
    store: Arc<dyn DocumentStore>,
    state: Mutex<StorageState>,
}

impl StorageResource {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            state: Mutex::new(StorageState::default()),
        }
    }

    /// The held session in its structured form.
    pub async fn session(&self) -> Option<StorageSession> {
        self.state.lock().await.session.clone()
    }

    async fn require_session(&self) -> Result<AuthenticatedUser> {
        let state = self.state.lock().await;
        match (&state.session, &state.user) {
            (Some(_), Some(user)) => Ok(user.clone()),
            _ => Err(StrataError::MissingCapability {
                resource: ResourceKind::Storage,
            }),
        }
    }

    /// Create a document owned by the session user.
    pub async fn create_document(
        &self,
        content: serde_json::Value,
        metadata: DocumentMetadata,
    ) -> Result<DocumentId> {
        let user = self.require_session().await?;
        let id = self
            .store
            .create(Document {
                content,
                owners: vec![user.did.clone()],
                metadata,
            })
            .await?;
        tracing::debug!(document = %id, owner = %user.did, "created document");
        Ok(id)
    }

    /// Replace a document's content and metadata.
    pub async fn update_document(
        &self,
        id: &DocumentId,
        content: serde_json::Value,
        metadata: DocumentMetadata,
    ) -> Result<()> {
        let user = self.require_session().await?;
        self.store
            .update(
                id,
                Document {
                    content,
                    owners: vec![user.did],
                    metadata,
                },
            )
            .await
    }

    /// Load a document. Reads are public; no session required.
    pub async fn get_document(&self, id: &DocumentId) -> Result<Document> {
        self.store.get(id).await
    }

    async fn install(&self, user: AuthenticatedUser, session: StorageSession) {
        let mut state = self.state.lock().await;
        state.user = Some(user);
        state.session = Some(session);
    }

    async fn ensure_connected(&self) -> Result<()> {
        let state = self.state.lock().await;
        if !state.connected {
            return Err(StrataError::connection(
                ResourceKind::Storage,
                "resource is not connected, call connect() first",
            ));
        }
        Ok(())
    }

    /// Extract the public key a Tezos wallet exposes alongside its address.
    fn tezos_public_key(user: &AuthenticatedUser) -> Result<String> {
        user.metadata
            .get("publicKey")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| StrataError::invalid("tezos wallet did not expose a public key"))
    }
}

#[async_trait]
impl AuthenticatedResource for StorageResource {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Storage
    }

    fn scope(&self) -> ResourceScope {
        ResourceScope {
            id: "ceramic".to_string(),
            user_friendly_name: "Ceramic Network".to_string(),
            resource_type: ResourceKind::Storage,
            siwx_resources: vec!["ceramic://*".to_string()],
        }
    }

    fn supported_chains(&self) -> &'static [Chain] {
        &SUPPORTED_CHAINS
    }

    async fn connect(&self) -> Result<()> {
        // The document store handle is injected; connecting only flips the
        // gate that authorize and set_session check.
        self.state.lock().await.connected = true;
        Ok(())
    }

    async fn authorize(
        &self,
        authenticator: &Authenticator,
        overrides: Option<&SiwxOverrides>,
    ) -> Result<String> {
        self.ensure_connected().await?;

        let user = authenticator.user_information().await?;
        if !self.supports_chain(user.chain) {
            return Err(StrataError::UnsupportedChain {
                chain: user.chain,
                resource: ResourceKind::Storage,
            });
        }

        let session = if authenticator.supports_signing() {
            // The SIWX uri names a fresh session key DID, and EVM addresses
            // are lowercased in the signed message.
            let session_key = KeySession::generate();
            let mut merged = overrides.cloned().unwrap_or_default();
            merged = merged.with_uri(session_key.derived_did());
            if user.chain == Chain::Evm {
                if let Some(address) = user.address() {
                    merged = merged.with_address(address.to_lowercase());
                }
            }

            let signed = authenticator
                .authenticate_signed(&self.scope(), Some(&merged))
                .await?;

            // Tezos signature verification needs the account public key, so
            // it travels appended to the signature.
            let signature = if user.chain == Chain::Tezos {
                format!("{}{}", signed.signature, Self::tezos_public_key(&user)?)
            } else {
                signed.signature
            };

            StorageSession::Signed(SignedSession::new(
                signed.chain,
                signature,
                signed.serialized,
                signed.address,
            )?)
        } else {
            StorageSession::Key(authenticator.authenticate_key()?)
        };

        let serialized = session.serialize()?;
        tracing::info!(did = %user.did, chain = %user.chain, "authorized storage session");
        self.install(user, session).await;
        Ok(serialized)
    }

    async fn set_session(&self, user: &AuthenticatedUser, serialized: &str) -> Result<()> {
        self.ensure_connected().await?;

        let session = StorageSession::deserialize(serialized)?;
        let verification = match &session {
            StorageSession::Key(key) => {
                let derived = key.derived_did();
                if derived == user.did {
                    Ok(())
                } else {
                    Err(format!(
                        "session key derives {derived}, expected {}",
                        user.did
                    ))
                }
            }
            StorageSession::Signed(signed) => match user.address() {
                Some(address) if signed.chain().addresses_equal(signed.address(), address) => {
                    Ok(())
                }
                Some(address) => Err(format!(
                    "session was signed by {}, expected {address}",
                    signed.address()
                )),
                None => Err("user identity carries no signing address".to_string()),
            },
        };

        if let Err(detail) = verification {
            self.clear_session().await;
            tracing::warn!(did = %user.did, "rejected restored storage session: {detail}");
            return Err(StrataError::identity_mismatch(ResourceKind::Storage, detail));
        }

        self.install(user.clone(), session).await;
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
            .map(StorageSession::serialize)
            .transpose()
    }

    async fn user(&self) -> Option<AuthenticatedUser> {
        self.state.lock().await.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_sessions::KeyAuthenticator;
    use strata_testkit::{MemoryDocumentStore, TestWallet};

    fn storage() -> StorageResource {
        StorageResource::new(Arc::new(MemoryDocumentStore::new()))
    }

    async fn connected_storage() -> StorageResource {
        let resource = storage();
        resource.connect().await.unwrap();
        resource
    }

    #[tokio::test]
    async fn wallet_authorization_installs_signed_session() {
        let resource = connected_storage().await;
        let auth = Authenticator::Wallet(Arc::new(TestWallet::evm("0xAbCd000000000000000000000000000000000001")));

        let serialized = resource.authorize(&auth, None).await.unwrap();
        let user = auth.user_information().await.unwrap();

        assert!(resource.is_current_user(&user).await);
        let session = StorageSession::deserialize(&serialized).unwrap();
        match session {
            StorageSession::Signed(signed) => {
                assert_eq!(signed.chain(), Chain::Evm);
                // the signed message carries the lowercased address
                assert_eq!(
                    signed.address(),
                    "0xabcd000000000000000000000000000000000001"
                );
            }
            StorageSession::Key(_) => panic!("expected a signed session"),
        }
    }

    #[tokio::test]
    async fn key_authorization_installs_seed_session() {
        let resource = connected_storage().await;
        let auth = Authenticator::LocalKey(KeyAuthenticator::generate());

        let serialized = resource.authorize(&auth, None).await.unwrap();
        assert!(serialized.starts_with("did:key:session:"));

        let user = resource.user().await.unwrap();
        assert_eq!(user.chain, Chain::KeyDid);
        assert!(user.did.starts_with("did:key:z"));
    }

    #[tokio::test]
    async fn authorize_requires_connect() {
        let resource = storage();
        let auth = Authenticator::LocalKey(KeyAuthenticator::generate());
        let err = resource.authorize(&auth, None).await.unwrap_err();
        assert!(matches!(err, StrataError::Connection { .. }));
    }

    #[tokio::test]
    async fn restored_key_session_must_match_user_did() {
        let resource = connected_storage().await;
        let session = KeySession::generate();

        let stranger = Authenticator::LocalKey(KeyAuthenticator::generate())
            .user_information()
            .await
            .unwrap();

        let err = resource
            .set_session(&stranger, &session.serialize())
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::SessionIdentityMismatch { .. }));
        assert!(resource.session().await.is_none());
    }

    #[tokio::test]
    async fn restored_evm_session_matches_case_insensitively() {
        let resource = connected_storage().await;
        let wallet = Authenticator::Wallet(Arc::new(TestWallet::evm(
            "0xAbCd000000000000000000000000000000000001",
        )));
        let serialized = resource.authorize(&wallet, None).await.unwrap();
        resource.clear_session().await;

        // the serialized session carries the lowercased address; the user
        // identity keeps the checksum-cased one
        let user = wallet.user_information().await.unwrap();
        resource.set_session(&user, &serialized).await.unwrap();
        assert!(resource.is_current_user(&user).await);
    }

    #[tokio::test]
    async fn tezos_signature_carries_public_key() {
        let resource = connected_storage().await;
        let wallet = Authenticator::Wallet(Arc::new(TestWallet::tezos(
            "tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb",
            "edpkuBknW28nW72KG6RoH",
        )));

        resource.authorize(&wallet, None).await.unwrap();
        match resource.session().await.unwrap() {
            StorageSession::Signed(signed) => {
                assert!(signed.auth_sig().sig.ends_with("edpkuBknW28nW72KG6RoH"));
            }
            StorageSession::Key(_) => panic!("expected a signed session"),
        }
    }

    #[tokio::test]
    async fn document_writes_require_a_session() {
        let resource = connected_storage().await;
        let err = resource
            .create_document(
                serde_json::json!({"hello": "world"}),
                DocumentMetadata::strata("schema", &["post"]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StrataError::MissingCapability { .. }));
    }

    #[tokio::test]
    async fn documents_are_owned_by_the_session_user() {
        let resource = connected_storage().await;
        let auth = Authenticator::LocalKey(KeyAuthenticator::generate());
        resource.authorize(&auth, None).await.unwrap();

        let id = resource
            .create_document(
                serde_json::json!({"body": "hello"}),
                DocumentMetadata::strata("schema", &["post"]),
            )
            .await
            .unwrap();

        let doc = resource.get_document(&id).await.unwrap();
        let user = resource.user().await.unwrap();
        assert_eq!(doc.owners, vec![user.did]);
    }
}
