//! Session orchestrator
//!
//! [`StrataClient`] owns one resource per capability and drives them as a
//! group: connect authorizes the requested scopes, restore replays a
//! persisted bundle, disconnect tears everything down. Resources always keep
//! their own verdicts; the orchestrator only sequences them and persists the
//! combined outcome.

use std::sync::Arc;
use tokio::sync::Mutex;

use strata_core::effects::{DocumentStore, IndexTarget, Indexer, KeyValueStore};
use strata_core::{AuthenticatedUser, ResourceKind, Result, StrataError};
use strata_gating::EncryptionBackend;
use strata_resources::{AuthenticatedResource, EncryptionResource, StorageResource};
use strata_sessions::Authenticator;

use crate::persistence::{self, PersistedBundle, SessionSlot};

/// DID of the indexing node profile emails are shared with.
const DEFAULT_INDEXER_DID: &str = "did:pkh:eip155:1:0x9F7e1F2c8D3b4A5C6d7E8f9A0b1C2d3E4F5a6B7c";

/// Awaitable handle for a fire-and-forget indexing submission.
#[derive(Debug)]
pub struct IndexingTicket(tokio::task::JoinHandle<Result<()>>);

impl IndexingTicket {
    /// Wait for the submission to finish.
    pub async fn wait(self) -> Result<()> {
        self.0
            .await
            .map_err(|err| StrataError::indexing(format!("indexing task aborted: {err}")))?
    }
}

/// Outcome of a successful connect or restore.
#[derive(Debug)]
pub struct ConnectResult {
    /// The authenticated user every established session belongs to
    pub user: AuthenticatedUser,
    /// Capabilities with an active session, in resource order
    pub scopes: Vec<ResourceKind>,
    /// Profile indexing submission; absent for restores
    pub indexing: Option<IndexingTicket>,
}

/// The session orchestrator.
pub struct StrataClient {
    storage: StorageResource,
    encryption: Option<EncryptionResource>,
    key_value: Arc<dyn KeyValueStore>,
    indexer: Arc<dyn Indexer>,
    indexer_did: String,
    current_user: Mutex<Option<AuthenticatedUser>>,
}

impl StrataClient {
    /// Build a client with the storage capability only.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        key_value: Arc<dyn KeyValueStore>,
        indexer: Arc<dyn Indexer>,
    ) -> Self {
        Self {
            storage: StorageResource::new(store),
            encryption: None,
            key_value,
            indexer,
            indexer_did: DEFAULT_INDEXER_DID.to_string(),
            current_user: Mutex::new(None),
        }
    }

    /// Add the encryption capability.
    pub fn with_encryption(mut self, backend: Arc<dyn EncryptionBackend>) -> Self {
        self.encryption = Some(EncryptionResource::new(backend));
        self
    }

    /// Override the indexing-node DID profile emails are shared with.
    pub fn with_indexer_did(mut self, did: impl Into<String>) -> Self {
        self.indexer_did = did.into();
        self
    }

    /// The storage capability.
    pub fn storage(&self) -> &StorageResource {
        &self.storage
    }

    /// The encryption capability, when configured.
    pub fn encryption(&self) -> Option<&EncryptionResource> {
        self.encryption.as_ref()
    }

    pub(crate) fn encryption_resource(&self) -> Result<&EncryptionResource> {
        self.encryption
            .as_ref()
            .ok_or(StrataError::EncryptionNotConfigured)
    }

    pub(crate) fn indexer_did(&self) -> &str {
        &self.indexer_did
    }

    /// Authenticate and authorize the requested scopes.
    ///
    /// Sessions already belonging to the same identity are reused without
    /// re-authorizing. Sessions belonging to a different identity are
    /// cleared. Succeeds when at least one capability ends up with a session
    /// for this user; the outcome is persisted and profile indexing is
    /// submitted in the background.
    pub async fn connect(
        &self,
        authenticator: &Authenticator,
        scopes: &[ResourceKind],
    ) -> Result<ConnectResult> {
        let user = authenticator.user_information().await?;
        let want_storage = scopes.contains(&ResourceKind::Storage);
        let want_encryption = scopes.contains(&ResourceKind::Encryption);

        if want_encryption {
            let _ = self.encryption_resource()?;
            if !authenticator.supports_signing() {
                return Err(StrataError::unsupported_authenticator(
                    ResourceKind::Encryption,
                    "the encryption scope requires a signing authenticator",
                ));
            }
        }

        self.storage.connect().await?;

        if self.storage.is_current_user(&user).await {
            tracing::debug!(did = %user.did, "reusing storage session");
        } else if want_storage {
            self.storage.authorize(authenticator, None).await?;
        } else if self.storage.user().await.is_some() {
            tracing::warn!(did = %user.did, "clearing storage session held by another identity");
            self.storage.clear_session().await;
        }

        if let Some(encryption) = &self.encryption {
            if encryption.is_current_user(&user).await {
                tracing::debug!(did = %user.did, "reusing encryption session");
            } else if want_encryption {
                encryption.authorize(authenticator, None).await?;
            } else if encryption.user().await.is_some() {
                tracing::warn!(did = %user.did, "clearing encryption session held by another identity");
                encryption.clear_session().await;
            }
        }

        let established = self.established_scopes(&user).await;
        if established.is_empty() {
            return Err(StrataError::NoSessionEstablished {
                message: format!("no session survived connect with scopes {scopes:?}"),
            });
        }

        *self.current_user.lock().await = Some(user.clone());
        self.persist(&user).await?;

        let indexing = self.spawn_profile_indexing(&user);
        tracing::info!(did = %user.did, ?established, "connected");

        Ok(ConnectResult {
            user,
            scopes: established,
            indexing: Some(indexing),
        })
    }

    /// Restore from the persisted bundle.
    pub async fn restore(&self) -> Result<ConnectResult> {
        let bundle = persistence::load(&self.key_value)
            .await?
            .ok_or_else(|| StrataError::NoSessionEstablished {
                message: "no persisted session bundle".to_string(),
            })?;
        self.restore_parsed(bundle).await
    }

    /// Restore from a caller-supplied bundle JSON.
    pub async fn restore_bundle(&self, json: &str) -> Result<ConnectResult> {
        self.restore_parsed(PersistedBundle::from_json(json)?).await
    }

    /// Replay a bundle against the resources. A slot that fails verification
    /// is logged and skipped; the restore as a whole only fails when no slot
    /// survives.
    async fn restore_parsed(&self, bundle: PersistedBundle) -> Result<ConnectResult> {
        let user = bundle.user_information.clone();

        if let Some(serialized) = bundle.storage.as_active() {
            let outcome = match self.storage.connect().await {
                Ok(()) => self.storage.set_session(&user, serialized).await,
                Err(err) => Err(err),
            };
            if let Err(err) = outcome {
                tracing::warn!(did = %user.did, "skipping storage slot during restore: {err}");
            }
        }

        if let Some(serialized) = bundle.encryption.as_active() {
            match &self.encryption {
                Some(encryption) => {
                    if let Err(err) = encryption.set_session(&user, serialized).await {
                        tracing::warn!(did = %user.did, "skipping encryption slot during restore: {err}");
                    }
                }
                None => {
                    tracing::warn!("bundle carries an encryption session but no backend is configured");
                }
            }
        }

        let scopes = self.established_scopes(&user).await;
        if scopes.is_empty() {
            return Err(StrataError::NoSessionEstablished {
                message: "persisted bundle restored no sessions".to_string(),
            });
        }

        *self.current_user.lock().await = Some(user.clone());
        self.persist(&user).await?;
        tracing::info!(did = %user.did, ?scopes, "restored");

        Ok(ConnectResult {
            user,
            scopes,
            indexing: None,
        })
    }

    /// Clear every session and erase the persisted bundle. Best-effort: a
    /// failing erase is logged, never surfaced.
    pub async fn disconnect(&self) {
        self.storage.clear_session().await;
        if let Some(encryption) = &self.encryption {
            encryption.clear_session().await;
        }
        *self.current_user.lock().await = None;

        if let Err(err) = persistence::erase(&self.key_value).await {
            tracing::warn!("failed to erase persisted bundle: {err}");
        }
    }

    /// Whether a user is connected, optionally checking a specific address
    /// or DID.
    pub async fn is_connected(&self, address: Option<&str>) -> bool {
        let user = match self.current_user.lock().await.clone() {
            Some(user) => user,
            None => return false,
        };
        if self.established_scopes(&user).await.is_empty() {
            return false;
        }
        match address {
            Some(candidate) => user.matches_address(candidate) || user.did == candidate,
            None => true,
        }
    }

    /// The currently bound user, if any.
    pub async fn connected_user(&self) -> Option<AuthenticatedUser> {
        self.current_user.lock().await.clone()
    }

    /// Gate an operation on the listed capabilities, returning the bound
    /// user when every one has an active session for them.
    pub async fn require_session(&self, scopes: &[ResourceKind]) -> Result<AuthenticatedUser> {
        let user = self
            .current_user
            .lock()
            .await
            .clone()
            .ok_or(StrataError::AuthenticationRequired)?;

        for scope in scopes {
            match scope {
                ResourceKind::Storage => {
                    if !self.storage.is_current_user(&user).await {
                        return Err(StrataError::MissingCapability {
                            resource: ResourceKind::Storage,
                        });
                    }
                }
                ResourceKind::Encryption => {
                    let encryption = self.encryption_resource()?;
                    if !encryption.is_current_user(&user).await {
                        return Err(StrataError::MissingCapability {
                            resource: ResourceKind::Encryption,
                        });
                    }
                }
            }
        }
        Ok(user)
    }

    async fn established_scopes(&self, user: &AuthenticatedUser) -> Vec<ResourceKind> {
        let mut scopes = Vec::new();
        if self.storage.is_current_user(user).await {
            scopes.push(ResourceKind::Storage);
        }
        if let Some(encryption) = &self.encryption {
            if encryption.is_current_user(user).await {
                scopes.push(ResourceKind::Encryption);
            }
        }
        scopes
    }

    async fn persist(&self, user: &AuthenticatedUser) -> Result<()> {
        let encryption = match &self.encryption {
            Some(encryption) => SessionSlot::from_option(encryption.serialized_session().await?),
            None => SessionSlot::inactive(),
        };
        let bundle = PersistedBundle {
            storage: SessionSlot::from_option(self.storage.serialized_session().await?),
            encryption,
            user_information: user.clone(),
        };
        persistence::save(&self.key_value, &bundle).await
    }

    pub(crate) fn spawn_profile_indexing(&self, user: &AuthenticatedUser) -> IndexingTicket {
        self.spawn_indexing(user.did.clone(), IndexTarget::Profile)
    }

    pub(crate) fn spawn_indexing(&self, resource_id: String, target: IndexTarget) -> IndexingTicket {
        let indexer = Arc::clone(&self.indexer);
        IndexingTicket(tokio::spawn(async move {
            if let Err(err) = indexer.submit_for_indexing(&resource_id, target).await {
                tracing::warn!(%resource_id, "indexing submission failed: {err}");
                return Err(err);
            }
            Ok(())
        }))
    }
}
