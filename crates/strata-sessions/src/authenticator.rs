//! Authenticator dispatch
//!
//! An [`Authenticator`] is a closed sum over the two ways an identity can be
//! proven: a wallet that signs messages, or a local key seed. Resources match
//! on the variant, so "this resource needs a signature and this authenticator
//! cannot produce one" is an exhaustiveness-checked code path, not a runtime
//! duck-typing probe.

use crate::key::KeySession;
use crate::siwx::{SiwxMessage, SiwxOverrides};
use async_trait::async_trait;
use std::sync::Arc;
use strata_core::{AuthenticatedUser, Chain, ResourceKind, ResourceScope, Result, StrataError};

/// A wallet-style signer: an external party holding keys for one address on
/// one chain. Producing the signature (hardware wallet, browser extension,
/// remote signer) is outside this crate.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Chain the wallet's account lives on.
    fn chain(&self) -> Chain;

    /// The wallet's signing address.
    fn address(&self) -> String;

    /// Extra identity metadata (`publicKey` for Tezos, ...). The signing
    /// address is added by the authenticator; implementations only supply
    /// chain-specific extras.
    fn metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::new()
    }

    /// Sign a canonical message, returning the signature in the wallet's
    /// native encoding.
    async fn sign_message(&self, message: &str) -> Result<String>;
}

/// A local-key authenticator wrapping a seed session.
#[derive(Debug, Clone)]
pub struct KeyAuthenticator {
    session: KeySession,
}

impl KeyAuthenticator {
    /// Wrap an existing key session.
    pub fn new(session: KeySession) -> Self {
        Self { session }
    }

    /// Generate an authenticator with a fresh seed.
    pub fn generate() -> Self {
        Self {
            session: KeySession::generate(),
        }
    }

    /// Restore from a serialized key session.
    pub fn from_serialized(serialized: &str) -> Result<Self> {
        Ok(Self {
            session: KeySession::deserialize(serialized)?,
        })
    }

    /// The wrapped session.
    pub fn session(&self) -> &KeySession {
        &self.session
    }
}

/// The artifact produced by a successful wallet authentication.
#[derive(Debug, Clone)]
pub struct SignedAuthentication {
    /// The message that was signed
    pub message: SiwxMessage,
    /// Canonical serialized form of the message
    pub serialized: String,
    /// Signature in the wallet's native encoding
    pub signature: String,
    /// Chain the signature was produced on
    pub chain: Chain,
    /// Signing address
    pub address: String,
}

/// An identity-proving capability, tagged by what it can produce.
#[derive(Clone)]
pub enum Authenticator {
    /// Wallet-style: produces signed authentication messages
    Wallet(Arc<dyn WalletSigner>),
    /// Local key: produces a direct key-derived identity, never signs
    LocalKey(KeyAuthenticator),
}

impl Authenticator {
    /// Whether this authenticator can produce signed authentication messages.
    pub fn supports_signing(&self) -> bool {
        matches!(self, Authenticator::Wallet(_))
    }

    /// The identity this authenticator proves.
    pub async fn user_information(&self) -> Result<AuthenticatedUser> {
        match self {
            Authenticator::Wallet(signer) => {
                let address = signer.address();
                let chain = signer.chain();
                let did = pkh_did(chain, &address)?;

                let mut metadata = signer.metadata();
                metadata.insert("address".to_string(), serde_json::Value::String(address));

                Ok(AuthenticatedUser {
                    did,
                    chain,
                    metadata,
                })
            }
            Authenticator::LocalKey(key) => Ok(AuthenticatedUser {
                did: key.session().derived_did(),
                chain: Chain::KeyDid,
                metadata: serde_json::Map::new(),
            }),
        }
    }

    /// Produce a signed authentication message bound to a resource scope.
    ///
    /// Fails with [`StrataError::UnsupportedAuthenticator`] for local-key
    /// authenticators.
    pub async fn authenticate_signed(
        &self,
        scope: &ResourceScope,
        overrides: Option<&SiwxOverrides>,
    ) -> Result<SignedAuthentication> {
        let signer = match self {
            Authenticator::Wallet(signer) => signer,
            Authenticator::LocalKey(_) => {
                return Err(StrataError::unsupported_authenticator(
                    scope.resource_type,
                    "local-key authenticator cannot produce signed authentication messages",
                ));
            }
        };

        let chain = signer.chain();
        let address = signer.address();
        let message = SiwxMessage::for_scope(chain, &address, scope, overrides);
        let serialized = message.to_canonical_string();
        let signature = signer.sign_message(&serialized).await?;

        tracing::debug!(%chain, scope = %scope.id, "produced signed authentication message");

        Ok(SignedAuthentication {
            address: message.address.clone(),
            message,
            serialized,
            signature,
            chain,
        })
    }

    /// Produce the direct-key session.
    ///
    /// Fails with [`StrataError::UnsupportedAuthenticator`] for wallet
    /// authenticators.
    pub fn authenticate_key(&self) -> Result<KeySession> {
        match self {
            Authenticator::LocalKey(key) => Ok(key.session().clone()),
            Authenticator::Wallet(_) => Err(StrataError::unsupported_authenticator(
                ResourceKind::Storage,
                "wallet authenticator does not expose a key seed",
            )),
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authenticator::Wallet(signer) => f
                .debug_struct("Authenticator::Wallet")
                .field("chain", &signer.chain())
                .field("address", &signer.address())
                .finish(),
            Authenticator::LocalKey(key) => f
                .debug_struct("Authenticator::LocalKey")
                .field("did", &key.session().derived_did())
                .finish(),
        }
    }
}

/// Derive the `did:pkh` identifier for a wallet identity.
fn pkh_did(chain: Chain, address: &str) -> Result<String> {
    let did = match chain {
        Chain::Evm => format!("did:pkh:eip155:1:{address}"),
        Chain::Solana => format!("did:pkh:solana:mainnet:{address}"),
        Chain::Tezos => format!("did:pkh:tezos:mainnet:{address}"),
        Chain::Stacks => format!("did:pkh:stacks:mainnet:{address}"),
        Chain::KeyDid => {
            return Err(StrataError::invalid(
                "key-did identities are derived from seeds, not addresses",
            ))
        }
    };
    Ok(did)
}
