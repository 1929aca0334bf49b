//! Signed-message sessions
//!
//! A [`SignedSession`] wraps the signed authentication artifact a wallet
//! produced. The serialized form is the backend's `authSig` wire shape; the
//! chain is not stored directly but recovered from the derivation-method tag
//! on deserialize.

use serde::{Deserialize, Serialize};
use std::fmt;
use strata_core::{AuthSig, Chain, Result, StrataError};

/// How a session signature is verifiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivationMethod {
    /// EVM `personal_sign` over the message bytes
    #[serde(rename = "web3.eth.personal.sign")]
    EvmPersonalSign,
    /// Solana ed25519 message signature
    #[serde(rename = "solana.signMessage")]
    SolanaSignMessage,
    /// Tezos message signature with appended public key
    #[serde(rename = "tezos.signMessage")]
    TezosSignMessage,
    /// Stacks message signature
    #[serde(rename = "stacks.signMessage")]
    StacksSignMessage,
}

impl DerivationMethod {
    /// The wire tag recorded in serialized sessions.
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivationMethod::EvmPersonalSign => "web3.eth.personal.sign",
            DerivationMethod::SolanaSignMessage => "solana.signMessage",
            DerivationMethod::TezosSignMessage => "tezos.signMessage",
            DerivationMethod::StacksSignMessage => "stacks.signMessage",
        }
    }

    /// Parse a wire tag; `None` for tags outside the known set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "web3.eth.personal.sign" => Some(DerivationMethod::EvmPersonalSign),
            "solana.signMessage" => Some(DerivationMethod::SolanaSignMessage),
            "tezos.signMessage" => Some(DerivationMethod::TezosSignMessage),
            "stacks.signMessage" => Some(DerivationMethod::StacksSignMessage),
            _ => None,
        }
    }

    /// The derivation method for a chain; `None` for chains that never sign.
    pub fn for_chain(chain: Chain) -> Option<Self> {
        match chain {
            Chain::Evm => Some(DerivationMethod::EvmPersonalSign),
            Chain::Solana => Some(DerivationMethod::SolanaSignMessage),
            Chain::Tezos => Some(DerivationMethod::TezosSignMessage),
            Chain::Stacks => Some(DerivationMethod::StacksSignMessage),
            Chain::KeyDid => None,
        }
    }

    /// The chain this derivation method belongs to.
    pub fn chain(&self) -> Chain {
        match self {
            DerivationMethod::EvmPersonalSign => Chain::Evm,
            DerivationMethod::SolanaSignMessage => Chain::Solana,
            DerivationMethod::TezosSignMessage => Chain::Tezos,
            DerivationMethod::StacksSignMessage => Chain::Stacks,
        }
    }
}

impl fmt::Display for DerivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A session derived from a signed authentication message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSession {
    auth_sig: AuthSig,
    chain: Chain,
}

impl SignedSession {
    /// Build a session from a signed artifact.
    ///
    /// Fails for chains without a derivation method (`KeyDid`).
    pub fn new(
        chain: Chain,
        signature: impl Into<String>,
        signed_message: impl Into<String>,
        address: impl Into<String>,
    ) -> Result<Self> {
        let method = DerivationMethod::for_chain(chain).ok_or_else(|| {
            StrataError::invalid(format!("chain {chain} cannot produce signed sessions"))
        })?;

        Ok(Self {
            auth_sig: AuthSig {
                sig: signature.into(),
                derived_via: method.as_str().to_string(),
                signed_message: signed_message.into(),
                address: address.into(),
            },
            chain,
        })
    }

    /// The backend-facing signed artifact.
    pub fn auth_sig(&self) -> &AuthSig {
        &self.auth_sig
    }

    /// Signer address the session was derived from.
    pub fn address(&self) -> &str {
        &self.auth_sig.address
    }

    /// Chain the session was derived on.
    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Serialize to the persisted string form (the `authSig` JSON).
    pub fn serialize(&self) -> Result<String> {
        serde_json::to_string(&self.auth_sig).map_err(StrataError::from)
    }

    /// Parse the persisted string form.
    ///
    /// Fails with [`StrataError::UnrecognizedSessionFormat`] when required
    /// fields are absent or the derivation tag is unknown.
    pub fn deserialize(serialized: &str) -> Result<Self> {
        let auth_sig: AuthSig = serde_json::from_str(serialized).map_err(|err| {
            StrataError::UnrecognizedSessionFormat {
                message: format!("invalid session payload: {err}"),
            }
        })?;

        let method = DerivationMethod::from_tag(&auth_sig.derived_via).ok_or_else(|| {
            StrataError::UnrecognizedSessionFormat {
                message: format!("unknown derivation method {}", auth_sig.derived_via),
            }
        })?;

        Ok(Self {
            chain: method.chain(),
            auth_sig,
        })
    }
}
