//! Deterministic wallet signer.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use strata_core::errors::Result;
use strata_core::Chain;
use strata_sessions::WalletSigner;

/// Signs by hashing the address and message together, so a given wallet
/// always produces the same signature for the same message. Encodings follow
/// the chain convention: hex with a `0x` prefix for EVM, base58 for Solana,
/// bare hex elsewhere.
#[derive(Debug, Clone)]
pub struct TestWallet {
    chain: Chain,
    address: String,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl TestWallet {
    pub fn new(chain: Chain, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn evm(address: impl Into<String>) -> Self {
        Self::new(Chain::Evm, address)
    }

    pub fn solana(address: impl Into<String>) -> Self {
        Self::new(Chain::Solana, address)
    }

    /// Tezos wallets expose the account public key alongside the address.
    pub fn tezos(address: impl Into<String>, public_key: impl Into<String>) -> Self {
        let mut wallet = Self::new(Chain::Tezos, address);
        wallet.metadata.insert(
            "publicKey".to_string(),
            serde_json::Value::String(public_key.into()),
        );
        wallet
    }

    fn digest(&self, message: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(self.address.as_bytes());
        hasher.update(message.as_bytes());
        hasher.finalize().to_vec()
    }
}

#[async_trait]
impl WalletSigner for TestWallet {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn address(&self) -> String {
        self.address.clone()
    }

    fn metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        self.metadata.clone()
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        let digest = self.digest(message);
        Ok(match self.chain {
            Chain::Evm => format!("0x{}", hex::encode(&digest)),
            Chain::Solana => bs58::encode(&digest).into_string(),
            _ => hex::encode(&digest),
        })
    }
}
