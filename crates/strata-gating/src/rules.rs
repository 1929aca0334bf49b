//! Abstract access-rule grammar
//!
//! Callers express who may decrypt as an ordered sequence of rules with
//! explicit boolean operators between them. Rules are chain-agnostic; the
//! compiler lowers them to backend condition trees.

use crate::conditions::{BoolOperator, CompiledCondition};
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_core::Chain;

/// Token contract families a token-gated rule can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    /// EVM fungible token
    #[serde(rename = "ERC20")]
    Erc20,
    /// EVM non-fungible token
    #[serde(rename = "ERC721")]
    Erc721,
    /// EVM multi-token standard; balance queries are keyed by token id
    #[serde(rename = "ERC1155")]
    Erc1155,
    /// SPL token program account
    #[serde(rename = "SolanaContract")]
    SolanaContract,
}

impl ContractType {
    /// Wire name used in the `standardContractType` condition field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Erc20 => "ERC20",
            ContractType::Erc721 => "ERC721",
            ContractType::Erc1155 => "ERC1155",
            ContractType::SolanaContract => "SolanaContract",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A standalone boolean operator between two rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRule {
    /// The operator joining the surrounding rules
    pub operator: BoolOperator,
}

/// A content-gating rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GatingRule {
    /// Gate on a fixed set of recipients, identified by DID. Recipients on
    /// unsupported chains are dropped, not rejected: one bad recipient must
    /// not break group encryption.
    #[serde(rename = "dids")]
    Dids {
        /// Authorized recipient DIDs
        dids: Vec<String>,
    },

    /// Gate on a minimum token balance.
    #[serde(rename = "token-gated", rename_all = "camelCase")]
    TokenGated {
        /// Network family the balance is checked on
        chain: Chain,
        /// Contract family
        contract_type: ContractType,
        /// Token contract address
        contract_address: String,
        /// Minimum balance, as a decimal string
        min_token_balance: String,
        /// Token id, required for ERC1155 and ignored otherwise
        #[serde(skip_serializing_if = "Option::is_none")]
        token_id: Option<String>,
    },

    /// Pre-built backend conditions, passed through unchanged.
    #[serde(rename = "custom", rename_all = "camelCase")]
    Custom {
        /// Conditions in the backend's own format
        access_control_conditions: Vec<CompiledCondition>,
    },
}

/// One entry in a rule sequence: a gating rule or an inter-rule operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccessRule {
    /// A content-gating rule
    Rule(GatingRule),
    /// A boolean operator between the surrounding rules
    Operator(OperatorRule),
}

impl AccessRule {
    /// A DID-recipient rule.
    pub fn dids<I, S>(dids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AccessRule::Rule(GatingRule::Dids {
            dids: dids.into_iter().map(Into::into).collect(),
        })
    }

    /// A token-balance rule.
    pub fn token_gated(
        chain: Chain,
        contract_type: ContractType,
        contract_address: impl Into<String>,
        min_token_balance: impl Into<String>,
        token_id: Option<String>,
    ) -> Self {
        AccessRule::Rule(GatingRule::TokenGated {
            chain,
            contract_type,
            contract_address: contract_address.into(),
            min_token_balance: min_token_balance.into(),
            token_id,
        })
    }

    /// A pass-through rule of pre-built conditions.
    pub fn custom(conditions: Vec<CompiledCondition>) -> Self {
        AccessRule::Rule(GatingRule::Custom {
            access_control_conditions: conditions,
        })
    }

    /// An `and` operator entry.
    pub fn and() -> Self {
        AccessRule::Operator(OperatorRule {
            operator: BoolOperator::And,
        })
    }

    /// An `or` operator entry.
    pub fn or() -> Self {
        AccessRule::Operator(OperatorRule {
            operator: BoolOperator::Or,
        })
    }
}
