//! Backend-specific compiled condition wire types
//!
//! These structs serialize to the exact JSON shapes the encryption backend
//! validates structurally. Field names and their presence are load-bearing;
//! a shape drift makes previously-encrypted content undecryptable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Boolean operator joining two conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoolOperator {
    /// Both sides must hold
    And,
    /// Either side must hold
    Or,
}

impl fmt::Display for BoolOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOperator::And => f.write_str("and"),
            BoolOperator::Or => f.write_str("or"),
        }
    }
}

/// Comparison applied to an EVM condition's query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmReturnValueTest {
    /// Comparison operator (`"="`, `">="`, ...)
    pub comparator: String,
    /// Right-hand value
    pub value: String,
}

/// Comparison applied to a Solana RPC condition's result, addressed by a
/// JSONPath-style key into the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolReturnValueTest {
    /// Key into the RPC response (`""` for the whole value)
    pub key: String,
    /// Comparison operator
    pub comparator: String,
    /// Right-hand value
    pub value: String,
}

/// Program-derived-address interface descriptor for Solana conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PdaInterface {
    /// Byte offset into the account data
    pub offset: u64,
    /// Field layout map
    pub fields: BTreeMap<String, serde_json::Value>,
}

/// An EVM-family condition (`conditionType: "evmBasic"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmCondition {
    /// Always `"evmBasic"`
    pub condition_type: String,
    /// Contract to query; empty for plain address checks
    pub contract_address: String,
    /// `"ERC20"` / `"ERC721"` / `"ERC1155"` or empty
    pub standard_contract_type: String,
    /// Chain wire name
    pub chain: String,
    /// Contract method; empty for address equality
    pub method: String,
    /// Method parameters; `":userAddress"` is substituted by the backend
    pub parameters: Vec<String>,
    /// Comparison against the query result
    pub return_value_test: EvmReturnValueTest,
}

/// A Solana condition (`conditionType: "solRpc"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolCondition {
    /// Always `"solRpc"`
    pub condition_type: String,
    /// RPC method; empty for address equality
    pub method: String,
    /// Method parameters
    pub params: Vec<String>,
    /// Program-derived-address parameters
    pub pda_params: Vec<String>,
    /// Program-derived-address interface
    pub pda_interface: PdaInterface,
    /// Program-derived-address key
    pub pda_key: String,
    /// Always `"solana"`
    pub chain: String,
    /// Comparison against the RPC result
    pub return_value_test: SolReturnValueTest,
}

/// One node of a compiled condition list.
///
/// Serializes untagged: EVM and Solana conditions are objects distinguished
/// by their fields, operators are `{"operator": ...}`, and groups are nested
/// JSON arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompiledCondition {
    /// EVM-family condition
    Evm(EvmCondition),
    /// Solana condition
    Sol(SolCondition),
    /// Boolean operator between sibling conditions
    Operator {
        /// The joining operator
        operator: BoolOperator,
    },
    /// A nested condition group
    Group(Vec<CompiledCondition>),
}

impl CompiledCondition {
    /// An address-equality condition for the given chain, or `None` when the
    /// chain has no condition family.
    pub fn address_equality(chain: strata_core::Chain, address: &str) -> Option<Self> {
        use strata_core::Chain;

        match chain {
            Chain::Evm => Some(CompiledCondition::Evm(EvmCondition {
                condition_type: "evmBasic".to_string(),
                contract_address: String::new(),
                standard_contract_type: String::new(),
                chain: Chain::Evm.as_str().to_string(),
                method: String::new(),
                parameters: vec![":userAddress".to_string()],
                return_value_test: EvmReturnValueTest {
                    comparator: "=".to_string(),
                    value: address.to_string(),
                },
            })),
            Chain::Solana => Some(CompiledCondition::Sol(SolCondition {
                condition_type: "solRpc".to_string(),
                method: String::new(),
                params: vec![":userAddress".to_string()],
                pda_params: Vec::new(),
                pda_interface: PdaInterface::default(),
                pda_key: String::new(),
                chain: Chain::Solana.as_str().to_string(),
                return_value_test: SolReturnValueTest {
                    key: String::new(),
                    comparator: "=".to_string(),
                    value: address.to_string(),
                },
            })),
            _ => None,
        }
    }

    /// An operator node.
    pub fn operator(operator: BoolOperator) -> Self {
        CompiledCondition::Operator { operator }
    }

    /// True for operator nodes.
    pub fn is_operator(&self) -> bool {
        matches!(self, CompiledCondition::Operator { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Chain;

    #[test]
    fn evm_address_condition_matches_wire_shape() {
        let cond = CompiledCondition::address_equality(Chain::Evm, "0xabc").unwrap();
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "conditionType": "evmBasic",
                "contractAddress": "",
                "standardContractType": "",
                "chain": "ethereum",
                "method": "",
                "parameters": [":userAddress"],
                "returnValueTest": { "comparator": "=", "value": "0xabc" }
            })
        );
    }

    #[test]
    fn sol_address_condition_matches_wire_shape() {
        let cond = CompiledCondition::address_equality(Chain::Solana, "7S3P4").unwrap();
        let json = serde_json::to_value(&cond).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "conditionType": "solRpc",
                "method": "",
                "params": [":userAddress"],
                "pdaParams": [],
                "pdaInterface": { "offset": 0, "fields": {} },
                "pdaKey": "",
                "chain": "solana",
                "returnValueTest": { "key": "", "comparator": "=", "value": "7S3P4" }
            })
        );
    }

    #[test]
    fn unsupported_chains_have_no_condition_family() {
        assert!(CompiledCondition::address_equality(Chain::Tezos, "tz1abc").is_none());
        assert!(CompiledCondition::address_equality(Chain::Stacks, "SP2ABC").is_none());
    }

    #[test]
    fn untagged_round_trip_distinguishes_variants() {
        let list = vec![
            CompiledCondition::address_equality(Chain::Evm, "0xabc").unwrap(),
            CompiledCondition::operator(BoolOperator::Or),
            CompiledCondition::Group(vec![
                CompiledCondition::address_equality(Chain::Solana, "Addr").unwrap()
            ]),
        ];

        let json = serde_json::to_string(&list).unwrap();
        let parsed: Vec<CompiledCondition> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, list);
    }
}
