//! Rule-to-condition compiler
//!
//! Lowers an ordered rule sequence into the backend condition list. The
//! compiler is total: recipients it cannot resolve are dropped (logged at
//! debug), never errors. Whether an empty result may be encrypted under is
//! the caller's decision; the encryption resource fails closed on it.

use crate::conditions::{
    BoolOperator, CompiledCondition, EvmCondition, EvmReturnValueTest, PdaInterface, SolCondition,
    SolReturnValueTest,
};
use crate::rules::{AccessRule, ContractType, GatingRule};
use strata_core::{Chain, ChainIdentity};

/// Compile an ordered rule sequence into a backend condition list.
///
/// Operators between rules are taken verbatim from the input; operators
/// inside a DID expansion are generated here (`or` between recipients, no
/// leading/trailing/doubled operator). A rule whose expansion resolves to
/// nothing is dropped together with its adjacent operator, so a dropped rule
/// never leaves the list starting or ending on an operator. Deterministic:
/// the output order follows the input order exactly.
pub fn compile(rules: &[AccessRule]) -> Vec<CompiledCondition> {
    let mut conditions = Vec::with_capacity(rules.len());
    let mut skip_next_operator = false;

    for rule in rules {
        match rule {
            AccessRule::Operator(op) => {
                if std::mem::take(&mut skip_next_operator) {
                    continue;
                }
                conditions.push(CompiledCondition::operator(op.operator));
            }
            AccessRule::Rule(GatingRule::Custom {
                access_control_conditions,
            }) => {
                skip_next_operator = false;
                conditions.push(CompiledCondition::Group(access_control_conditions.clone()));
            }
            AccessRule::Rule(GatingRule::Dids { dids }) => {
                let group = expand_did_recipients(dids);
                if group.is_empty() {
                    // The operator joining this rule to the next has lost
                    // its operand.
                    skip_next_operator = true;
                } else {
                    skip_next_operator = false;
                    conditions.push(CompiledCondition::Group(group));
                }
            }
            AccessRule::Rule(GatingRule::TokenGated {
                chain,
                contract_type,
                contract_address,
                min_token_balance,
                token_id,
            }) => {
                skip_next_operator = false;
                conditions.push(token_balance_condition(
                    *chain,
                    *contract_type,
                    contract_address,
                    min_token_balance,
                    token_id.as_deref(),
                ));
            }
        }
    }

    // A dropped final rule leaves its preceding operator trailing.
    if skip_next_operator && conditions.last().is_some_and(CompiledCondition::is_operator) {
        conditions.pop();
    }

    conditions
}

/// Expand DID recipients into address-equality conditions joined by `or`.
///
/// Unparsable DIDs and recipients on chains without a condition family are
/// dropped so one bad recipient does not break group encryption. Returns an
/// empty list when nothing resolves.
fn expand_did_recipients(dids: &[String]) -> Vec<CompiledCondition> {
    let mut group = Vec::with_capacity(dids.len() * 2);

    for did in dids {
        let identity = match ChainIdentity::from_did(did) {
            Ok(identity) => identity,
            Err(err) => {
                tracing::debug!(%did, %err, "dropping unresolvable recipient");
                continue;
            }
        };

        let Some(address) = identity.address.as_deref() else {
            tracing::debug!(%did, "dropping recipient without an address");
            continue;
        };

        let Some(condition) = CompiledCondition::address_equality(identity.chain, address) else {
            tracing::debug!(%did, chain = %identity.chain, "dropping recipient on unsupported chain");
            continue;
        };

        group.push(condition);
        group.push(CompiledCondition::operator(BoolOperator::Or));
    }

    // Trim the trailing `or` left by the loop.
    group.pop();
    group
}

/// Build the single balance-threshold condition for a token rule.
fn token_balance_condition(
    chain: Chain,
    contract_type: ContractType,
    contract_address: &str,
    min_token_balance: &str,
    token_id: Option<&str>,
) -> CompiledCondition {
    match contract_type {
        ContractType::SolanaContract => CompiledCondition::Sol(SolCondition {
            condition_type: "solRpc".to_string(),
            method: "balanceOfToken".to_string(),
            params: vec![contract_address.to_string()],
            pda_params: Vec::new(),
            pda_interface: PdaInterface::default(),
            pda_key: String::new(),
            chain: Chain::Solana.as_str().to_string(),
            return_value_test: SolReturnValueTest {
                key: "$.amount".to_string(),
                comparator: ">=".to_string(),
                value: min_token_balance.to_string(),
            },
        }),
        ContractType::Erc1155 => CompiledCondition::Evm(EvmCondition {
            condition_type: "evmBasic".to_string(),
            contract_address: contract_address.to_string(),
            standard_contract_type: contract_type.as_str().to_string(),
            chain: chain.as_str().to_string(),
            method: "balanceOf".to_string(),
            parameters: vec![
                ":userAddress".to_string(),
                token_id.unwrap_or_default().to_string(),
            ],
            return_value_test: EvmReturnValueTest {
                comparator: ">=".to_string(),
                value: min_token_balance.to_string(),
            },
        }),
        ContractType::Erc20 | ContractType::Erc721 => CompiledCondition::Evm(EvmCondition {
            condition_type: "evmBasic".to_string(),
            contract_address: contract_address.to_string(),
            standard_contract_type: contract_type.as_str().to_string(),
            chain: chain.as_str().to_string(),
            method: "balanceOf".to_string(),
            parameters: vec![":userAddress".to_string()],
            return_value_test: EvmReturnValueTest {
                comparator: ">=".to_string(),
                value: min_token_balance.to_string(),
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVM_DID: &str = "did:pkh:eip155:1:0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";
    const SOL_DID: &str =
        "did:pkh:solana:4sGjMW1sUnHzSxGspuhpqLDx6wiyjNtZ:7S3P4HxJpyyigGzodYwHtCxZyUQe9JiBMHyRWXArAaKv";

    fn did_group(conditions: &[CompiledCondition]) -> &[CompiledCondition] {
        assert_eq!(conditions.len(), 1);
        match &conditions[0] {
            CompiledCondition::Group(inner) => inner,
            other => panic!("expected a group, got {other:?}"),
        }
    }

    #[test]
    fn did_expansion_has_no_dangling_operators() {
        let compiled = compile(&[AccessRule::dids([EVM_DID, SOL_DID, EVM_DID])]);
        let group = did_group(&compiled);

        // condition, or, condition, or, condition
        assert_eq!(group.len(), 5);
        for (i, node) in group.iter().enumerate() {
            assert_eq!(node.is_operator(), i % 2 == 1, "position {i}");
        }
    }

    #[test]
    fn empty_did_list_compiles_to_nothing() {
        assert!(compile(&[AccessRule::dids(Vec::<String>::new())]).is_empty());
    }

    #[test]
    fn unresolvable_recipients_are_dropped_silently() {
        let compiled = compile(&[AccessRule::dids([
            EVM_DID,
            "did:web:example.com",
            "did:pkh:tezos:NetXdQprcVkpaWU:tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb",
            SOL_DID,
        ])]);
        let group = did_group(&compiled);

        // Only the EVM and Solana recipients survive.
        assert_eq!(group.len(), 3);
        assert!(matches!(group[0], CompiledCondition::Evm(_)));
        assert!(matches!(group[2], CompiledCondition::Sol(_)));
    }

    #[test]
    fn all_unresolvable_recipients_compile_to_nothing() {
        let compiled = compile(&[AccessRule::dids(["did:web:a", "not-a-did"])]);
        assert!(compiled.is_empty());
    }

    #[test]
    fn dropped_leading_rule_takes_its_operator_with_it() {
        let compiled = compile(&[
            AccessRule::dids(["did:web:example.com"]),
            AccessRule::or(),
            AccessRule::token_gated(Chain::Evm, ContractType::Erc20, "0xToken", "10", None),
        ]);

        // No leading operator survives the dropped expansion.
        assert_eq!(compiled.len(), 1);
        assert!(matches!(compiled[0], CompiledCondition::Evm(_)));
    }

    #[test]
    fn dropped_trailing_rule_removes_the_preceding_operator() {
        let compiled = compile(&[
            AccessRule::token_gated(Chain::Evm, ContractType::Erc20, "0xToken", "10", None),
            AccessRule::or(),
            AccessRule::dids(["did:web:example.com"]),
        ]);

        assert_eq!(compiled.len(), 1);
        assert!(matches!(compiled[0], CompiledCondition::Evm(_)));
    }

    #[test]
    fn dropped_middle_rule_never_doubles_operators() {
        let compiled = compile(&[
            AccessRule::dids([EVM_DID]),
            AccessRule::or(),
            AccessRule::dids(["did:web:example.com"]),
            AccessRule::or(),
            AccessRule::dids([SOL_DID]),
        ]);

        assert_eq!(compiled.len(), 3);
        assert!(matches!(compiled[0], CompiledCondition::Group(_)));
        assert!(compiled[1].is_operator());
        assert!(matches!(compiled[2], CompiledCondition::Group(_)));
    }

    #[test]
    fn recipients_keep_input_order() {
        let compiled = compile(&[AccessRule::dids([SOL_DID, EVM_DID])]);
        let group = did_group(&compiled);
        assert!(matches!(group[0], CompiledCondition::Sol(_)));
        assert!(matches!(group[2], CompiledCondition::Evm(_)));
    }

    #[test]
    fn inter_rule_operators_pass_through_verbatim() {
        let compiled = compile(&[
            AccessRule::dids([EVM_DID]),
            AccessRule::and(),
            AccessRule::token_gated(Chain::Evm, ContractType::Erc20, "0xToken", "10", None),
        ]);

        assert_eq!(compiled.len(), 3);
        assert!(matches!(compiled[0], CompiledCondition::Group(_)));
        assert_eq!(
            compiled[1],
            CompiledCondition::operator(BoolOperator::And)
        );
        assert!(matches!(compiled[2], CompiledCondition::Evm(_)));
    }

    #[test]
    fn erc1155_keys_parameters_by_token_id() {
        let compiled = compile(&[AccessRule::token_gated(
            Chain::Evm,
            ContractType::Erc1155,
            "0xToken",
            "1",
            Some("1337".into()),
        )]);

        match &compiled[0] {
            CompiledCondition::Evm(cond) => {
                assert_eq!(cond.method, "balanceOf");
                assert_eq!(cond.parameters, vec![":userAddress", "1337"]);
                assert_eq!(cond.return_value_test.comparator, ">=");
            }
            other => panic!("expected evm condition, got {other:?}"),
        }
    }

    #[test]
    fn solana_contract_uses_balance_of_token() {
        let compiled = compile(&[AccessRule::token_gated(
            Chain::Solana,
            ContractType::SolanaContract,
            "TokenMint111",
            "5",
            None,
        )]);

        match &compiled[0] {
            CompiledCondition::Sol(cond) => {
                assert_eq!(cond.method, "balanceOfToken");
                assert_eq!(cond.params, vec!["TokenMint111"]);
                assert_eq!(cond.return_value_test.key, "$.amount");
            }
            other => panic!("expected sol condition, got {other:?}"),
        }
    }

    #[test]
    fn custom_conditions_pass_through_unchanged() {
        let custom = vec![
            CompiledCondition::address_equality(Chain::Evm, "0xabc").unwrap(),
            CompiledCondition::operator(BoolOperator::Or),
            CompiledCondition::address_equality(Chain::Evm, "0xdef").unwrap(),
        ];
        let compiled = compile(&[AccessRule::custom(custom.clone())]);
        assert_eq!(compiled, vec![CompiledCondition::Group(custom)]);
    }

    #[test]
    fn compilation_is_deterministic() {
        let rules = vec![
            AccessRule::dids([EVM_DID, SOL_DID]),
            AccessRule::or(),
            AccessRule::token_gated(Chain::Evm, ContractType::Erc721, "0xNft", "1", None),
        ];

        assert_eq!(compile(&rules), compile(&rules));
    }
}
