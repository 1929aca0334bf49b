//! Strata Gating
//!
//! Translates the abstract, chain-agnostic access-rule grammar into the
//! boolean condition trees an encryption backend understands, and converts
//! the resulting envelopes to and from their flat, indexable storage form.
//!
//! Everything here is pure: no I/O, no session state. The compiled output is
//! persisted alongside encrypted content and later re-submitted verbatim for
//! decryption, so compilation must be deterministic: same rules in, same
//! conditions out, order preserved.

#![forbid(unsafe_code)]

/// Abstract access-rule grammar
pub mod rules;

/// Backend-specific compiled condition wire types
pub mod conditions;

/// Rule-to-condition compiler
pub mod compiler;

/// Encrypted-envelope storage codec
pub mod envelope;

/// Encryption backend boundary
pub mod backend;

pub use backend::{EncryptedPayload, EncryptionBackend};
pub use compiler::compile;
pub use conditions::{BoolOperator, CompiledCondition, EvmCondition, SolCondition};
pub use envelope::{ConditionSet, ContentKind, EncryptedEnvelope, IndexedEncryptedRecord};
pub use rules::{AccessRule, ContractType, GatingRule, OperatorRule};
