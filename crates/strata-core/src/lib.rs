//! Strata Core
//!
//! Foundational types shared by every Strata crate:
//!
//! - Chain and identity model: supported chains, DID parsing, the canonical
//!   [`AuthenticatedUser`] bound after a successful connect.
//! - Unified error taxonomy ([`StrataError`]) covering connection failures,
//!   capability gating, and session identity violations.
//! - Resource kinds and scopes: the two independently authorizable
//!   capabilities (`storage`, `encryption`) and their scope descriptors.
//! - Effect interfaces: the external collaborators (document store, indexer,
//!   key-value store) the core consumes but does not implement.
//!
//! This crate contains no I/O and no session state; it is the vocabulary the
//! resource controllers and the orchestrator are written in.

#![forbid(unsafe_code)]

/// Supported chains, DID parsing, and authenticated identity
pub mod identity;

/// Unified error handling
pub mod errors;

/// Resource kinds and capability scope descriptors
pub mod resources;

/// Effect interfaces for external collaborators
pub mod effects;

pub use errors::{Result, StrataError};
pub use identity::{AuthSig, AuthenticatedUser, Chain, ChainIdentity};
pub use resources::{ResourceKind, ResourceScope};
