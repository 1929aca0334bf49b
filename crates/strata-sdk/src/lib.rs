//! Strata SDK
//!
//! The embedder-facing surface: a [`StrataClient`] that orchestrates the
//! per-capability resources (storage, encryption), persists the combined
//! session state, and exposes the profile and record operations built on
//! top of them.

#![forbid(unsafe_code)]

/// Session orchestrator
pub mod client;

/// Persisted session bundle
pub mod persistence;

/// Profile and record operations
pub mod records;

pub use client::{ConnectResult, IndexingTicket, StrataClient};
pub use persistence::{PersistedBundle, SessionSlot, BUNDLE_KEY};
pub use records::{BodyContent, DecryptPolicy, Record};

// The building blocks embedders implement or configure.
pub use strata_core::effects::{DocumentStore, Indexer, KeyValueStore};
pub use strata_core::{AuthenticatedUser, Chain, ResourceKind, Result, StrataError};
pub use strata_gating::{AccessRule, EncryptionBackend};
pub use strata_resources::AuthenticatedResource;
pub use strata_sessions::{Authenticator, KeyAuthenticator, WalletSigner};
