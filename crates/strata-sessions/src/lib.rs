//! Strata Sessions
//!
//! Immutable, serializable representations of an authenticated session, and
//! the authenticator dispatch that produces them.
//!
//! Two session shapes exist:
//! - [`KeySession`] wraps a fixed-length random seed and derives a stable
//!   `did:key` identifier from it; no external signature is ever produced.
//! - [`SignedSession`] wraps a signed authentication message (signature,
//!   canonical serialized message, signer address, derivation tag).
//!
//! Both serialize to strings and deserialize back losslessly for the fields
//! needed to re-derive signer identity. The [`Authenticator`] sum type makes
//! "can this authenticator sign?" a compile-time-exhaustive question instead
//! of structural duck-typing.

#![forbid(unsafe_code)]

/// Direct-key sessions and their DID derivation
pub mod key;

/// Signed-message sessions and derivation-method tags
pub mod signed;

/// Signed authentication message construction
pub mod siwx;

/// Authenticator sum type and wallet signer boundary
pub mod authenticator;

pub use authenticator::{Authenticator, KeyAuthenticator, SignedAuthentication, WalletSigner};
pub use key::KeySession;
pub use signed::{DerivationMethod, SignedSession};
pub use siwx::{SiwxMessage, SiwxOverrides};
