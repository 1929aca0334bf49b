//! Strata Resources
//!
//! Per-resource authentication state machines. Each resource (a storage
//! network, an encryption service) independently moves through
//! `Disconnected -> Connected -> Authorized`, holds its own session, and
//! guards its operations on that state. A failure in one resource never
//! changes the state of another.

#![forbid(unsafe_code)]

/// Resource state machine boundary
pub mod resource;

/// Storage resource (Ceramic-shaped)
pub mod storage;

/// Encryption resource (key-custody-shaped)
pub mod encryption;

pub use encryption::EncryptionResource;
pub use resource::AuthenticatedResource;
pub use storage::{StorageResource, StorageSession};
