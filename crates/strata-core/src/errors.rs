//! Unified error system for Strata
//!
//! One error enum covers the whole workspace. Variants carry enough context
//! (resource kind, chain, identifier) to diagnose a failure without a
//! debugger. Only the explicitly silent paths (batch decrypt, best-effort
//! restore) ever swallow one of these, and they log it when they do.

use crate::identity::Chain;
use crate::resources::ResourceKind;
use serde::{Deserialize, Serialize};

/// Unified error type for all Strata operations
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum StrataError {
    /// A collaborator could not be reached. Transient; never retried here.
    #[error("Connection failed for {resource}: {message}")]
    Connection {
        /// Resource that failed to connect
        resource: ResourceKind,
        /// Underlying failure description
        message: String,
    },

    /// The supplied authenticator cannot produce the artifact this resource
    /// needs (signed message vs. direct key).
    #[error("Unsupported authenticator for {resource}: {message}")]
    UnsupportedAuthenticator {
        /// Resource that rejected the authenticator
        resource: ResourceKind,
        /// What was missing
        message: String,
    },

    /// The authenticated identity's chain is outside the resource's
    /// supported set.
    #[error("Chain {chain} is not supported by {resource}")]
    UnsupportedChain {
        /// The offending chain
        chain: Chain,
        /// Resource that rejected it
        resource: ResourceKind,
    },

    /// A restored session does not belong to the currently authenticated
    /// identity. Security-relevant: the session has already been cleared.
    #[error("Session identity mismatch for {resource}: {message}")]
    SessionIdentityMismatch {
        /// Resource whose session was rejected
        resource: ResourceKind,
        /// Address/DID comparison detail
        message: String,
    },

    /// No user identity is bound at all.
    #[error("This operation requires user authentication, no active user session found")]
    AuthenticationRequired,

    /// A requested capability has no active session.
    #[error("This operation requires the {resource} capability, no active {resource} session found")]
    MissingCapability {
        /// The absent capability
        resource: ResourceKind,
    },

    /// Encryption was demanded but no encryption client is configured.
    /// Distinct from "configured but not authorized".
    #[error("This operation requires encryption, no encryption client configured")]
    EncryptionNotConfigured,

    /// A connect or restore attempt left no resource with an active session.
    #[error("No sessions established after authentication attempts: {message}")]
    NoSessionEstablished {
        /// Attempted scopes / context
        message: String,
    },

    /// A DID string does not match any known scheme.
    #[error("Malformed identifier: {did}")]
    MalformedIdentifier {
        /// The offending DID
        did: String,
    },

    /// A serialized session could not be recognized (unknown derivation tag,
    /// missing fields).
    #[error("Unrecognized session format: {message}")]
    UnrecognizedSessionFormat {
        /// Parsing detail
        message: String,
    },

    /// Rule compilation produced an empty condition set; encrypting would
    /// make the content undecryptable for everyone, so we fail closed.
    #[error("Access rules compiled to an empty condition set, refusing to encrypt")]
    EmptyAccessConditions,

    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// What was invalid
        message: String,
    },

    /// Serialization/deserialization failure
    #[error("Serialization error: {message}")]
    Serialization {
        /// Underlying failure description
        message: String,
    },

    /// Document store operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Underlying failure description
        message: String,
    },

    /// A decryption attempt failed (key release denied, cipher mismatch).
    #[error("Decryption failed: {message}")]
    Decryption {
        /// Underlying failure description
        message: String,
    },

    /// Indexing submission failed
    #[error("Indexing error: {message}")]
    Indexing {
        /// Underlying failure description
        message: String,
    },
}

impl StrataError {
    /// Create a connection error for a resource
    pub fn connection(resource: ResourceKind, message: impl Into<String>) -> Self {
        Self::Connection {
            resource,
            message: message.into(),
        }
    }

    /// Create an unsupported-authenticator error
    pub fn unsupported_authenticator(resource: ResourceKind, message: impl Into<String>) -> Self {
        Self::UnsupportedAuthenticator {
            resource,
            message: message.into(),
        }
    }

    /// Create a session identity mismatch error
    pub fn identity_mismatch(resource: ResourceKind, message: impl Into<String>) -> Self {
        Self::SessionIdentityMismatch {
            resource,
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a decryption error
    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption {
            message: message.into(),
        }
    }

    /// Create an indexing error
    pub fn indexing(message: impl Into<String>) -> Self {
        Self::Indexing {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Standard Result type for Strata operations
pub type Result<T> = std::result::Result<T, StrataError>;
