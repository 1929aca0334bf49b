//! Shared test doubles for the Strata crates.
//!
//! Everything here is deterministic and in-memory so tests can exercise
//! the session, gating, and orchestration layers without touching a real
//! storage network, encryption service, or wallet.
//!
//! # Blocking Lock Usage
//!
//! Uses `std::sync::Mutex` because this is test infrastructure: tests run
//! in controlled contexts, contention is not a concern, and the simpler
//! synchronous API keeps the doubles readable.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::disallowed_types)]

pub mod document;
pub mod encryption;
pub mod indexer;
pub mod keyvalue;
pub mod wallet;

pub use document::MemoryDocumentStore;
pub use encryption::MockEncryptionBackend;
pub use indexer::RecordingIndexer;
pub use keyvalue::MemoryKeyValueStore;
pub use wallet::TestWallet;

/// Initialize tracing output for a test. Safe to call from every test;
/// only the first call installs the subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
