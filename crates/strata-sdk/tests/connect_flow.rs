//! End-to-end connect, restore, and disconnect flows.

use std::sync::Arc;

use strata_core::effects::IndexTarget;
use strata_core::{Chain, ResourceKind, StrataError};
use strata_sdk::{
    AuthenticatedResource as _, Authenticator, KeyAuthenticator, PersistedBundle, SessionSlot,
    StrataClient, BUNDLE_KEY,
};
use strata_sessions::WalletSigner as _;
use strata_testkit::{
    MemoryDocumentStore, MemoryKeyValueStore, MockEncryptionBackend, RecordingIndexer, TestWallet,
};

const ALICE: &str = "0xA11ce00000000000000000000000000000000001";
const BOB: &str = "0xB0b0000000000000000000000000000000000002";

struct Harness {
    kv: Arc<MemoryKeyValueStore>,
    indexer: Arc<RecordingIndexer>,
    client: StrataClient,
}

fn harness() -> Harness {
    strata_testkit::init_test_tracing();
    let kv = Arc::new(MemoryKeyValueStore::new());
    let indexer = Arc::new(RecordingIndexer::new());
    let client = StrataClient::new(
        Arc::new(MemoryDocumentStore::new()),
        kv.clone(),
        indexer.clone(),
    )
    .with_encryption(Arc::new(MockEncryptionBackend::new()));
    Harness {
        kv,
        indexer,
        client,
    }
}

fn wallet(address: &str) -> Authenticator {
    Authenticator::Wallet(Arc::new(TestWallet::evm(address)))
}

#[tokio::test]
async fn storage_only_connect_persists_an_inactive_encryption_slot() {
    let h = harness();
    let result = h
        .client
        .connect(&wallet(ALICE), &[ResourceKind::Storage])
        .await
        .unwrap();

    assert_eq!(result.scopes, vec![ResourceKind::Storage]);
    assert_eq!(result.user.chain, Chain::Evm);

    let bundle = PersistedBundle::from_json(&h.kv.peek(BUNDLE_KEY).unwrap()).unwrap();
    assert_eq!(bundle.encryption, SessionSlot::inactive());
    assert_eq!(bundle.user_information.did, result.user.did);

    // the persisted storage session is a signed artifact over the
    // lowercased address
    let session =
        strata_sessions::SignedSession::deserialize(bundle.storage.as_active().unwrap()).unwrap();
    assert_eq!(session.address(), ALICE.to_lowercase());
}

#[tokio::test]
async fn empty_scopes_succeed_only_when_a_session_already_exists() {
    let h = harness();
    let auth = wallet(ALICE);

    let err = h.client.connect(&auth, &[]).await.unwrap_err();
    assert!(matches!(err, StrataError::NoSessionEstablished { .. }));

    h.client
        .connect(&auth, &[ResourceKind::Storage])
        .await
        .unwrap();

    let result = h.client.connect(&auth, &[]).await.unwrap();
    assert_eq!(result.scopes, vec![ResourceKind::Storage]);
}

#[tokio::test]
async fn full_connect_establishes_both_scopes_and_indexes_the_profile() {
    let h = harness();
    let result = h
        .client
        .connect(
            &wallet(ALICE),
            &[ResourceKind::Storage, ResourceKind::Encryption],
        )
        .await
        .unwrap();

    assert_eq!(
        result.scopes,
        vec![ResourceKind::Storage, ResourceKind::Encryption]
    );

    result.indexing.unwrap().wait().await.unwrap();
    let submissions = h.indexer.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].0, result.user.did);
    assert_eq!(submissions[0].1, IndexTarget::Profile);
}

#[tokio::test]
async fn key_authenticator_cannot_request_the_encryption_scope() {
    let h = harness();
    let auth = Authenticator::LocalKey(KeyAuthenticator::generate());
    let err = h
        .client
        .connect(&auth, &[ResourceKind::Storage, ResourceKind::Encryption])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StrataError::UnsupportedAuthenticator {
            resource: ResourceKind::Encryption,
            ..
        }
    ));
}

#[tokio::test]
async fn encryption_scope_without_a_backend_is_not_configured() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let client = StrataClient::new(
        Arc::new(MemoryDocumentStore::new()),
        kv,
        Arc::new(RecordingIndexer::new()),
    );

    let err = client
        .connect(&wallet(ALICE), &[ResourceKind::Encryption])
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::EncryptionNotConfigured));
}

#[tokio::test]
async fn reconnecting_the_same_identity_reuses_sessions() {
    let h = harness();
    let auth = Authenticator::LocalKey(KeyAuthenticator::generate());

    h.client
        .connect(&auth, &[ResourceKind::Storage])
        .await
        .unwrap();
    let first = h.client.storage().serialized_session().await.unwrap();

    h.client
        .connect(&auth, &[ResourceKind::Storage])
        .await
        .unwrap();
    let second = h.client.storage().serialized_session().await.unwrap();

    // a re-authorization would have minted a fresh session artifact
    assert_eq!(first, second);
}

#[tokio::test]
async fn connecting_a_new_identity_clears_stale_sessions() {
    let h = harness();
    h.client
        .connect(
            &wallet(ALICE),
            &[ResourceKind::Storage, ResourceKind::Encryption],
        )
        .await
        .unwrap();

    let result = h
        .client
        .connect(&wallet(BOB), &[ResourceKind::Storage])
        .await
        .unwrap();

    assert_eq!(result.scopes, vec![ResourceKind::Storage]);
    // the encryption session belonged to alice and was not requested for bob
    assert!(h.client.encryption().unwrap().session().await.is_none());
    assert!(h.client.is_connected(Some(BOB)).await);
    assert!(!h.client.is_connected(Some(ALICE)).await);
}

#[tokio::test]
async fn restore_replays_the_persisted_bundle() {
    let h = harness();
    let connected = h
        .client
        .connect(
            &wallet(ALICE),
            &[ResourceKind::Storage, ResourceKind::Encryption],
        )
        .await
        .unwrap();

    // a fresh client sharing only the key-value store
    let restored_client = StrataClient::new(
        Arc::new(MemoryDocumentStore::new()),
        h.kv.clone(),
        Arc::new(RecordingIndexer::new()),
    )
    .with_encryption(Arc::new(MockEncryptionBackend::new()));

    let restored = restored_client.restore().await.unwrap();
    assert_eq!(restored.user.did, connected.user.did);
    assert_eq!(
        restored.scopes,
        vec![ResourceKind::Storage, ResourceKind::Encryption]
    );
    assert!(restored.indexing.is_none());
}

#[tokio::test]
async fn restore_with_a_partial_bundle_yields_partial_scopes() {
    let h = harness();
    h.client
        .connect(
            &wallet(ALICE),
            &[ResourceKind::Storage, ResourceKind::Encryption],
        )
        .await
        .unwrap();

    let mut bundle = PersistedBundle::from_json(&h.kv.peek(BUNDLE_KEY).unwrap()).unwrap();
    bundle.storage = SessionSlot::inactive();

    let fresh = harness();
    let restored = fresh
        .client
        .restore_bundle(&bundle.to_json().unwrap())
        .await
        .unwrap();
    assert_eq!(restored.scopes, vec![ResourceKind::Encryption]);
}

#[tokio::test]
async fn restoring_a_tampered_bundle_establishes_nothing() {
    let h = harness();
    h.client
        .connect(&wallet(ALICE), &[ResourceKind::Storage])
        .await
        .unwrap();

    let mut bundle = PersistedBundle::from_json(&h.kv.peek(BUNDLE_KEY).unwrap()).unwrap();
    // swap the user out from under the session
    bundle.user_information.metadata.insert(
        "address".to_string(),
        serde_json::Value::String(BOB.to_string()),
    );
    bundle.user_information.did = format!("did:pkh:eip155:1:{BOB}");

    let fresh = harness();
    let err = fresh
        .client
        .restore_bundle(&bundle.to_json().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::NoSessionEstablished { .. }));
}

#[tokio::test]
async fn restore_without_a_bundle_fails() {
    let h = harness();
    let err = h.client.restore().await.unwrap_err();
    assert!(matches!(err, StrataError::NoSessionEstablished { .. }));
}

#[tokio::test]
async fn disconnect_erases_everything() {
    let h = harness();
    h.client
        .connect(
            &wallet(ALICE),
            &[ResourceKind::Storage, ResourceKind::Encryption],
        )
        .await
        .unwrap();

    h.client.disconnect().await;

    assert!(!h.client.is_connected(None).await);
    assert!(h.client.connected_user().await.is_none());
    assert!(h.kv.peek(BUNDLE_KEY).is_none());
    assert!(h.client.storage().session().await.is_none());
}

#[tokio::test]
async fn is_connected_matches_addresses_case_insensitively_on_evm() {
    let h = harness();
    h.client
        .connect(&wallet(ALICE), &[ResourceKind::Storage])
        .await
        .unwrap();

    assert!(h.client.is_connected(Some(&ALICE.to_lowercase())).await);
    assert!(!h.client.is_connected(Some(BOB)).await);
}

#[tokio::test]
async fn solana_wallet_connects_for_encryption() {
    let h = harness();
    let wallet = TestWallet::solana("7rDxw6mdB2jSMAvy7cr2WdrEYw5eKzLcuj2Ceu6rW9sN");
    let address = wallet.address();
    let auth = Authenticator::Wallet(Arc::new(wallet));

    let result = h
        .client
        .connect(&auth, &[ResourceKind::Storage, ResourceKind::Encryption])
        .await
        .unwrap();

    assert_eq!(result.user.did, format!("did:pkh:solana:mainnet:{address}"));
    assert_eq!(
        result.scopes,
        vec![ResourceKind::Storage, ResourceKind::Encryption]
    );
}
