//! Record and profile operations, including encrypt-on-write and
//! decrypt-on-read with the silent degradation policy.

use std::sync::Arc;

use strata_core::effects::IndexTarget;
use strata_core::{ResourceKind, StrataError};
use strata_sdk::{
    AccessRule, Authenticator, BodyContent, DecryptPolicy, Record, StrataClient,
};
use strata_testkit::{
    MemoryDocumentStore, MemoryKeyValueStore, MockEncryptionBackend, RecordingIndexer, TestWallet,
};

const ALICE: &str = "0xA11ce00000000000000000000000000000000001";
const BOB: &str = "0xB0b0000000000000000000000000000000000002";

struct Harness {
    store: Arc<MemoryDocumentStore>,
    indexer: Arc<RecordingIndexer>,
    client: StrataClient,
}

async fn connected_harness() -> Harness {
    strata_testkit::init_test_tracing();
    let store = Arc::new(MemoryDocumentStore::new());
    let indexer = Arc::new(RecordingIndexer::new());
    let client = StrataClient::new(
        store.clone(),
        Arc::new(MemoryKeyValueStore::new()),
        indexer.clone(),
    )
    .with_encryption(Arc::new(MockEncryptionBackend::new()));

    let auth = Authenticator::Wallet(Arc::new(TestWallet::evm(ALICE)));
    client
        .connect(&auth, &[ResourceKind::Storage, ResourceKind::Encryption])
        .await
        .unwrap();

    Harness {
        store,
        indexer,
        client,
    }
}

fn dids_rule(address: &str) -> [AccessRule; 1] {
    [AccessRule::dids([format!("did:pkh:eip155:1:{address}")])]
}

/// Reload a stored record the way a reader would receive it.
async fn stored_record(h: &Harness, id: &strata_core::effects::DocumentId) -> Record {
    let doc = h.client.storage().get_document(id).await.unwrap();
    serde_json::from_value(doc.content).unwrap()
}

#[tokio::test]
async fn plain_records_are_stored_verbatim_and_indexed() {
    let h = connected_harness().await;
    let (id, ticket) = h
        .client
        .create_record(Record::titled("hello", "first post"), None)
        .await
        .unwrap();
    ticket.wait().await.unwrap();

    let record = stored_record(&h, &id).await;
    assert_eq!(record.body, "first post");
    assert!(record.encrypted_body.is_none());

    let submissions = h.indexer.submissions();
    assert!(submissions.contains(&(id.0.clone(), IndexTarget::Document)));
}

#[tokio::test]
async fn rules_move_the_body_into_an_encrypted_envelope() {
    let h = connected_harness().await;
    let (id, _ticket) = h
        .client
        .create_record(Record::plain("members only"), Some(&dids_rule(ALICE)))
        .await
        .unwrap();

    let record = stored_record(&h, &id).await;
    assert_eq!(record.body, "");
    let encrypted = record.encrypted_body.as_ref().unwrap();
    assert!(encrypted.unified_control_conditions.is_some());

    let decrypted = h.client.decrypt_record(&record).await.unwrap();
    assert_eq!(decrypted, "members only");
}

#[tokio::test]
async fn encrypting_an_empty_body_is_rejected() {
    let h = connected_harness().await;
    let err = h
        .client
        .create_record(Record::plain(""), Some(&dids_rule(ALICE)))
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::Invalid { .. }));
    assert_eq!(h.store.len(), 0);
}

#[tokio::test]
async fn silent_batch_decrypt_degrades_only_the_revoked_item() {
    let h = connected_harness().await;

    let (id_mine, _) = h
        .client
        .create_record(Record::plain("for me"), Some(&dids_rule(ALICE)))
        .await
        .unwrap();
    let (id_revoked, _) = h
        .client
        .create_record(Record::plain("for bob"), Some(&dids_rule(BOB)))
        .await
        .unwrap();
    let (id_plain, _) = h
        .client
        .create_record(Record::plain("public"), None)
        .await
        .unwrap();

    let batch = vec![
        stored_record(&h, &id_mine).await,
        stored_record(&h, &id_revoked).await,
        stored_record(&h, &id_plain).await,
    ];

    let bodies = h
        .client
        .decrypt_records(&batch, DecryptPolicy::Silent)
        .await
        .unwrap();

    assert_eq!(bodies.len(), 3);
    assert!(matches!(&bodies[0], BodyContent::Plain(text) if text == "for me"));
    match &bodies[1] {
        BodyContent::Degraded {
            encrypted_body,
            error,
        } => {
            // The stored ciphertext survives the failed decrypt untouched.
            assert_eq!(Some(encrypted_body), batch[1].encrypted_body.as_ref());
            assert!(matches!(error, StrataError::Decryption { .. }));
        }
        other => panic!("expected a degraded body, got {other:?}"),
    }
    assert!(matches!(&bodies[2], BodyContent::NotEncrypted(text) if text == "public"));
}

#[tokio::test]
async fn strict_batch_decrypt_propagates_the_first_failure() {
    let h = connected_harness().await;
    let (id, _) = h
        .client
        .create_record(Record::plain("for bob"), Some(&dids_rule(BOB)))
        .await
        .unwrap();

    let batch = vec![stored_record(&h, &id).await];
    let err = h
        .client
        .decrypt_records(&batch, DecryptPolicy::Strict)
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::Decryption { .. }));
}

#[tokio::test]
async fn update_and_delete_reindex_the_record() {
    let h = connected_harness().await;
    let (id, _) = h
        .client
        .create_record(Record::plain("v1"), None)
        .await
        .unwrap();

    h.client
        .update_record(&id, Record::plain("v2"), None)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(stored_record(&h, &id).await.body, "v2");

    h.client.delete_record(&id).await.unwrap().wait().await.unwrap();
    let doc = h.client.storage().get_document(&id).await.unwrap();
    assert_eq!(doc.content, serde_json::json!({ "deleted": true }));
}

#[tokio::test]
async fn profile_updates_resubmit_the_profile_for_indexing() {
    let h = connected_harness().await;
    let (_, ticket) = h
        .client
        .update_profile(serde_json::json!({ "username": "alice" }))
        .await
        .unwrap();
    ticket.wait().await.unwrap();

    let profile_submissions = h
        .indexer
        .submissions()
        .into_iter()
        .filter(|(_, target)| *target == IndexTarget::Profile)
        .count();
    // one from connect, one from the profile update
    assert!(profile_submissions >= 2);
}

#[tokio::test]
async fn profile_email_is_encrypted_to_the_caller_and_the_indexer() {
    let h = connected_harness().await;
    let (id, ticket) = h.client.set_profile_email("alice@example.com").await.unwrap();
    ticket.wait().await.unwrap();

    let doc = h.client.storage().get_document(&id).await.unwrap();
    let indexed: strata_gating::IndexedEncryptedRecord =
        serde_json::from_value(doc.content["encryptedEmail"].clone()).unwrap();
    assert!(indexed.unified_control_conditions.is_some());

    // the caller is a recipient and can read it back
    let record = Record {
        title: None,
        body: String::new(),
        encrypted_body: Some(indexed),
    };
    let email = h.client.decrypt_record(&record).await.unwrap();
    assert_eq!(email, "alice@example.com");
}

#[tokio::test]
async fn content_operations_require_a_connected_user() {
    let client = StrataClient::new(
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(RecordingIndexer::new()),
    );

    let err = client
        .create_record(Record::plain("hello"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StrataError::AuthenticationRequired));
}

#[tokio::test]
async fn indexing_failures_surface_through_the_ticket_only() {
    let h = connected_harness().await;
    h.indexer.set_failing(true);

    // the write itself still succeeds
    let (_, ticket) = h
        .client
        .create_record(Record::plain("hello"), None)
        .await
        .unwrap();

    let err = ticket.wait().await.unwrap_err();
    assert!(matches!(err, StrataError::Indexing { .. }));
}
