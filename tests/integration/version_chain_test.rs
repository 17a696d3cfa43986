use bytes::Bytes;

use docvault_core::traits::storage::ContentStore;
use docvault_entity::version::{ChangeMetadata, ChangeType};
use docvault_storage::{LocalContentStore, hash_bytes};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_upload_and_rollback_scenario() {
    let app = TestApp::new().await;
    let doc = app.document("v1").await;
    let v1 = doc.current_version_id.unwrap();
    let v2 = app.upload(doc.id, "v2").await;

    let v3 = app
        .services
        .rollback
        .rollback(&app.ctx, doc.id, v1, "Uploaded the wrong participant's plan")
        .await
        .unwrap();

    assert_eq!(v3.version_number, 3);
    assert_eq!(v3.content_hash, hash_bytes(b"v1"));
    assert_eq!(v3.change_type(), Some(ChangeType::Rollback));
    match &v3.change().unwrap().change {
        ChangeMetadata::Rollback {
            rolled_back_to_version,
            ..
        } => assert_eq!(*rolled_back_to_version, 1),
        other => panic!("unexpected change: {other:?}"),
    }

    let document = app.services.chain.load_document(doc.id).await.unwrap();
    assert_eq!(document.version, 3);
    assert_eq!(document.current_version_id, Some(v3.id));

    let versions = app.services.chain.list_versions(doc.id).await.unwrap();
    assert_eq!(versions.len(), 3);
    assert_eq!(versions[0].successor_id, Some(v2.id));
    assert_eq!(versions[1].successor_id, Some(v3.id));
    assert_eq!(versions[2].successor_id, None);
}

#[tokio::test]
async fn test_repeated_rollback_creates_new_versions() {
    let app = TestApp::new().await;
    let doc = app.document("original").await;
    let v1 = doc.current_version_id.unwrap();
    app.upload(doc.id, "edited").await;

    let first = app
        .services
        .rollback
        .rollback(&app.ctx, doc.id, v1, "restore")
        .await
        .unwrap();
    let second = app
        .services
        .rollback
        .rollback(&app.ctx, doc.id, v1, "restore again")
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert!(second.version_number > first.version_number);
    assert_eq!(first.content_hash, second.content_hash);
}

#[tokio::test]
async fn test_history_survives_a_content_store_restart() {
    let app = TestApp::new().await;
    let doc = app.document("kept on disk").await;
    let v1 = doc.current_version_id.unwrap();
    app.upload(doc.id, "newer").await;

    let version = app.services.chain.get_version(doc.id, v1).await.unwrap();
    let reopened = LocalContentStore::new(app.root.path().to_str().unwrap())
        .await
        .unwrap();
    let data = reopened.get(&version.content_key).await.unwrap();
    assert_eq!(data, Bytes::from("kept on disk"));
}

#[tokio::test]
async fn test_compare_is_antisymmetric() {
    let app = TestApp::new().await;
    let doc = app.document("abc").await;
    let v1 = doc.current_version_id.unwrap();
    let v2 = app.upload(doc.id, "abcdefgh").await;

    let forward = app
        .services
        .chain
        .compare_versions(doc.id, v1, v2.id)
        .await
        .unwrap();
    let backward = app
        .services
        .chain
        .compare_versions(doc.id, v2.id, v1)
        .await
        .unwrap();

    assert_eq!(forward.size_delta, 5);
    assert_eq!(forward.size_delta, -backward.size_delta);
    assert!(forward.content_changed);
}
