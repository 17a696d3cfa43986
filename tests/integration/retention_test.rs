use chrono::{Duration, Utc};
use tokio::sync::watch;

use docvault_service::RetentionPolicy;

use crate::helpers::TestApp;

fn strict() -> RetentionPolicy {
    RetentionPolicy {
        keep_recent: 1,
        keep_days: 0,
        milestone_interval: 0,
    }
}

fn later() -> chrono::DateTime<Utc> {
    Utc::now() + Duration::seconds(1)
}

#[tokio::test]
async fn test_cleanup_is_idempotent_and_frees_disk() {
    let app = TestApp::new().await;
    let doc = app.document("one").await;
    let v1 = app
        .services
        .chain
        .get_version(doc.id, doc.current_version_id.unwrap())
        .await
        .unwrap();
    app.upload(doc.id, "two").await;
    app.upload(doc.id, "three").await;
    let head = app.upload(doc.id, "four").await;

    let first = app
        .services
        .retention
        .cleanup_at(doc.id, strict(), later())
        .await
        .unwrap();
    assert_eq!(first.deleted_count, 2);
    assert!(first.content_failures.is_empty());
    assert!(!app.stored(&v1.content_key).await);
    assert!(app.stored(&head.content_key).await);

    let second = app
        .services
        .retention
        .cleanup_at(doc.id, strict(), later())
        .await
        .unwrap();
    assert_eq!(second.deleted_count, 0);
    assert_eq!(second.bytes_freed, 0);

    let versions = app.services.chain.list_versions(doc.id).await.unwrap();
    let numbers: Vec<i32> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![3, 4]);
}

#[tokio::test]
async fn test_rollback_versions_are_retained() {
    let app = TestApp::new().await;
    let doc = app.document("base").await;
    let v1 = doc.current_version_id.unwrap();
    app.upload(doc.id, "edit").await;
    let restored = app
        .services
        .rollback
        .rollback(&app.ctx, doc.id, v1, "restore")
        .await
        .unwrap();
    app.upload(doc.id, "after").await;
    app.upload(doc.id, "latest").await;

    app.services
        .retention
        .cleanup_at(
            doc.id,
            RetentionPolicy {
                keep_recent: 0,
                keep_days: 0,
                milestone_interval: 0,
            },
            later(),
        )
        .await
        .unwrap();

    let versions = app.services.chain.list_versions(doc.id).await.unwrap();
    assert!(versions.iter().any(|v| v.id == restored.id));
    assert!(app.stored(&restored.content_key).await);
}

#[tokio::test]
async fn test_cancelled_sweep_processes_nothing() {
    let app = TestApp::new().await;
    app.document("a").await;
    app.document("b").await;
    let (_tx, rx) = watch::channel(true);

    let report = app.services.retention.sweep(strict(), &rx).await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.documents_processed, 0);
}
