use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use docvault_api::{AppState, build_app};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_router_serves_registered_documents() {
    let app = TestApp::new().await;
    let reg = app.register("policy", false).await;
    let state = AppState::new(
        app.config.clone(),
        app.services.clone(),
        Arc::clone(&app.content) as Arc<dyn docvault_core::traits::storage::ContentStore>,
        None,
    );
    let router = build_app(state);

    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/documents/{}/versions", reg.document.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = router
        .oneshot(
            Request::get(format!(
                "/api/documents/{}/versions/{}/content",
                reg.document.id, reg.version.id
            ))
            .body(Body::empty())
            .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/pdf"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"policy");
}
