use chrono::{Duration, Utc};
use serde_json::Value;
use tokio::sync::watch;

use docvault_core::error::ErrorKind;
use docvault_core::events::{EventPayload, WorkflowEvent};
use docvault_entity::approval::ApprovalDecision;
use docvault_entity::document::DocumentStatus;
use docvault_entity::workflow::WorkflowStatus;
use docvault_worker::JobExecutor;
use docvault_worker::jobs::{WORKFLOW_EXPIRY, WorkflowExpiryHandler};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_approval_then_second_decision_fails() {
    let app = TestApp::new().await;
    let reg = app.register("first aid certificate", true).await;
    let workflow = reg.workflow.unwrap();
    assert_eq!(reg.document.status, DocumentStatus::PendingApproval);
    let mut events = app.events.subscribe();

    let (decided, _) = app
        .services
        .workflows
        .record_decision(&app.ctx, workflow.id, ApprovalDecision::Approved, None)
        .await
        .unwrap();
    assert_eq!(decided.status, WorkflowStatus::Approved);

    let document = app.services.intake.get_document(reg.document.id).await.unwrap();
    assert_eq!(document.status, DocumentStatus::Active);

    let err = app
        .services
        .workflows
        .record_decision(&app.ctx, workflow.id, ApprovalDecision::Rejected, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    let event = events.recv().await.unwrap();
    assert!(matches!(
        event.payload,
        EventPayload::Workflow(WorkflowEvent::Approved { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_decisions_apply_once() {
    let app = TestApp::new().await;
    let reg = app.register("plan", true).await;
    let workflow_id = reg.workflow.unwrap().id;

    let approve = {
        let workflows = app.services.workflows.clone();
        let ctx = app.ctx.clone();
        tokio::spawn(async move {
            workflows
                .record_decision(&ctx, workflow_id, ApprovalDecision::Approved, None)
                .await
        })
    };
    let reject = {
        let workflows = app.services.workflows.clone();
        let ctx = app.ctx.clone();
        tokio::spawn(async move {
            workflows
                .record_decision(&ctx, workflow_id, ApprovalDecision::Rejected, None)
                .await
        })
    };

    let results = [approve.await.unwrap(), reject.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            err.kind,
            ErrorKind::InvalidState | ErrorKind::ConcurrentModification
        ));
    }

    let approvals = app
        .services
        .workflows
        .list_approvals(reg.document.id)
        .await
        .unwrap();
    assert_eq!(approvals.len(), 1);
}

#[tokio::test]
async fn test_expiry_scan() {
    let app = TestApp::new().await;
    let overdue = app.register("late", true).await;
    let (_tx, rx) = watch::channel(false);

    let report = app
        .services
        .workflows
        .expire_overdue(Utc::now() + Duration::days(30), &rx)
        .await
        .unwrap();
    assert_eq!(report.expired, vec![overdue.workflow.as_ref().unwrap().id]);

    let workflow = app
        .services
        .workflows
        .get_workflow(overdue.workflow.unwrap().id)
        .await
        .unwrap();
    assert_eq!(workflow.status, WorkflowStatus::Expired);
    assert!(workflow.completed_at.is_some());

    let err = app
        .services
        .workflows
        .record_decision(&app.ctx, workflow.id, ApprovalDecision::Approved, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_expiry_job_runs_through_the_executor() {
    let app = TestApp::new().await;
    app.register("fresh", true).await;

    let mut executor = JobExecutor::new();
    executor.register(std::sync::Arc::new(WorkflowExpiryHandler::new(
        app.services.workflows.clone(),
    )));
    let (_tx, rx) = watch::channel(false);

    let out: Value = executor.execute(WORKFLOW_EXPIRY, &rx).await.unwrap();
    assert_eq!(out["expired"], 0);
}
