//! Approval workflow state machine.
//!
//! `pending → in_progress → {approved, rejected}`, and
//! `pending | in_progress → expired` when the scheduler finds the due date
//! has passed. Every transition is a conditional update in the store.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::events::{DomainEvent, EventBus, WorkflowEvent};
use docvault_core::result::AppResult;
use docvault_database::store::Stores;
use docvault_entity::approval::{ApprovalDecision, DocumentApproval};
use docvault_entity::document::Document;
use docvault_entity::workflow::{CreateWorkflow, DocumentWorkflow, WorkflowData, WorkflowType};

use crate::context::ActorContext;

/// Outcome of an expiry scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpiryReport {
    /// Workflows moved to `expired`.
    pub expired: Vec<Uuid>,
    /// Overdue workflows decided concurrently before they could expire.
    pub skipped: u64,
    pub cancelled: bool,
}

/// Drives workflow transitions and records decisions.
#[derive(Debug, Clone)]
pub struct WorkflowService {
    stores: Stores,
    events: EventBus,
    approval_due_days: i64,
}

impl WorkflowService {
    /// Creates a new workflow service.
    pub fn new(stores: Stores, events: EventBus, approval_due_days: i64) -> Self {
        Self {
            stores,
            events,
            approval_due_days,
        }
    }

    /// Open a `pending` approval workflow for a document version. The
    /// document moves to `pending_approval` in the same transaction.
    pub async fn open_approval(
        &self,
        ctx: &ActorContext,
        document: &Document,
        version_number: i32,
        assignee_id: Option<Uuid>,
        required_role: Option<String>,
    ) -> AppResult<DocumentWorkflow> {
        let now = Utc::now();
        let workflow = CreateWorkflow {
            document_id: document.id,
            workflow_type: WorkflowType::Approval,
            assignee_id,
            due_date: Some(now + Duration::days(self.approval_due_days)),
            workflow_data: WorkflowData::Approval {
                requested_by: ctx.actor_id,
                version_number,
                required_role,
                extra: Value::Null,
            },
        }
        .into_workflow(now);

        let workflow = self.stores.workflows.create_workflow(&workflow).await?;

        info!(
            workflow_id = %workflow.id,
            document_id = %document.id,
            version = version_number,
            "Approval workflow opened"
        );
        self.events.publish(DomainEvent::workflow(
            Some(ctx.actor_id),
            WorkflowEvent::Created {
                workflow_id: workflow.id,
                document_id: document.id,
                assignee: assignee_id,
            },
        ));
        Ok(workflow)
    }

    /// `pending → in_progress`, assigning the reviewer.
    pub async fn start_review(
        &self,
        ctx: &ActorContext,
        workflow_id: Uuid,
        assignee_id: Option<Uuid>,
    ) -> AppResult<DocumentWorkflow> {
        let assignee = assignee_id.unwrap_or(ctx.actor_id);
        let Some(workflow) = self
            .stores
            .workflows
            .start_workflow(workflow_id, assignee, Utc::now())
            .await?
        else {
            let current = self.get_workflow(workflow_id).await?;
            return Err(AppError::invalid_state(format!(
                "Workflow {workflow_id} is {} and cannot be started",
                current.status
            )));
        };

        info!(workflow_id = %workflow_id, assignee = %assignee, "Review started");
        self.events.publish(DomainEvent::workflow(
            Some(ctx.actor_id),
            WorkflowEvent::Started {
                workflow_id,
                document_id: workflow.document_id,
                assignee,
            },
        ));
        Ok(workflow)
    }

    /// Record an approval decision, closing the workflow and setting the
    /// document's status atomically.
    ///
    /// Fails with `InvalidState` on a terminal workflow and with
    /// `ConcurrentModification` when another decision won a race.
    pub async fn record_decision(
        &self,
        ctx: &ActorContext,
        workflow_id: Uuid,
        decision: ApprovalDecision,
        comments: Option<String>,
    ) -> AppResult<(DocumentWorkflow, DocumentApproval)> {
        let workflow = self.get_workflow(workflow_id).await?;
        if workflow.status.is_terminal() {
            return Err(AppError::invalid_state(format!(
                "Workflow {workflow_id} is already {}",
                workflow.status
            )));
        }

        let approval = DocumentApproval {
            id: Uuid::new_v4(),
            workflow_id,
            document_id: workflow.document_id,
            approver_id: ctx.actor_id,
            approver_role: ctx.role.clone(),
            decision,
            comments: comments.filter(|c| !c.trim().is_empty()),
            decided_at: Utc::now(),
        };

        let Some(decided) = self.stores.workflows.record_decision(&approval).await? else {
            let current = self.get_workflow(workflow_id).await?;
            return Err(if current.status.is_terminal() {
                AppError::invalid_state(format!("Workflow {workflow_id} is already {}", current.status))
            } else {
                AppError::concurrent_modification(format!(
                    "Workflow {workflow_id} changed during the decision; retry"
                ))
            });
        };

        info!(
            workflow_id = %workflow_id,
            document_id = %decided.document_id,
            decision = %decision,
            approver_id = %ctx.actor_id,
            "Approval decision recorded"
        );

        let event = match decision {
            ApprovalDecision::Approved => WorkflowEvent::Approved {
                workflow_id,
                document_id: decided.document_id,
                approver_id: ctx.actor_id,
                comments: approval.comments.clone(),
            },
            ApprovalDecision::Rejected => WorkflowEvent::Rejected {
                workflow_id,
                document_id: decided.document_id,
                approver_id: ctx.actor_id,
                comments: approval.comments.clone(),
            },
        };
        self.events
            .publish(DomainEvent::workflow(Some(ctx.actor_id), event));

        Ok((decided, approval))
    }

    /// Expire every open workflow whose due date is before `now`.
    ///
    /// A workflow decided between the scan and the update is skipped. The
    /// document keeps its `pending_approval` status.
    pub async fn expire_overdue(
        &self,
        now: DateTime<Utc>,
        cancel: &watch::Receiver<bool>,
    ) -> AppResult<ExpiryReport> {
        let overdue = self.stores.workflows.find_overdue(now).await?;
        let mut report = ExpiryReport::default();

        for workflow in overdue {
            if *cancel.borrow() {
                report.cancelled = true;
                break;
            }
            match self.stores.workflows.expire_workflow(workflow.id, now).await {
                Ok(Some(expired)) => {
                    info!(
                        workflow_id = %expired.id,
                        document_id = %expired.document_id,
                        "Workflow expired"
                    );
                    self.events.publish(DomainEvent::workflow(
                        None,
                        WorkflowEvent::Expired {
                            workflow_id: expired.id,
                            document_id: expired.document_id,
                        },
                    ));
                    report.expired.push(expired.id);
                }
                Ok(None) => report.skipped += 1,
                Err(e) => {
                    warn!(workflow_id = %workflow.id, error = %e, "Failed to expire workflow");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    /// A workflow by ID.
    pub async fn get_workflow(&self, workflow_id: Uuid) -> AppResult<DocumentWorkflow> {
        self.stores
            .workflows
            .find_workflow(workflow_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Workflow {workflow_id} not found")))
    }

    /// All workflows of a document, newest first.
    pub async fn list_workflows(&self, document_id: Uuid) -> AppResult<Vec<DocumentWorkflow>> {
        self.ensure_document(document_id).await?;
        self.stores.workflows.list_workflows(document_id).await
    }

    /// All decisions recorded against a document.
    pub async fn list_approvals(&self, document_id: Uuid) -> AppResult<Vec<DocumentApproval>> {
        self.ensure_document(document_id).await?;
        self.stores.workflows.list_approvals(document_id).await
    }

    async fn ensure_document(&self, document_id: Uuid) -> AppResult<()> {
        self.stores
            .documents
            .find_document(document_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))
    }
}
