//! Workflow and approval repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_entity::approval::DocumentApproval;
use docvault_entity::document::DocumentStatus;
use docvault_entity::workflow::{DocumentWorkflow, WorkflowType};

use crate::store::WorkflowStore;

/// Repository for workflow and approval rows.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    pool: PgPool,
}

impl WorkflowRepository {
    /// Create a new workflow repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowStore for WorkflowRepository {
    async fn create_workflow(&self, workflow: &DocumentWorkflow) -> AppResult<DocumentWorkflow> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let created = sqlx::query_as::<_, DocumentWorkflow>(
            "INSERT INTO document_workflows (id, document_id, workflow_type, status, assignee_id, \
             due_date, completed_at, notes, workflow_data, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(workflow.id)
        .bind(workflow.document_id)
        .bind(workflow.workflow_type)
        .bind(workflow.status)
        .bind(workflow.assignee_id)
        .bind(workflow.due_date)
        .bind(workflow.completed_at)
        .bind(&workflow.notes)
        .bind(&workflow.workflow_data)
        .bind(workflow.created_at)
        .bind(workflow.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create workflow", e))?;

        if workflow.workflow_type == WorkflowType::Approval {
            let updated = sqlx::query(
                "UPDATE documents SET status = $2, updated_at = $3 WHERE id = $1",
            )
            .bind(workflow.document_id)
            .bind(DocumentStatus::PendingApproval)
            .bind(workflow.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update document status", e)
            })?;
            if updated.rows_affected() == 0 {
                return Err(AppError::not_found(format!(
                    "Document {} not found",
                    workflow.document_id
                )));
            }
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit workflow", e)
        })?;
        Ok(created)
    }

    async fn find_workflow(&self, id: Uuid) -> AppResult<Option<DocumentWorkflow>> {
        sqlx::query_as::<_, DocumentWorkflow>("SELECT * FROM document_workflows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find workflow", e))
    }

    async fn list_workflows(&self, document_id: Uuid) -> AppResult<Vec<DocumentWorkflow>> {
        sqlx::query_as::<_, DocumentWorkflow>(
            "SELECT * FROM document_workflows WHERE document_id = $1 ORDER BY created_at DESC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list workflows", e))
    }

    async fn start_workflow(
        &self,
        id: Uuid,
        assignee_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DocumentWorkflow>> {
        sqlx::query_as::<_, DocumentWorkflow>(
            "UPDATE document_workflows SET status = 'in_progress', assignee_id = $2, updated_at = $3 \
             WHERE id = $1 AND status = 'pending' RETURNING *",
        )
        .bind(id)
        .bind(assignee_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to start workflow", e))
    }

    async fn record_decision(
        &self,
        approval: &DocumentApproval,
    ) -> AppResult<Option<DocumentWorkflow>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let decided = sqlx::query_as::<_, DocumentWorkflow>(
            "UPDATE document_workflows SET status = $2, completed_at = $3, notes = $4, updated_at = $3 \
             WHERE id = $1 AND status IN ('pending', 'in_progress') RETURNING *",
        )
        .bind(approval.workflow_id)
        .bind(approval.decision.workflow_status())
        .bind(approval.decided_at)
        .bind(&approval.comments)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to decide workflow", e))?;

        let Some(workflow) = decided else {
            return Ok(None);
        };

        sqlx::query(
            "INSERT INTO document_approvals (id, workflow_id, document_id, approver_id, \
             approver_role, decision, comments, decided_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(approval.id)
        .bind(approval.workflow_id)
        .bind(approval.document_id)
        .bind(approval.approver_id)
        .bind(&approval.approver_role)
        .bind(approval.decision)
        .bind(&approval.comments)
        .bind(approval.decided_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record approval", e))?;

        sqlx::query("UPDATE documents SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(approval.document_id)
            .bind(approval.decision.document_status())
            .bind(approval.decided_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to update document status", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit decision", e)
        })?;
        Ok(Some(workflow))
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<DocumentWorkflow>> {
        sqlx::query_as::<_, DocumentWorkflow>(
            "SELECT * FROM document_workflows \
             WHERE status IN ('pending', 'in_progress') AND due_date < $1 \
             ORDER BY due_date ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find overdue workflows", e)
        })
    }

    async fn expire_workflow(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DocumentWorkflow>> {
        sqlx::query_as::<_, DocumentWorkflow>(
            "UPDATE document_workflows SET status = 'expired', completed_at = $2, \
             notes = 'Expired without a decision', updated_at = $2 \
             WHERE id = $1 AND status IN ('pending', 'in_progress') RETURNING *",
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to expire workflow", e))
    }

    async fn list_approvals(&self, document_id: Uuid) -> AppResult<Vec<DocumentApproval>> {
        sqlx::query_as::<_, DocumentApproval>(
            "SELECT * FROM document_approvals WHERE document_id = $1 ORDER BY decided_at ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list approvals", e))
    }
}
