//! In-memory implementation of the store traits.
//!
//! All state sits behind one async lock, so every trait method is a single
//! critical section and the conditional checks match the PostgreSQL
//! repositories.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_entity::approval::DocumentApproval;
use docvault_entity::document::{Document, DocumentStatus, MetadataUpdate};
use docvault_entity::version::DocumentVersion;
use docvault_entity::workflow::{DocumentWorkflow, WorkflowStatus, WorkflowType};

use crate::store::{DocumentStore, VersionCommit, VersionStore, WorkflowStore};

#[derive(Debug, Default)]
struct State {
    documents: HashMap<Uuid, Document>,
    versions: HashMap<Uuid, DocumentVersion>,
    workflows: HashMap<Uuid, DocumentWorkflow>,
    approvals: Vec<DocumentApproval>,
}

/// Process-local store for single-node deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn advance_document(
    document: &mut Document,
    head: &DocumentVersion,
    metadata: Option<&MetadataUpdate>,
    now: DateTime<Utc>,
) {
    if let Some(update) = metadata {
        update.apply(document);
    }
    document.version = head.version_number;
    document.current_version_id = Some(head.id);
    document.content_key = Some(head.content_key.clone());
    document.content_hash = Some(head.content_hash.clone());
    document.size_bytes = head.size_bytes;
    document.mime_type = head.mime_type.clone();
    document.updated_at = now;
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, document: &Document) -> AppResult<Document> {
        let mut state = self.state.write().await;
        if state.documents.contains_key(&document.id) {
            return Err(AppError::validation(format!(
                "Document {} already exists",
                document.id
            )));
        }
        state.documents.insert(document.id, document.clone());
        Ok(document.clone())
    }

    async fn find_document(&self, id: Uuid) -> AppResult<Option<Document>> {
        Ok(self.state.read().await.documents.get(&id).cloned())
    }

    async fn list_document_ids(&self) -> AppResult<Vec<Uuid>> {
        let state = self.state.read().await;
        let mut documents: Vec<&Document> = state.documents.values().collect();
        documents.sort_by_key(|d| (d.created_at, d.id));
        Ok(documents.into_iter().map(|d| d.id).collect())
    }

    async fn update_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
    ) -> AppResult<Document> {
        let mut state = self.state.write().await;
        let document = state
            .documents
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;
        document.status = status;
        document.updated_at = Utc::now();
        Ok(document.clone())
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn find_version(&self, id: Uuid) -> AppResult<Option<DocumentVersion>> {
        Ok(self.state.read().await.versions.get(&id).cloned())
    }

    async fn list_versions(&self, document_id: Uuid) -> AppResult<Vec<DocumentVersion>> {
        let state = self.state.read().await;
        let mut versions: Vec<DocumentVersion> = state
            .versions
            .values()
            .filter(|v| v.document_id == document_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.version_number);
        Ok(versions)
    }

    async fn commit_version(&self, commit: VersionCommit) -> AppResult<(Document, DocumentVersion)> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let now = Utc::now();
        let document_id = commit.version.document_id;

        let document = state
            .documents
            .get_mut(&document_id)
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;
        if document.current_version_id != commit.expected_head {
            return Err(AppError::concurrent_modification(format!(
                "Document {document_id} head moved; retry"
            )));
        }

        let next_number = state
            .versions
            .values()
            .filter(|v| v.document_id == document_id)
            .map(|v| v.version_number)
            .max()
            .unwrap_or(0)
            + 1;

        if let Some(head_id) = commit.expected_head {
            let head = state
                .versions
                .get_mut(&head_id)
                .filter(|v| v.successor_id.is_none())
                .ok_or_else(|| {
                    AppError::concurrent_modification(format!(
                        "Version {head_id} is no longer the head; retry"
                    ))
                })?;
            head.successor_id = Some(commit.version.id);
            head.superseded_at = Some(now);
        }

        let version = commit.version.into_version(next_number, now);
        advance_document(document, &version, commit.metadata.as_ref(), now);
        state.versions.insert(version.id, version.clone());

        Ok((document.clone(), version))
    }

    async fn delete_superseded_version(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.write().await;
        match state.versions.get(&id) {
            None => Ok(false),
            Some(v) if v.is_head() => Err(AppError::invalid_state(format!(
                "Version {id} is the head and cannot be deleted"
            ))),
            Some(_) => Ok(state.versions.remove(&id).is_some()),
        }
    }

    async fn count_content_references(
        &self,
        document_id: Uuid,
        content_key: &str,
    ) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .versions
            .values()
            .filter(|v| v.document_id == document_id && v.content_key == content_key)
            .count() as i64)
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn create_workflow(&self, workflow: &DocumentWorkflow) -> AppResult<DocumentWorkflow> {
        let mut state = self.state.write().await;
        let document = state
            .documents
            .get_mut(&workflow.document_id)
            .ok_or_else(|| {
                AppError::not_found(format!("Document {} not found", workflow.document_id))
            })?;
        if workflow.workflow_type == WorkflowType::Approval {
            document.status = DocumentStatus::PendingApproval;
            document.updated_at = workflow.created_at;
        }
        state.workflows.insert(workflow.id, workflow.clone());
        Ok(workflow.clone())
    }

    async fn find_workflow(&self, id: Uuid) -> AppResult<Option<DocumentWorkflow>> {
        Ok(self.state.read().await.workflows.get(&id).cloned())
    }

    async fn list_workflows(&self, document_id: Uuid) -> AppResult<Vec<DocumentWorkflow>> {
        let state = self.state.read().await;
        let mut workflows: Vec<DocumentWorkflow> = state
            .workflows
            .values()
            .filter(|w| w.document_id == document_id)
            .cloned()
            .collect();
        workflows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(workflows)
    }

    async fn start_workflow(
        &self,
        id: Uuid,
        assignee_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DocumentWorkflow>> {
        let mut state = self.state.write().await;
        match state.workflows.get_mut(&id) {
            Some(w) if w.status == WorkflowStatus::Pending => {
                w.status = WorkflowStatus::InProgress;
                w.assignee_id = Some(assignee_id);
                w.updated_at = now;
                Ok(Some(w.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn record_decision(
        &self,
        approval: &DocumentApproval,
    ) -> AppResult<Option<DocumentWorkflow>> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let Some(workflow) = state
            .workflows
            .get_mut(&approval.workflow_id)
            .filter(|w| w.status.accepts_decision())
        else {
            return Ok(None);
        };
        let document = state
            .documents
            .get_mut(&approval.document_id)
            .ok_or_else(|| {
                AppError::not_found(format!("Document {} not found", approval.document_id))
            })?;

        workflow.status = approval.decision.workflow_status();
        workflow.completed_at = Some(approval.decided_at);
        workflow.notes = approval.comments.clone();
        workflow.updated_at = approval.decided_at;

        document.status = approval.decision.document_status();
        document.updated_at = approval.decided_at;

        let workflow = workflow.clone();
        state.approvals.push(approval.clone());
        Ok(Some(workflow))
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<DocumentWorkflow>> {
        let state = self.state.read().await;
        let mut overdue: Vec<DocumentWorkflow> = state
            .workflows
            .values()
            .filter(|w| w.is_overdue(now))
            .cloned()
            .collect();
        overdue.sort_by_key(|w| w.due_date);
        Ok(overdue)
    }

    async fn expire_workflow(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DocumentWorkflow>> {
        let mut state = self.state.write().await;
        match state.workflows.get_mut(&id) {
            Some(w) if w.status.accepts_decision() => {
                w.status = WorkflowStatus::Expired;
                w.completed_at = Some(now);
                w.notes = Some("Expired without a decision".to_string());
                w.updated_at = now;
                Ok(Some(w.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_approvals(&self, document_id: Uuid) -> AppResult<Vec<DocumentApproval>> {
        let state = self.state.read().await;
        Ok(state
            .approvals
            .iter()
            .filter(|a| a.document_id == document_id)
            .cloned()
            .collect())
    }
}
