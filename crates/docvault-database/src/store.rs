//! Persistence traits used by the services.
//!
//! Every method that changes shared state is a conditional update. A
//! caller that loses a race receives either `ConcurrentModification` or an
//! empty result it can classify, never a silently overwritten row.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use docvault_core::result::AppResult;
use docvault_entity::approval::DocumentApproval;
use docvault_entity::document::{Document, DocumentStatus, MetadataUpdate};
use docvault_entity::version::{DocumentVersion, NewVersion};
use docvault_entity::workflow::DocumentWorkflow;

use crate::memory::MemoryStore;
use crate::repositories::{DocumentRepository, VersionRepository, WorkflowRepository};

/// Document rows.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug + 'static {
    /// Insert a new document.
    async fn create_document(&self, document: &Document) -> AppResult<Document>;

    /// Find a document by ID.
    async fn find_document(&self, id: Uuid) -> AppResult<Option<Document>>;

    /// All document IDs, oldest first.
    async fn list_document_ids(&self) -> AppResult<Vec<Uuid>>;

    /// Set a document's status unconditionally.
    async fn update_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
    ) -> AppResult<Document>;
}

/// A new head plus the document changes committed with it.
#[derive(Debug, Clone)]
pub struct VersionCommit {
    /// Head the caller observed before doing any I/O.
    pub expected_head: Option<Uuid>,
    /// The version to insert.
    pub version: NewVersion,
    /// Descriptive field changes applied in the same transaction.
    pub metadata: Option<MetadataUpdate>,
}

/// Version chain rows.
#[async_trait]
pub trait VersionStore: Send + Sync + Debug + 'static {
    /// Find a version by ID.
    async fn find_version(&self, id: Uuid) -> AppResult<Option<DocumentVersion>>;

    /// All retained versions of a document, ascending by version number.
    async fn list_versions(&self, document_id: Uuid) -> AppResult<Vec<DocumentVersion>>;

    /// Atomically close the current head, insert the new version with the
    /// next version number, and advance the document.
    ///
    /// Fails with `ConcurrentModification` when the document's head is no
    /// longer `expected_head` or the head was closed by another writer, and
    /// with `NotFound` when the document does not exist.
    async fn commit_version(&self, commit: VersionCommit) -> AppResult<(Document, DocumentVersion)>;

    /// Delete a superseded version row.
    ///
    /// Returns `false` when the row no longer exists. Fails with
    /// `InvalidState` when the version is a head.
    async fn delete_superseded_version(&self, id: Uuid) -> AppResult<bool>;

    /// Number of retained versions of a document referencing a content key.
    async fn count_content_references(&self, document_id: Uuid, content_key: &str)
    -> AppResult<i64>;
}

/// Workflow and approval rows.
#[async_trait]
pub trait WorkflowStore: Send + Sync + Debug + 'static {
    /// Insert a workflow. An approval workflow moves its document to
    /// `pending_approval` in the same transaction.
    async fn create_workflow(&self, workflow: &DocumentWorkflow) -> AppResult<DocumentWorkflow>;

    /// Find a workflow by ID.
    async fn find_workflow(&self, id: Uuid) -> AppResult<Option<DocumentWorkflow>>;

    /// All workflows of a document, newest first.
    async fn list_workflows(&self, document_id: Uuid) -> AppResult<Vec<DocumentWorkflow>>;

    /// `pending → in_progress`. Returns `None` when the workflow is not
    /// pending (or does not exist).
    async fn start_workflow(
        &self,
        id: Uuid,
        assignee_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DocumentWorkflow>>;

    /// Apply a decision: close the workflow, insert the approval record and
    /// set the document status, atomically. Returns `None` when the
    /// workflow was no longer open.
    async fn record_decision(
        &self,
        approval: &DocumentApproval,
    ) -> AppResult<Option<DocumentWorkflow>>;

    /// Non-terminal workflows whose due date is before `now`.
    async fn find_overdue(&self, now: DateTime<Utc>) -> AppResult<Vec<DocumentWorkflow>>;

    /// `pending|in_progress → expired`. Returns `None` when the workflow
    /// was no longer open.
    async fn expire_workflow(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DocumentWorkflow>>;

    /// All decisions recorded against a document, oldest first.
    async fn list_approvals(&self, document_id: Uuid) -> AppResult<Vec<DocumentApproval>>;
}

/// The three stores handed to the services.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Document rows.
    pub documents: Arc<dyn DocumentStore>,
    /// Version chain rows.
    pub versions: Arc<dyn VersionStore>,
    /// Workflow and approval rows.
    pub workflows: Arc<dyn WorkflowStore>,
}

impl Stores {
    /// Stores backed by PostgreSQL.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            documents: Arc::new(DocumentRepository::new(pool.clone())),
            versions: Arc::new(VersionRepository::new(pool.clone())),
            workflows: Arc::new(WorkflowRepository::new(pool)),
        }
    }

    /// Stores backed by a single in-memory state.
    pub fn memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    /// Stores sharing the given in-memory state.
    pub fn from_memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            documents: store.clone(),
            versions: store.clone(),
            workflows: store,
        }
    }
}
