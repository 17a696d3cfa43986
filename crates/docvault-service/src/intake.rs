//! Document registration: the first version plus the optional approval gate.

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::events::{DocumentEvent, DomainEvent};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::ByteStream;
use docvault_database::store::Stores;
use docvault_entity::document::{CreateDocument, Document, DocumentStatus};
use docvault_entity::version::DocumentVersion;
use docvault_entity::workflow::DocumentWorkflow;

use crate::context::ActorContext;
use crate::version::VersionChain;
use crate::workflow::WorkflowService;

/// Result of registering a document.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    /// The document after its first version (and gate) was applied.
    pub document: Document,
    /// Version 1.
    pub version: DocumentVersion,
    /// The approval workflow, when the document requires approval.
    pub workflow: Option<DocumentWorkflow>,
}

/// Registers new documents.
#[derive(Debug, Clone)]
pub struct IntakeService {
    stores: Stores,
    chain: VersionChain,
    workflows: WorkflowService,
}

impl IntakeService {
    /// Creates a new intake service.
    pub fn new(stores: Stores, chain: VersionChain, workflows: WorkflowService) -> Self {
        Self {
            stores,
            chain,
            workflows,
        }
    }

    /// Register a document with its initial content.
    ///
    /// The bytes are hashed and stored before any row is written, so an
    /// empty or unwritable upload leaves no draft behind.
    pub async fn register_document(
        &self,
        ctx: &ActorContext,
        input: CreateDocument,
        content: ByteStream,
    ) -> AppResult<Registration> {
        let title = input.title.trim();
        let category = input.category.trim();
        if title.is_empty() {
            return Err(AppError::validation("Document title must not be empty"));
        }
        if category.is_empty() {
            return Err(AppError::validation("Document category must not be empty"));
        }

        let document_id = Uuid::new_v4();
        let stored = self
            .chain
            .store_content(document_id, content, input.mime_type.as_deref())
            .await?;

        let now = Utc::now();
        let draft = Document {
            id: document_id,
            title: title.to_string(),
            description: input.description.clone().filter(|d| !d.trim().is_empty()),
            category: category.to_string(),
            owner_id: input.owner_id,
            status: DocumentStatus::Draft,
            version: 0,
            current_version_id: None,
            content_key: None,
            content_hash: None,
            size_bytes: 0,
            mime_type: input.mime_type.clone(),
            created_at: now,
            updated_at: now,
        };
        let draft = self.stores.documents.create_document(&draft).await?;

        let (document, version) = self
            .chain
            .commit_content(
                ctx,
                &draft,
                stored,
                input.mime_type.clone(),
                Some("Initial upload".to_string()),
            )
            .await?;

        let (document, workflow) = if input.requires_approval {
            let workflow = self
                .workflows
                .open_approval(
                    ctx,
                    &document,
                    version.version_number,
                    input.assignee_id,
                    input.required_role.clone(),
                )
                .await?;
            (self.get_document(document.id).await?, Some(workflow))
        } else {
            let document = self
                .stores
                .documents
                .update_document_status(document.id, DocumentStatus::Active)
                .await?;
            (document, None)
        };

        info!(
            document_id = %document.id,
            owner_id = %document.owner_id,
            status = %document.status,
            requires_approval = input.requires_approval,
            "Document registered"
        );
        self.chain.events().publish(DomainEvent::document(
            Some(ctx.actor_id),
            DocumentEvent::Registered {
                document_id: document.id,
                title: document.title.clone(),
                requires_approval: input.requires_approval,
            },
        ));

        Ok(Registration {
            document,
            version,
            workflow,
        })
    }

    /// A document by ID.
    pub async fn get_document(&self, document_id: Uuid) -> AppResult<Document> {
        self.chain.load_document(document_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestHarness, stream_of};
    use docvault_core::error::ErrorKind;
    use docvault_entity::version::ChangeType;
    use docvault_entity::workflow::{WorkflowData, WorkflowStatus};

    fn request(requires_approval: bool) -> CreateDocument {
        CreateDocument {
            title: "First aid certificate".to_string(),
            description: Some("Worker certification".to_string()),
            category: "certification".to_string(),
            owner_id: Uuid::new_v4(),
            mime_type: Some("application/pdf".to_string()),
            requires_approval,
            assignee_id: None,
            required_role: Some("coordinator".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_without_approval_activates() {
        let h = TestHarness::new();
        let reg = h
            .services
            .intake
            .register_document(&h.ctx, request(false), stream_of("pdf bytes"))
            .await
            .unwrap();

        assert_eq!(reg.document.status, DocumentStatus::Active);
        assert_eq!(reg.document.version, 1);
        assert_eq!(reg.document.current_version_id, Some(reg.version.id));
        assert_eq!(reg.version.version_number, 1);
        assert_eq!(reg.version.change_type(), Some(ChangeType::Initial));
        assert_eq!(reg.version.mime_type.as_deref(), Some("application/pdf"));
        assert!(reg.workflow.is_none());
        assert!(h.content_exists(&reg.version.content_key).await);
    }

    #[tokio::test]
    async fn test_register_with_approval_opens_pending_workflow() {
        let h = TestHarness::new();
        let reg = h
            .services
            .intake
            .register_document(&h.ctx, request(true), stream_of("pdf bytes"))
            .await
            .unwrap();

        assert_eq!(reg.document.status, DocumentStatus::PendingApproval);
        let workflow = reg.workflow.unwrap();
        assert_eq!(workflow.status, WorkflowStatus::Pending);
        assert!(workflow.due_date.is_some());
        match &workflow.workflow_data.0 {
            WorkflowData::Approval {
                requested_by,
                version_number,
                required_role,
                ..
            } => {
                assert_eq!(*requested_by, h.ctx.actor_id);
                assert_eq!(*version_number, 1);
                assert_eq!(required_role.as_deref(), Some("coordinator"));
            }
            other => panic!("unexpected workflow data: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_upload_creates_nothing() {
        let h = TestHarness::new();
        let err = h
            .services
            .intake
            .register_document(&h.ctx, request(false), stream_of(""))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidContent);
        assert!(h.stores.documents.list_document_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let h = TestHarness::new();
        let mut input = request(false);
        input.title = "   ".to_string();
        let err = h
            .services
            .intake
            .register_document(&h.ctx, input, stream_of("bytes"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_unknown_document_is_not_found() {
        let h = TestHarness::new();
        let err = h
            .services
            .intake
            .get_document(Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
