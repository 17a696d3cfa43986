//! Shared test helpers for integration tests.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream;
use tempfile::TempDir;
use uuid::Uuid;

use docvault_core::config::AppConfig;
use docvault_core::events::EventBus;
use docvault_core::traits::storage::{ByteStream, ContentStore};
use docvault_database::Stores;
use docvault_entity::document::{CreateDocument, Document};
use docvault_service::{ActorContext, Registration, Services, VersionContent};
use docvault_storage::LocalContentStore;

/// Services over the in-memory stores and a filesystem content store.
pub struct TestApp {
    pub services: Services,
    pub content: Arc<LocalContentStore>,
    pub events: EventBus,
    pub config: AppConfig,
    pub ctx: ActorContext,
    pub root: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let content = Arc::new(
            LocalContentStore::new(root.path().to_str().unwrap())
                .await
                .unwrap(),
        );
        let config = AppConfig::default();
        let events = EventBus::new(256);
        let services = Services::new(Stores::memory(), content.clone(), events.clone(), &config);

        Self {
            services,
            content,
            events,
            config,
            ctx: ActorContext::new(Uuid::new_v4(), Some("support_coordinator".to_string())),
            root,
        }
    }

    pub async fn register(&self, content: &str, requires_approval: bool) -> Registration {
        self.services
            .intake
            .register_document(
                &self.ctx,
                CreateDocument {
                    title: "Worker screening check".to_string(),
                    description: Some("NDIS worker screening clearance".to_string()),
                    category: "screening".to_string(),
                    owner_id: self.ctx.actor_id,
                    mime_type: Some("application/pdf".to_string()),
                    requires_approval,
                    assignee_id: None,
                    required_role: None,
                },
                stream_of(content),
            )
            .await
            .unwrap()
    }

    pub async fn document(&self, content: &str) -> Document {
        self.register(content, false).await.document
    }

    pub async fn upload(&self, document_id: Uuid, content: &str) -> docvault_entity::version::DocumentVersion {
        self.services
            .chain
            .create_version(
                &self.ctx,
                document_id,
                VersionContent::Bytes {
                    stream: stream_of(content),
                    mime_type: None,
                },
                None,
            )
            .await
            .unwrap()
    }

    pub async fn stored(&self, key: &str) -> bool {
        self.content.exists(key).await.unwrap()
    }
}

pub fn stream_of(content: &str) -> ByteStream {
    let chunk: Result<Bytes, std::io::Error> = Ok(Bytes::from(content.to_string()));
    Box::pin(stream::iter(vec![chunk]))
}
