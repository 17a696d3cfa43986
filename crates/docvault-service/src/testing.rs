//! Shared fixtures for service tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use uuid::Uuid;

use docvault_core::config::AppConfig;
use docvault_core::error::AppError;
use docvault_core::events::EventBus;
use docvault_core::result::AppResult;
use docvault_core::traits::storage::{ByteStream, ContentStore};
use docvault_database::MemoryStore;
use docvault_database::store::{Stores, VersionCommit, VersionStore};
use docvault_entity::document::{CreateDocument, Document};
use docvault_entity::version::DocumentVersion;
use docvault_entity::workflow::DocumentWorkflow;
use docvault_storage::MemoryContentStore;

use crate::Services;
use crate::context::ActorContext;
use crate::version::VersionContent;

/// A one-chunk byte stream.
pub fn stream_of(content: &str) -> ByteStream {
    let chunk: Result<Bytes, std::io::Error> = Ok(Bytes::from(content.to_string()));
    Box::pin(stream::iter(vec![chunk]))
}

/// Memory content store whose writes and deletes can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyContentStore {
    inner: MemoryContentStore,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
}

#[async_trait]
impl ContentStore for FlakyContentStore {
    fn provider_type(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::storage("disk full"));
        }
        self.inner.put(key, data, content_type).await
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        self.inner.get(key).await
    }

    async fn get_stream(&self, key: &str) -> AppResult<ByteStream> {
        self.inner.get_stream(key).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::storage("permission denied"));
        }
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }
}

/// Memory version store that can refuse to delete one chosen row.
#[derive(Debug, Default)]
pub struct FlakyVersionStore {
    inner: MemoryStore,
    refuse_delete: Mutex<Option<Uuid>>,
}

#[async_trait]
impl VersionStore for FlakyVersionStore {
    async fn find_version(&self, id: Uuid) -> AppResult<Option<DocumentVersion>> {
        self.inner.find_version(id).await
    }

    async fn list_versions(&self, document_id: Uuid) -> AppResult<Vec<DocumentVersion>> {
        self.inner.list_versions(document_id).await
    }

    async fn commit_version(&self, commit: VersionCommit) -> AppResult<(Document, DocumentVersion)> {
        self.inner.commit_version(commit).await
    }

    async fn delete_superseded_version(&self, id: Uuid) -> AppResult<bool> {
        let refused = *self.refuse_delete.lock().unwrap();
        if refused == Some(id) {
            return Err(AppError::database("connection reset"));
        }
        self.inner.delete_superseded_version(id).await
    }

    async fn count_content_references(&self, document_id: Uuid, content_key: &str) -> AppResult<i64> {
        self.inner.count_content_references(document_id, content_key).await
    }
}

/// In-memory stores, a controllable content store, and every service.
pub struct TestHarness {
    pub services: Services,
    pub stores: Stores,
    pub events: EventBus,
    pub ctx: ActorContext,
    content: Arc<FlakyContentStore>,
    versions: Arc<FlakyVersionStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        let memory = MemoryStore::new();
        let versions = Arc::new(FlakyVersionStore {
            inner: memory.clone(),
            refuse_delete: Mutex::new(None),
        });
        let mut stores = Stores::from_memory(memory);
        stores.versions = versions.clone();
        let content = Arc::new(FlakyContentStore::default());
        let events = EventBus::new(64);
        let services = Services::new(
            stores.clone(),
            content.clone(),
            events.clone(),
            &AppConfig::default(),
        );
        Self {
            services,
            stores,
            events,
            ctx: ActorContext::new(Uuid::new_v4(), Some("coordinator".to_string())),
            content,
            versions,
        }
    }

    pub fn bytes(&self, content: &str) -> VersionContent {
        VersionContent::Bytes {
            stream: stream_of(content),
            mime_type: None,
        }
    }

    fn new_document(&self, requires_approval: bool) -> CreateDocument {
        CreateDocument {
            title: "Service agreement".to_string(),
            description: None,
            category: "service_agreement".to_string(),
            owner_id: self.ctx.actor_id,
            mime_type: Some("text/plain".to_string()),
            requires_approval,
            assignee_id: None,
            required_role: None,
        }
    }

    /// An active document whose version 1 holds `content`.
    pub async fn document_with_content(&self, content: &str) -> Document {
        self.services
            .intake
            .register_document(&self.ctx, self.new_document(false), stream_of(content))
            .await
            .unwrap()
            .document
    }

    /// A document waiting on a fresh approval workflow.
    pub async fn document_requiring_approval(
        &self,
        content: &str,
    ) -> (Document, DocumentWorkflow) {
        let reg = self
            .services
            .intake
            .register_document(&self.ctx, self.new_document(true), stream_of(content))
            .await
            .unwrap();
        (reg.document, reg.workflow.unwrap())
    }

    pub fn fail_writes(&self, fail: bool) {
        self.content.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.content.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make deleting the given version row fail.
    pub fn refuse_version_delete(&self, version_id: Uuid) {
        *self.versions.refuse_delete.lock().unwrap() = Some(version_id);
    }

    pub async fn remove_content(&self, key: &str) {
        self.content.inner.delete(key).await.unwrap();
    }

    pub async fn content_exists(&self, key: &str) -> bool {
        self.content.inner.exists(key).await.unwrap()
    }
}
