//! Version chain manager: stores content, creates versions, and advances
//! the head.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::events::{DocumentEvent, DomainEvent, EventBus};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::{ByteStream, ContentStore};
use docvault_database::store::{Stores, VersionCommit};
use docvault_entity::document::{Document, MetadataUpdate};
use docvault_entity::version::{
    ChangeMetadata, ChangeRecord, DocumentVersion, FieldChange, NewVersion,
};
use docvault_storage::{hash_stream, keys};

use super::diff::{Comparison, compare};
use crate::context::ActorContext;

/// What a new version changes.
pub enum VersionContent {
    /// New bytes for the document.
    Bytes {
        /// The uploaded content.
        stream: ByteStream,
        /// MIME type; inherited from the document when absent.
        mime_type: Option<String>,
    },
    /// Descriptive fields only; content is shared with the current head.
    Metadata(MetadataUpdate),
}

/// Content that has been hashed and written under its version-scoped key.
#[derive(Debug, Clone)]
pub struct StoredContent {
    /// ID reserved for the version that will own these bytes.
    pub version_id: Uuid,
    /// Version-scoped content key.
    pub key: String,
    /// SHA-256 of the bytes.
    pub sha256: String,
    /// Size of the bytes.
    pub size_bytes: i64,
}

/// Creates versions and serves reads over a document's chain.
#[derive(Debug, Clone)]
pub struct VersionChain {
    stores: Stores,
    content: Arc<dyn ContentStore>,
    events: EventBus,
    max_content_bytes: u64,
}

impl VersionChain {
    /// Creates a new version chain manager.
    pub fn new(
        stores: Stores,
        content: Arc<dyn ContentStore>,
        events: EventBus,
        max_content_bytes: u64,
    ) -> Self {
        Self {
            stores,
            content,
            events,
            max_content_bytes,
        }
    }

    /// Create a new head version for a document.
    ///
    /// Content is drained, hashed, and written before the head swap; a
    /// failure up to that point leaves the chain untouched. A lost race on
    /// the head swap yields `ConcurrentModification`.
    pub async fn create_version(
        &self,
        ctx: &ActorContext,
        document_id: Uuid,
        content: VersionContent,
        summary: Option<String>,
    ) -> AppResult<DocumentVersion> {
        let document = self.load_document(document_id).await?;
        let (_, version) = match content {
            VersionContent::Bytes { stream, mime_type } => {
                let stored = self
                    .store_content(document_id, stream, mime_type.as_deref())
                    .await?;
                self.commit_content(ctx, &document, stored, mime_type, summary)
                    .await?
            }
            VersionContent::Metadata(update) => {
                self.commit_metadata(ctx, &document, update, summary).await?
            }
        };
        Ok(version)
    }

    /// Hash a stream and write it under a freshly reserved version key.
    pub async fn store_content(
        &self,
        document_id: Uuid,
        stream: ByteStream,
        mime_type: Option<&str>,
    ) -> AppResult<StoredContent> {
        let hashed = hash_stream(stream, self.max_content_bytes).await?;
        self.put_content(document_id, hashed.bytes, hashed.sha256, mime_type)
            .await
    }

    /// Write already-hashed bytes under a new version-scoped key.
    ///
    /// No row references the key until the matching commit, so retention
    /// can never remove it in between.
    pub(crate) async fn put_content(
        &self,
        document_id: Uuid,
        data: Bytes,
        sha256: String,
        mime_type: Option<&str>,
    ) -> AppResult<StoredContent> {
        let version_id = Uuid::new_v4();
        let key = keys::version_key(document_id, version_id);
        let size_bytes = data.len() as i64;

        self.content.put(&key, data, mime_type).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::StorageWriteFailed,
                format!("Failed to store content under {key}"),
                e,
            )
        })?;

        debug!(document_id = %document_id, key = %key, size_bytes, "Stored version content");
        Ok(StoredContent {
            version_id,
            key,
            sha256,
            size_bytes,
        })
    }

    /// Best-effort removal of bytes whose commit failed.
    pub(crate) async fn discard(&self, stored: &StoredContent) {
        if let Err(e) = self.content.delete(&stored.key).await {
            warn!(key = %stored.key, error = %e, "Failed to discard uncommitted content");
        }
    }

    /// Commit already-stored content as the new head.
    pub async fn commit_content(
        &self,
        ctx: &ActorContext,
        document: &Document,
        stored: StoredContent,
        mime_type: Option<String>,
        summary: Option<String>,
    ) -> AppResult<(Document, DocumentVersion)> {
        let mime_type = mime_type.or_else(|| document.mime_type.clone());
        let change = if document.has_versions() {
            ChangeMetadata::FileUpdate {
                storage_key: stored.key.clone(),
                file_size_change: stored.size_bytes - document.size_bytes,
                affected_fields: content_changes(
                    document,
                    &stored.sha256,
                    stored.size_bytes,
                    mime_type.as_deref(),
                ),
            }
        } else {
            ChangeMetadata::Initial {
                storage_key: stored.key.clone(),
                file_size_change: stored.size_bytes,
            }
        };

        let new = NewVersion {
            id: stored.version_id,
            document_id: document.id,
            content_key: stored.key.clone(),
            size_bytes: stored.size_bytes,
            mime_type,
            content_hash: stored.sha256.clone(),
            is_metadata_only: false,
            summary: summary.clone(),
            change: ChangeRecord::new(change, summary, ctx.actor_id),
            created_by: ctx.actor_id,
        };
        match self.commit(document, new, None).await {
            Ok(committed) => Ok(committed),
            Err(e) => {
                self.discard(&stored).await;
                Err(e)
            }
        }
    }

    async fn commit_metadata(
        &self,
        ctx: &ActorContext,
        document: &Document,
        update: MetadataUpdate,
        summary: Option<String>,
    ) -> AppResult<(Document, DocumentVersion)> {
        let head_id = document.current_version_id.ok_or_else(|| {
            AppError::invalid_state(format!("Document {} has no versions", document.id))
        })?;
        let head = self.stores.versions.find_version(head_id).await?.ok_or_else(|| {
            AppError::concurrent_modification(format!("Head of document {} moved", document.id))
        })?;

        let affected_fields = update.diff(document);
        if affected_fields.is_empty() {
            return Err(AppError::validation("Metadata update changes nothing"));
        }

        let new = NewVersion {
            id: Uuid::new_v4(),
            document_id: document.id,
            content_key: head.content_key,
            size_bytes: head.size_bytes,
            mime_type: head.mime_type,
            content_hash: head.content_hash,
            is_metadata_only: true,
            summary: summary.clone(),
            change: ChangeRecord::new(
                ChangeMetadata::MetadataUpdate { affected_fields },
                summary,
                ctx.actor_id,
            ),
            created_by: ctx.actor_id,
        };
        self.commit(document, new, Some(update)).await
    }

    /// Swap the head and announce the new version.
    pub(crate) async fn commit(
        &self,
        document: &Document,
        new: NewVersion,
        metadata: Option<MetadataUpdate>,
    ) -> AppResult<(Document, DocumentVersion)> {
        let (document, version) = self
            .stores
            .versions
            .commit_version(VersionCommit {
                expected_head: document.current_version_id,
                version: new,
                metadata,
            })
            .await?;

        info!(
            document_id = %document.id,
            version = version.version_number,
            change_type = version.change_type().map(|t| t.as_str()).unwrap_or("unknown"),
            actor_id = %version.created_by,
            "Document version created"
        );

        self.events.publish(DomainEvent::document(
            Some(version.created_by),
            DocumentEvent::VersionCreated {
                document_id: document.id,
                version_id: version.id,
                version_number: version.version_number,
                is_metadata_only: version.is_metadata_only,
            },
        ));

        Ok((document, version))
    }

    /// Load a document or fail with `NotFound`.
    pub async fn load_document(&self, document_id: Uuid) -> AppResult<Document> {
        self.stores
            .documents
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))
    }

    /// All retained versions of a document, oldest first.
    pub async fn list_versions(&self, document_id: Uuid) -> AppResult<Vec<DocumentVersion>> {
        self.load_document(document_id).await?;
        self.stores.versions.list_versions(document_id).await
    }

    /// A single version, which must belong to `document_id`.
    pub async fn get_version(
        &self,
        document_id: Uuid,
        version_id: Uuid,
    ) -> AppResult<DocumentVersion> {
        self.stores
            .versions
            .find_version(version_id)
            .await?
            .filter(|v| v.document_id == document_id)
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Version {version_id} not found for document {document_id}"
                ))
            })
    }

    /// Read a version's bytes from the content store.
    pub async fn read_version_content(
        &self,
        document_id: Uuid,
        version_id: Uuid,
    ) -> AppResult<(DocumentVersion, Bytes)> {
        let version = self.get_version(document_id, version_id).await?;
        let data = self.fetch_content(&version).await?;
        Ok((version, data))
    }

    /// Fetch a version's bytes, mapping any store failure to
    /// `ContentUnavailable`.
    pub(crate) async fn fetch_content(&self, version: &DocumentVersion) -> AppResult<Bytes> {
        self.content.get(&version.content_key).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ContentUnavailable,
                format!(
                    "Content for version {} of document {} is unavailable",
                    version.version_number, version.document_id
                ),
                e,
            )
        })
    }

    /// Compare two versions of the same document.
    pub async fn compare_versions(
        &self,
        document_id: Uuid,
        version_a: Uuid,
        version_b: Uuid,
    ) -> AppResult<Comparison> {
        let a = self.get_version(document_id, version_a).await?;
        let b = self.get_version(document_id, version_b).await?;
        compare(&a, &b)
    }

    /// The event bus this manager publishes to.
    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }
}

/// Content-level fields that differ between the document's head and new
/// content.
pub(crate) fn content_changes(
    document: &Document,
    content_hash: &str,
    size_bytes: i64,
    mime_type: Option<&str>,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    if document.content_hash.as_deref() != Some(content_hash) {
        changes.push(FieldChange::new(
            "content_hash",
            json!(document.content_hash),
            json!(content_hash),
        ));
    }
    if document.size_bytes != size_bytes {
        changes.push(FieldChange::new(
            "size_bytes",
            json!(document.size_bytes),
            json!(size_bytes),
        ));
    }
    if document.mime_type.as_deref() != mime_type {
        changes.push(FieldChange::new(
            "mime_type",
            json!(document.mime_type),
            json!(mime_type),
        ));
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{TestHarness, stream_of};
    use docvault_entity::version::ChangeType;

    #[tokio::test]
    async fn test_versions_form_a_gapless_chain_with_one_head() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;

        h.services
            .chain
            .create_version(&h.ctx, doc.id, h.bytes("v2"), None)
            .await
            .unwrap();
        h.services
            .chain
            .create_version(&h.ctx, doc.id, h.bytes("v3"), Some("rescan".into()))
            .await
            .unwrap();

        let versions = h.services.chain.list_versions(doc.id).await.unwrap();
        let numbers: Vec<i32> = versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(versions.iter().filter(|v| v.is_head()).count(), 1);
        assert_eq!(versions[0].successor_id, Some(versions[1].id));
        assert_eq!(versions[1].successor_id, Some(versions[2].id));

        let document = h.services.chain.load_document(doc.id).await.unwrap();
        assert_eq!(document.version, 3);
        assert_eq!(document.current_version_id, Some(versions[2].id));
        assert_eq!(versions[2].summary.as_deref(), Some("rescan"));
    }

    #[tokio::test]
    async fn test_historical_content_stays_readable() {
        let h = TestHarness::new();
        let doc = h.document_with_content("first").await;
        let v1 = doc.current_version_id.unwrap();

        let v2 = h
            .services
            .chain
            .create_version(&h.ctx, doc.id, h.bytes("second!"), None)
            .await
            .unwrap();

        let (_, old) = h.services.chain.read_version_content(doc.id, v1).await.unwrap();
        let (_, new) = h
            .services
            .chain
            .read_version_content(doc.id, v2.id)
            .await
            .unwrap();
        assert_eq!(old, Bytes::from("first"));
        assert_eq!(new, Bytes::from("second!"));
        assert_eq!(v2.content_key, keys::version_key(doc.id, v2.id));

        match v2.change().unwrap().change.clone() {
            ChangeMetadata::FileUpdate {
                file_size_change,
                affected_fields,
                ..
            } => {
                assert_eq!(file_size_change, 2);
                let fields: Vec<&str> = affected_fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(fields, vec!["content_hash", "size_bytes"]);
            }
            other => panic!("unexpected change: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected_without_a_new_version() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;

        let err = h
            .services
            .chain
            .create_version(
                &h.ctx,
                doc.id,
                VersionContent::Bytes {
                    stream: stream_of(""),
                    mime_type: None,
                },
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidContent);
        assert_eq!(h.services.chain.list_versions(doc.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_metadata_only_version_records_field_changes() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;

        let version = h
            .services
            .chain
            .create_version(
                &h.ctx,
                doc.id,
                VersionContent::Metadata(MetadataUpdate {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                }),
                None,
            )
            .await
            .unwrap();

        assert!(version.is_metadata_only);
        assert_eq!(version.version_number, 2);
        assert_eq!(version.content_hash, doc.content_hash.clone().unwrap());
        assert_eq!(version.change_type(), Some(ChangeType::MetadataUpdate));
        let fields = version.change().unwrap().change.affected_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "title");
        assert_eq!(fields[0].old_value, json!(doc.title));
        assert_eq!(fields[0].new_value, json!("Renamed"));

        let document = h.services.chain.load_document(doc.id).await.unwrap();
        assert_eq!(document.title, "Renamed");
        assert_eq!(document.version, 2);
    }

    #[tokio::test]
    async fn test_noop_metadata_update_is_rejected() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;

        let err = h
            .services
            .chain
            .create_version(
                &h.ctx,
                doc.id,
                VersionContent::Metadata(MetadataUpdate {
                    title: Some(doc.title.clone()),
                    ..Default::default()
                }),
                None,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_put_failure_leaves_chain_untouched() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;
        h.fail_writes(true);

        let err = h
            .services
            .chain
            .create_version(&h.ctx, doc.id, h.bytes("v2"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StorageWriteFailed);

        let document = h.services.chain.load_document(doc.id).await.unwrap();
        assert_eq!(document.version, 1);
        assert_eq!(h.services.chain.list_versions(doc.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_version_of_other_document_is_not_found() {
        let h = TestHarness::new();
        let a = h.document_with_content("a").await;
        let b = h.document_with_content("b").await;

        let err = h
            .services
            .chain
            .get_version(a.id, b.current_version_id.unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_writers_keep_one_head() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v0").await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let chain = h.services.chain.clone();
            let ctx = h.ctx.clone();
            handles.push(tokio::spawn(async move {
                chain
                    .create_version(
                        &ctx,
                        doc.id,
                        VersionContent::Bytes {
                            stream: stream_of(&format!("writer-{i}")),
                            mime_type: None,
                        },
                        None,
                    )
                    .await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(e) => assert_eq!(e.kind, ErrorKind::ConcurrentModification),
            }
        }
        assert!(succeeded >= 1);

        let versions = h.services.chain.list_versions(doc.id).await.unwrap();
        let numbers: Vec<i32> = versions.iter().map(|v| v.version_number).collect();
        let expected: Vec<i32> = (1..=versions.len() as i32).collect();
        assert_eq!(numbers, expected);
        assert_eq!(versions.len(), succeeded + 1);
        assert_eq!(versions.iter().filter(|v| v.is_head()).count(), 1);

        let document = h.services.chain.load_document(doc.id).await.unwrap();
        assert_eq!(document.version, versions.len() as i32);
    }
}
