//! Rollback: restore an earlier version's content as a new head.

use tracing::{info, warn};
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::events::{DocumentEvent, DomainEvent};
use docvault_core::result::AppResult;
use docvault_entity::version::{ChangeMetadata, ChangeRecord, DocumentVersion, NewVersion};
use docvault_storage::hash_bytes;

use super::chain::{VersionChain, content_changes};
use crate::context::ActorContext;

/// Materialises prior versions as new heads.
#[derive(Debug, Clone)]
pub struct RollbackService {
    chain: VersionChain,
}

impl RollbackService {
    /// Creates a new rollback service.
    pub fn new(chain: VersionChain) -> Self {
        Self { chain }
    }

    /// Create a new head whose content equals `target_version_id`'s.
    ///
    /// The target is never modified, and every call allocates a new
    /// version number, including repeated rollbacks to the same target.
    /// The verified bytes are copied under the new version's own key, so
    /// pruning the target later leaves the restored head readable.
    pub async fn rollback(
        &self,
        ctx: &ActorContext,
        document_id: Uuid,
        target_version_id: Uuid,
        reason: &str,
    ) -> AppResult<DocumentVersion> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("Rollback reason is required"));
        }

        let document = self.chain.load_document(document_id).await?;
        let target = self.chain.get_version(document_id, target_version_id).await?;

        let data = self.chain.fetch_content(&target).await?;
        if hash_bytes(&data) != target.content_hash {
            warn!(
                document_id = %document_id,
                version = target.version_number,
                key = %target.content_key,
                "Stored content does not match recorded hash"
            );
            return Err(AppError::content_unavailable(format!(
                "Content for version {} no longer matches its hash",
                target.version_number
            )));
        }

        let stored = self
            .chain
            .put_content(
                document_id,
                data,
                target.content_hash.clone(),
                target.mime_type.as_deref(),
            )
            .await?;

        let change = ChangeMetadata::Rollback {
            rolled_back_to_version: target.version_number,
            rollback_reason: reason.to_string(),
            storage_key: stored.key.clone(),
            file_size_change: target.size_bytes - document.size_bytes,
            affected_fields: content_changes(
                &document,
                &target.content_hash,
                target.size_bytes,
                target.mime_type.as_deref(),
            ),
        };

        let new = NewVersion {
            id: stored.version_id,
            document_id,
            content_key: stored.key.clone(),
            size_bytes: target.size_bytes,
            mime_type: target.mime_type.clone(),
            content_hash: target.content_hash.clone(),
            is_metadata_only: false,
            summary: Some(format!("Rolled back to version {}", target.version_number)),
            change: ChangeRecord::new(change, Some(reason.to_string()), ctx.actor_id),
            created_by: ctx.actor_id,
        };

        let version = match self.chain.commit(&document, new, None).await {
            Ok((_, version)) => version,
            Err(e) => {
                self.chain.discard(&stored).await;
                return Err(e);
            }
        };

        info!(
            document_id = %document_id,
            version = version.version_number,
            rolled_back_to = target.version_number,
            "Document rolled back"
        );

        self.chain.events().publish(DomainEvent::document(
            Some(ctx.actor_id),
            DocumentEvent::RolledBack {
                document_id,
                version_id: version.id,
                version_number: version.version_number,
                rolled_back_to_version: target.version_number,
                reason: reason.to_string(),
            },
        ));

        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use docvault_core::error::ErrorKind;
    use docvault_core::events::EventPayload;
    use docvault_entity::version::ChangeType;
    use docvault_storage::hash_bytes;

    #[tokio::test]
    async fn test_rollback_scenario() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;
        let v1 = doc.current_version_id.unwrap();
        let v2 = h
            .services
            .chain
            .create_version(&h.ctx, doc.id, h.bytes("v2"), None)
            .await
            .unwrap();
        assert_eq!(v2.content_hash, hash_bytes(b"v2"));

        let v3 = h
            .services
            .rollback
            .rollback(&h.ctx, doc.id, v1, "v2 was the wrong participant")
            .await
            .unwrap();

        assert_eq!(v3.version_number, 3);
        assert_eq!(v3.content_hash, hash_bytes(b"v1"));
        assert_eq!(v3.change_type(), Some(ChangeType::Rollback));
        match &v3.change().unwrap().change {
            ChangeMetadata::Rollback {
                rolled_back_to_version,
                rollback_reason,
                ..
            } => {
                assert_eq!(*rolled_back_to_version, 1);
                assert_eq!(rollback_reason, "v2 was the wrong participant");
            }
            other => panic!("unexpected change: {other:?}"),
        }

        let document = h.services.chain.load_document(doc.id).await.unwrap();
        assert_eq!(document.version, 3);
        assert_eq!(document.content_hash.as_deref(), Some(hash_bytes(b"v1").as_str()));

        let versions = h.services.chain.list_versions(doc.id).await.unwrap();
        assert_eq!(versions.len(), 3);
        assert_eq!(versions[0].successor_id, Some(versions[1].id));
        assert_eq!(versions[1].successor_id, Some(versions[2].id));
        assert!(versions[2].successor_id.is_none());
    }

    #[tokio::test]
    async fn test_repeated_rollback_allocates_new_versions() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;
        let v1 = doc.current_version_id.unwrap();
        h.services
            .chain
            .create_version(&h.ctx, doc.id, h.bytes("v2"), None)
            .await
            .unwrap();

        let first = h
            .services
            .rollback
            .rollback(&h.ctx, doc.id, v1, "restore")
            .await
            .unwrap();
        let second = h
            .services
            .rollback
            .rollback(&h.ctx, doc.id, v1, "restore again")
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.version_number > first.version_number);
        assert_eq!(first.content_hash, second.content_hash);
        let target = h.services.chain.get_version(doc.id, v1).await.unwrap();
        assert_eq!(target.version_number, 1);
        assert_eq!(target.content_hash, hash_bytes(b"v1"));
    }

    #[tokio::test]
    async fn test_missing_content_is_unavailable_and_changes_nothing() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;
        let v1 = h
            .services
            .chain
            .get_version(doc.id, doc.current_version_id.unwrap())
            .await
            .unwrap();
        h.services
            .chain
            .create_version(&h.ctx, doc.id, h.bytes("v2"), None)
            .await
            .unwrap();
        h.remove_content(&v1.content_key).await;

        let err = h
            .services
            .rollback
            .rollback(&h.ctx, doc.id, v1.id, "restore")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ContentUnavailable);
        assert_eq!(h.services.chain.load_document(doc.id).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_rollback_validation() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;
        let other = h.document_with_content("other").await;

        let err = h
            .services
            .rollback
            .rollback(&h.ctx, doc.id, doc.current_version_id.unwrap(), "  ")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = h
            .services
            .rollback
            .rollback(&h.ctx, doc.id, other.current_version_id.unwrap(), "wrong doc")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rollback_emits_event() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;
        let mut rx = h.events.subscribe();

        h.services
            .rollback
            .rollback(&h.ctx, doc.id, doc.current_version_id.unwrap(), "restore")
            .await
            .unwrap();

        let mut saw_rollback = false;
        while let Ok(event) = rx.try_recv() {
            if let EventPayload::Document(DocumentEvent::RolledBack {
                rolled_back_to_version,
                ..
            }) = event.payload
            {
                assert_eq!(rolled_back_to_version, 1);
                saw_rollback = true;
            }
        }
        assert!(saw_rollback);
    }

    #[tokio::test]
    async fn test_rollback_writes_its_own_copy() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;
        let target = h
            .services
            .chain
            .get_version(doc.id, doc.current_version_id.unwrap())
            .await
            .unwrap();

        let restored = h
            .services
            .rollback
            .rollback(&h.ctx, doc.id, target.id, "restore")
            .await
            .unwrap();

        assert_ne!(restored.content_key, target.content_key);
        assert!(h.content_exists(&restored.content_key).await);
        match &restored.change().unwrap().change {
            ChangeMetadata::Rollback { storage_key, .. } => {
                assert_eq!(storage_key, &restored.content_key)
            }
            other => panic!("unexpected change: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rollback_put_failure_changes_nothing() {
        let h = TestHarness::new();
        let doc = h.document_with_content("v1").await;
        h.fail_writes(true);

        let err = h
            .services
            .rollback
            .rollback(&h.ctx, doc.id, doc.current_version_id.unwrap(), "restore")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StorageWriteFailed);
        assert_eq!(h.services.chain.list_versions(doc.id).await.unwrap().len(), 1);
    }
}
