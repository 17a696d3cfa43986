//! Version chain repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;
use docvault_entity::document::Document;
use docvault_entity::version::DocumentVersion;

use crate::store::{VersionCommit, VersionStore};

/// Repository for version rows and the head swap.
#[derive(Debug, Clone)]
pub struct VersionRepository {
    pool: PgPool,
}

impl VersionRepository {
    /// Create a new version repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionStore for VersionRepository {
    async fn find_version(&self, id: Uuid) -> AppResult<Option<DocumentVersion>> {
        sqlx::query_as::<_, DocumentVersion>("SELECT * FROM document_versions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find version", e))
    }

    async fn list_versions(&self, document_id: Uuid) -> AppResult<Vec<DocumentVersion>> {
        sqlx::query_as::<_, DocumentVersion>(
            "SELECT * FROM document_versions WHERE document_id = $1 ORDER BY version_number ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list versions", e))
    }

    async fn commit_version(&self, commit: VersionCommit) -> AppResult<(Document, DocumentVersion)> {
        let document_id = commit.version.document_id;
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let current: Option<Option<Uuid>> = sqlx::query_scalar(
            "SELECT current_version_id FROM documents WHERE id = $1 FOR UPDATE",
        )
        .bind(document_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock document", e))?;

        let current =
            current.ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;
        if current != commit.expected_head {
            return Err(AppError::concurrent_modification(format!(
                "Document {document_id} head moved; retry"
            )));
        }

        let max_number: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version_number), 0) FROM document_versions WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to allocate version number", e)
        })?;

        if let Some(head_id) = commit.expected_head {
            let closed = sqlx::query(
                "UPDATE document_versions SET successor_id = $2, superseded_at = $3 \
                 WHERE id = $1 AND successor_id IS NULL",
            )
            .bind(head_id)
            .bind(commit.version.id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to close head", e))?;

            if closed.rows_affected() == 0 {
                return Err(AppError::concurrent_modification(format!(
                    "Version {head_id} is no longer the head; retry"
                )));
            }
        }

        let new = commit.version.into_version(max_number + 1, now);
        let version = sqlx::query_as::<_, DocumentVersion>(
            "INSERT INTO document_versions (id, document_id, version_number, content_key, size_bytes, \
             mime_type, content_hash, is_metadata_only, summary, change_metadata, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(new.id)
        .bind(new.document_id)
        .bind(new.version_number)
        .bind(&new.content_key)
        .bind(new.size_bytes)
        .bind(&new.mime_type)
        .bind(&new.content_hash)
        .bind(new.is_metadata_only)
        .bind(&new.summary)
        .bind(&new.change_metadata)
        .bind(new.created_by)
        .bind(new.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert version", e))?;

        let metadata = commit.metadata.unwrap_or_default();
        let description = metadata
            .description
            .as_ref()
            .map(|d| Some(d.clone()).filter(|d| !d.is_empty()));
        let document = sqlx::query_as::<_, Document>(
            "UPDATE documents SET version = $2, current_version_id = $3, content_key = $4, \
             content_hash = $5, size_bytes = $6, mime_type = $7, \
             title = COALESCE($8, title), category = COALESCE($9, category), \
             description = CASE WHEN $10 THEN $11 ELSE description END, \
             updated_at = $12 \
             WHERE id = $1 RETURNING *",
        )
        .bind(document_id)
        .bind(version.version_number)
        .bind(version.id)
        .bind(&version.content_key)
        .bind(&version.content_hash)
        .bind(version.size_bytes)
        .bind(&version.mime_type)
        .bind(&metadata.title)
        .bind(&metadata.category)
        .bind(description.is_some())
        .bind(description.flatten())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to advance document", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit version", e)
        })?;

        debug!(
            document_id = %document_id,
            version = version.version_number,
            "Committed version"
        );
        Ok((document, version))
    }

    async fn delete_superseded_version(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM document_versions WHERE id = $1 AND successor_id IS NOT NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete version", e))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        match self.find_version(id).await? {
            Some(_) => Err(AppError::invalid_state(format!(
                "Version {id} is the head and cannot be deleted"
            ))),
            None => Ok(false),
        }
    }

    async fn count_content_references(
        &self,
        document_id: Uuid,
        content_key: &str,
    ) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM document_versions WHERE document_id = $1 AND content_key = $2",
        )
        .bind(document_id)
        .bind(content_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count content references", e)
        })
    }
}

