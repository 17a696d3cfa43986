//! Retention: prune superseded versions that no keep-rule protects.
//!
//! A superseded version is kept when any rule matches:
//! it is among the `keep_recent` newest superseded versions, it is younger
//! than `keep_days`, its number is a multiple of `milestone_interval`, or it
//! was produced by a rollback. The head is never a candidate.
//!
//! Every content upload and rollback owns its key. Only metadata-only
//! versions share a key, always with the version they superseded, so a key
//! is released once no surviving row of the document references it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use docvault_core::config::RetentionConfig;
use docvault_core::error::AppError;
use docvault_core::events::{DocumentEvent, DomainEvent, EventBus};
use docvault_core::result::AppResult;
use docvault_core::traits::storage::ContentStore;
use docvault_database::store::Stores;
use docvault_entity::version::DocumentVersion;

/// Keep-rules applied by a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Newest superseded versions always kept.
    pub keep_recent: usize,
    /// Versions younger than this many days are kept.
    pub keep_days: i64,
    /// Versions whose number is a multiple of this are kept; 0 disables.
    pub milestone_interval: i32,
}

impl From<&RetentionConfig> for RetentionPolicy {
    fn from(config: &RetentionConfig) -> Self {
        Self {
            keep_recent: config.keep_recent,
            keep_days: config.keep_days,
            milestone_interval: config.milestone_interval,
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from(&RetentionConfig::default())
    }
}

impl RetentionPolicy {
    fn is_milestone(&self, version_number: i32) -> bool {
        self.milestone_interval > 0 && version_number % self.milestone_interval == 0
    }

    /// Split a chain into versions to keep and versions to delete.
    pub fn plan<'a>(
        &self,
        versions: &'a [DocumentVersion],
        now: DateTime<Utc>,
    ) -> Vec<&'a DocumentVersion> {
        let cutoff = Duration::try_days(self.keep_days.max(0))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut superseded: Vec<&DocumentVersion> =
            versions.iter().filter(|v| !v.is_head()).collect();
        superseded.sort_by(|a, b| b.version_number.cmp(&a.version_number));

        superseded
            .into_iter()
            .enumerate()
            .filter(|(rank, v)| {
                let keep = *rank < self.keep_recent
                    || v.created_at >= cutoff
                    || self.is_milestone(v.version_number)
                    || v.is_rollback();
                !keep
            })
            .map(|(_, v)| v)
            .collect()
    }
}

/// A content object that could not be removed.
#[derive(Debug, Clone, Serialize)]
pub struct ContentFailure {
    pub key: String,
    pub error: String,
}

/// A superseded version whose row could not be removed.
#[derive(Debug, Clone, Serialize)]
pub struct VersionFailure {
    pub version_number: i32,
    pub error: String,
}

/// Outcome of cleaning one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub document_id: Uuid,
    pub deleted_count: u64,
    pub kept_count: u64,
    /// Bytes of content objects actually removed.
    pub bytes_freed: u64,
    pub deleted_versions: Vec<i32>,
    pub content_failures: Vec<ContentFailure>,
    /// Rows that stayed because their delete failed.
    pub version_failures: Vec<VersionFailure>,
}

/// A document a sweep could not clean.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFailure {
    pub document_id: Uuid,
    pub error: String,
}

/// Outcome of a sweep over every document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub documents_processed: u64,
    pub deleted_count: u64,
    pub bytes_freed: u64,
    pub reports: Vec<CleanupReport>,
    pub failures: Vec<DocumentFailure>,
    /// Whether the sweep stopped early on cancellation.
    pub cancelled: bool,
}

/// Applies retention policies to version chains.
#[derive(Debug, Clone)]
pub struct RetentionService {
    stores: Stores,
    content: Arc<dyn ContentStore>,
    events: EventBus,
    default_policy: RetentionPolicy,
}

impl RetentionService {
    /// Creates a new retention service.
    pub fn new(
        stores: Stores,
        content: Arc<dyn ContentStore>,
        events: EventBus,
        default_policy: RetentionPolicy,
    ) -> Self {
        Self {
            stores,
            content,
            events,
            default_policy,
        }
    }

    /// The configured policy.
    pub fn default_policy(&self) -> RetentionPolicy {
        self.default_policy
    }

    /// Prune one document's chain.
    ///
    /// Only superseded rows are touched, so this is safe to run while new
    /// versions are being created. Content removal is best-effort.
    pub async fn cleanup(
        &self,
        document_id: Uuid,
        policy: RetentionPolicy,
    ) -> AppResult<CleanupReport> {
        self.cleanup_at(document_id, policy, Utc::now()).await
    }

    /// Prune one document's chain, evaluating `keep_days` against `now`.
    pub async fn cleanup_at(
        &self,
        document_id: Uuid,
        policy: RetentionPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<CleanupReport> {
        self.stores
            .documents
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;

        let versions = self.stores.versions.list_versions(document_id).await?;
        let doomed = policy.plan(&versions, now);

        let mut report = CleanupReport {
            document_id,
            ..Default::default()
        };
        let mut released: BTreeMap<String, i64> = BTreeMap::new();

        for version in doomed {
            match self
                .stores
                .versions
                .delete_superseded_version(version.id)
                .await
            {
                Ok(true) => {
                    report.deleted_count += 1;
                    report.deleted_versions.push(version.version_number);
                    released.insert(version.content_key.clone(), version.size_bytes);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        document_id = %document_id,
                        version = version.version_number,
                        error = %e,
                        "Failed to delete superseded version"
                    );
                    report.version_failures.push(VersionFailure {
                        version_number: version.version_number,
                        error: e.to_string(),
                    });
                }
            }
        }

        for (key, size) in released {
            match self
                .stores
                .versions
                .count_content_references(document_id, &key)
                .await
            {
                Ok(0) => {}
                Ok(_) => continue,
                Err(e) => {
                    report.content_failures.push(ContentFailure {
                        key,
                        error: e.to_string(),
                    });
                    continue;
                }
            }
            match self.content.delete(&key).await {
                Ok(()) => report.bytes_freed += size.max(0) as u64,
                Err(e) => {
                    warn!(
                        document_id = %document_id,
                        key = %key,
                        error = %e,
                        "Failed to remove pruned content"
                    );
                    report.content_failures.push(ContentFailure {
                        key,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.deleted_versions.sort_unstable();
        report.kept_count = versions.len() as u64 - report.deleted_count;

        if report.deleted_count > 0 {
            info!(
                document_id = %document_id,
                deleted = report.deleted_count,
                kept = report.kept_count,
                bytes_freed = report.bytes_freed,
                "Pruned document versions"
            );
            self.events.publish(DomainEvent::document(
                None,
                DocumentEvent::VersionsPruned {
                    document_id,
                    deleted_count: report.deleted_count,
                    bytes_freed: report.bytes_freed,
                },
            ));
        }

        Ok(report)
    }

    /// Clean every document, checking `cancel` between documents.
    ///
    /// A failing document is recorded and the sweep continues.
    pub async fn sweep(
        &self,
        policy: RetentionPolicy,
        cancel: &watch::Receiver<bool>,
    ) -> AppResult<SweepReport> {
        let document_ids = self.stores.documents.list_document_ids().await?;
        let mut sweep = SweepReport::default();

        for document_id in document_ids {
            if *cancel.borrow() {
                sweep.cancelled = true;
                info!(
                    processed = sweep.documents_processed,
                    "Retention sweep cancelled"
                );
                break;
            }

            match self.cleanup(document_id, policy).await {
                Ok(report) => {
                    sweep.deleted_count += report.deleted_count;
                    sweep.bytes_freed += report.bytes_freed;
                    sweep.reports.push(report);
                }
                Err(e) => {
                    warn!(document_id = %document_id, error = %e, "Retention cleanup failed");
                    sweep.failures.push(DocumentFailure {
                        document_id,
                        error: e.to_string(),
                    });
                }
            }
            sweep.documents_processed += 1;
        }

        Ok(sweep)
    }
}
