//! Read-only statistics over a document's retained version chain.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::warn;
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_database::store::Stores;
use docvault_entity::version::DocumentVersion;

use super::retention::DocumentFailure;

/// How content size moved across the chain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SizeEvolution {
    pub initial: i64,
    pub current: i64,
    pub min: i64,
    pub max: i64,
    /// Mean size change between consecutive versions.
    pub average_delta: f64,
}

/// Statistics for one document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analytics {
    pub document_id: Uuid,
    pub total_versions: u64,
    pub first_version_at: Option<DateTime<Utc>>,
    pub last_version_at: Option<DateTime<Utc>>,
    pub contributors: Vec<Uuid>,
    pub versions_per_day: f64,
    pub size: SizeEvolution,
    /// Count per change type; versions without metadata count as `unknown`.
    pub change_types: BTreeMap<String, u64>,
}

/// Statistics for many documents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchAnalytics {
    pub results: Vec<Analytics>,
    pub failures: Vec<DocumentFailure>,
    pub cancelled: bool,
}

/// Compute statistics over versions sorted by version number.
pub fn analyze(document_id: Uuid, versions: &[DocumentVersion]) -> Analytics {
    let (Some(first), Some(last)) = (versions.first(), versions.last()) else {
        return Analytics {
            document_id,
            ..Default::default()
        };
    };

    let total = versions.len() as u64;
    let contributors: BTreeSet<Uuid> = versions.iter().map(|v| v.created_by).collect();

    let mut change_types = BTreeMap::new();
    for version in versions {
        let key = version
            .change_type()
            .map(|t| t.as_str())
            .unwrap_or("unknown");
        *change_types.entry(key.to_string()).or_insert(0) += 1;
    }

    let versions_per_day = if total > 1 {
        let span_days = (last.created_at - first.created_at).num_days().max(1);
        total as f64 / span_days as f64
    } else {
        0.0
    };

    let average_delta = if total > 1 {
        (last.size_bytes - first.size_bytes) as f64 / (total - 1) as f64
    } else {
        0.0
    };

    Analytics {
        document_id,
        total_versions: total,
        first_version_at: Some(first.created_at),
        last_version_at: Some(last.created_at),
        contributors: contributors.into_iter().collect(),
        versions_per_day,
        size: SizeEvolution {
            initial: first.size_bytes,
            current: last.size_bytes,
            min: versions.iter().map(|v| v.size_bytes).min().unwrap_or(0),
            max: versions.iter().map(|v| v.size_bytes).max().unwrap_or(0),
            average_delta,
        },
        change_types,
    }
}

/// Serves chain statistics.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    stores: Stores,
}

impl AnalyticsService {
    /// Creates a new analytics service.
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Statistics for one document.
    pub async fn analyze(&self, document_id: Uuid) -> AppResult<Analytics> {
        self.stores
            .documents
            .find_document(document_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document {document_id} not found")))?;
        let versions = self.stores.versions.list_versions(document_id).await?;
        Ok(analyze(document_id, &versions))
    }

    /// Statistics for many documents, checking `cancel` between documents.
    pub async fn analyze_many(
        &self,
        document_ids: &[Uuid],
        cancel: &watch::Receiver<bool>,
    ) -> BatchAnalytics {
        let mut batch = BatchAnalytics::default();
        for &document_id in document_ids {
            if *cancel.borrow() {
                batch.cancelled = true;
                break;
            }
            match self.analyze(document_id).await {
                Ok(analytics) => batch.results.push(analytics),
                Err(e) => {
                    warn!(document_id = %document_id, error = %e, "Analytics failed");
                    batch.failures.push(DocumentFailure {
                        document_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        batch
    }
}
