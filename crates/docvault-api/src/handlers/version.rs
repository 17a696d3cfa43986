//! Version chain handlers: create, read, rollback, compare, cleanup,
//! analytics.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_entity::version::DocumentVersion;
use docvault_service::VersionContent;
use docvault_service::version::{Analytics, CleanupReport, Comparison};

use super::byte_stream;
use crate::dto::request::{CleanupRequest, CompareQuery, RollbackRequest, UpdateMetadataRequest};
use crate::dto::response::ApiResponse;
use crate::dto::validate;
use crate::error::ApiResult;
use crate::extractors::Actor;
use crate::state::AppState;

/// GET /api/documents/{id}/versions
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<DocumentVersion>>>> {
    let versions = state.services.chain.list_versions(id).await?;
    Ok(Json(ApiResponse::ok(versions)))
}

/// POST /api/documents/{id}/versions (multipart: `file` + optional `summary`)
pub async fn create_version(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<DocumentVersion>>)> {
    let mut summary: Option<String> = None;
    let mut mime_type: Option<String> = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "summary" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
                summary = Some(text).filter(|s| !s.trim().is_empty());
            }
            "file" => {
                mime_type = field.content_type().map(String::from);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::invalid_content(format!("Read error: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::validation("file is required"))?;
    let version = state
        .services
        .chain
        .create_version(
            &actor,
            id,
            VersionContent::Bytes {
                stream: byte_stream(data),
                mime_type,
            },
            summary,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(version))))
}

/// PATCH /api/documents/{id}/metadata
pub async fn update_metadata(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMetadataRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DocumentVersion>>)> {
    validate(&req)?;
    let (update, summary) = req.into_parts();
    let version = state
        .services
        .chain
        .create_version(&actor, id, VersionContent::Metadata(update), summary)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(version))))
}

/// GET /api/documents/{id}/versions/{version_id}
pub async fn get_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<DocumentVersion>>> {
    let version = state.services.chain.get_version(id, version_id).await?;
    Ok(Json(ApiResponse::ok(version)))
}

/// GET /api/documents/{id}/versions/{version_id}/content
pub async fn get_version_content(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Response> {
    let (version, data) = state
        .services
        .chain
        .read_version_content(id, version_id)
        .await?;

    let content_type = version
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::ETAG, format!("\"{}\"", version.content_hash)),
        ],
        data,
    )
        .into_response())
}

/// POST /api/documents/{id}/rollback
pub async fn rollback(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<RollbackRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<DocumentVersion>>)> {
    validate(&req)?;
    let version = state
        .services
        .rollback
        .rollback(&actor, id, req.target_version_id, &req.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(version))))
}

/// GET /api/documents/{id}/compare?a=&b=
pub async fn compare(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<CompareQuery>,
) -> ApiResult<Json<ApiResponse<Comparison>>> {
    let comparison = state
        .services
        .chain
        .compare_versions(id, query.a, query.b)
        .await?;
    Ok(Json(ApiResponse::ok(comparison)))
}

/// POST /api/documents/{id}/cleanup
pub async fn cleanup(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<CleanupRequest>>,
) -> ApiResult<Json<ApiResponse<CleanupReport>>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    validate(&req)?;
    let policy = req.policy(state.services.retention.default_policy());
    let report = state.services.retention.cleanup(id, policy).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/documents/{id}/analytics
pub async fn analytics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Analytics>>> {
    let analytics = state.services.analytics.analyze(id).await?;
    Ok(Json(ApiResponse::ok(analytics)))
}
