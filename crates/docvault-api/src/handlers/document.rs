//! Document registration and lookup handlers.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use bytes::Bytes;
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_entity::approval::DocumentApproval;
use docvault_entity::document::Document;
use docvault_entity::workflow::DocumentWorkflow;
use docvault_service::Registration;

use super::byte_stream;
use crate::dto::request::RegisterDocumentRequest;
use crate::dto::response::ApiResponse;
use crate::dto::validate;
use crate::error::ApiResult;
use crate::extractors::Actor;
use crate::state::AppState;

/// POST /api/documents (multipart: `metadata` JSON + `file`)
pub async fn register_document(
    State(state): State<AppState>,
    actor: Actor,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<Registration>>)> {
    let mut metadata: Option<RegisterDocumentRequest> = None;
    let mut mime_type: Option<String> = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "metadata" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
                metadata = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| AppError::validation(format!("Invalid metadata: {e}")))?,
                );
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

    let metadata = metadata.ok_or_else(|| AppError::validation("metadata is required"))?;
    validate(&metadata)?;
    let data = data.ok_or_else(|| AppError::validation("file is required"))?;

    let registration = state
        .services
        .intake
        .register_document(
            &actor,
            metadata.into_create(actor.actor_id, mime_type),
            byte_stream(data),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(registration))))
}

/// GET /api/documents/{id}
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Document>>> {
    let document = state.services.intake.get_document(id).await?;
    Ok(Json(ApiResponse::ok(document)))
}

/// GET /api/documents/{id}/workflows
pub async fn list_workflows(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<DocumentWorkflow>>>> {
    let workflows = state.services.workflows.list_workflows(id).await?;
    Ok(Json(ApiResponse::ok(workflows)))
}

/// GET /api/documents/{id}/approvals
pub async fn list_approvals(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<DocumentApproval>>>> {
    let approvals = state.services.workflows.list_approvals(id).await?;
    Ok(Json(ApiResponse::ok(approvals)))
}
