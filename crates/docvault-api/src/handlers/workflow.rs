//! Approval workflow handlers.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use docvault_entity::approval::{ApprovalDecision, DocumentApproval};
use docvault_entity::workflow::DocumentWorkflow;

use crate::dto::request::{DecisionRequest, StartReviewRequest};
use crate::dto::response::ApiResponse;
use crate::dto::validate;
use crate::error::ApiResult;
use crate::extractors::Actor;
use crate::state::AppState;

/// A decided workflow and the decision that closed it.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub workflow: DocumentWorkflow,
    pub approval: DocumentApproval,
}

/// POST /api/workflows/{id}/start
pub async fn start_review(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    body: Option<Json<StartReviewRequest>>,
) -> ApiResult<Json<ApiResponse<DocumentWorkflow>>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let workflow = state
        .services
        .workflows
        .start_review(&actor, id, req.assignee_id)
        .await?;
    Ok(Json(ApiResponse::ok(workflow)))
}

/// POST /api/workflows/{id}/decision
pub async fn record_decision(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> ApiResult<Json<ApiResponse<DecisionResponse>>> {
    validate(&req)?;
    let decision: ApprovalDecision = req.decision.parse()?;
    let (workflow, approval) = state
        .services
        .workflows
        .record_decision(&actor, id, decision, req.comments)
        .await?;
    Ok(Json(ApiResponse::ok(DecisionResponse { workflow, approval })))
}
