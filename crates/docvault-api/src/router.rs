//! Route definitions for the DocVault HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.

use axum::Router;
use axum::routing::{get, patch, post};

use crate::handlers;
use crate::state::AppState;

/// Build the API router without middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(document_routes())
        .merge(version_routes())
        .merge(workflow_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Registration, lookup, and the document's workflow history
fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/documents", post(handlers::document::register_document))
        .route("/documents/{id}", get(handlers::document::get_document))
        .route(
            "/documents/{id}/workflows",
            get(handlers::document::list_workflows),
        )
        .route(
            "/documents/{id}/approvals",
            get(handlers::document::list_approvals),
        )
}

/// Version chain operations
fn version_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/documents/{id}/versions",
            get(handlers::version::list_versions).post(handlers::version::create_version),
        )
        .route(
            "/documents/{id}/metadata",
            patch(handlers::version::update_metadata),
        )
        .route(
            "/documents/{id}/versions/{version_id}",
            get(handlers::version::get_version),
        )
        .route(
            "/documents/{id}/versions/{version_id}/content",
            get(handlers::version::get_version_content),
        )
        .route("/documents/{id}/rollback", post(handlers::version::rollback))
        .route("/documents/{id}/compare", get(handlers::version::compare))
        .route("/documents/{id}/cleanup", post(handlers::version::cleanup))
        .route("/documents/{id}/analytics", get(handlers::version::analytics))
}

/// Approval workflow transitions
fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/workflows/{id}/start", post(handlers::workflow::start_review))
        .route(
            "/workflows/{id}/decision",
            post(handlers::workflow::record_decision),
        )
}
