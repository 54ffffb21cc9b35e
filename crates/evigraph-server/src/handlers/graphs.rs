//! Evidence graph handlers (request build, fetch, delete).

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use evigraph_core::EvidenceGraph;

use crate::error::ApiError;
use crate::schema::graphs::BuildRequest;
use crate::state::AppState;
use crate::tasks::BuildTask;

/// Requests an evidence graph build for a root record.
///
/// Idempotent: when the root already links to a persisted graph, no build
/// runs and the response is an already-complete task pointing at it.
/// Otherwise the build is enqueued and the PENDING task returned for
/// polling.
///
/// `POST /graphs`
pub async fn request_build(
    State(state): State<AppState>,
    Json(req): Json<BuildRequest>,
) -> Result<Json<BuildTask>, ApiError> {
    if req.root_id.is_empty() {
        return Err(ApiError::BadRequest("rootId must not be empty".to_string()));
    }
    if req.owner.is_empty() {
        return Err(ApiError::BadRequest("owner must not be empty".to_string()));
    }

    let linked = {
        let service = state.service.lock().await;
        service.find_linked_graph(&req.root_id)?
    };

    let task = match linked {
        Some(graph) => state
            .coordinator
            .record_completed(&req.root_id, &req.owner, &graph.id),
        None => state.coordinator.enqueue(
            state.service.clone(),
            req.root_id,
            req.owner,
        ),
    };
    Ok(Json(task))
}

/// Fetches a persisted evidence graph by id.
///
/// `GET /graphs/{graph_id}`
pub async fn get_graph(
    State(state): State<AppState>,
    Path(graph_id): Path<String>,
) -> Result<Json<EvidenceGraph>, ApiError> {
    let service = state.service.lock().await;
    let graph = service.get_graph(&graph_id)?;
    Ok(Json(graph))
}

/// Deletes an evidence graph. Owner-only; the requester is identified by
/// the `x-requester` header (authentication proper lives upstream).
///
/// `DELETE /graphs/{graph_id}`
pub async fn delete_graph(
    State(state): State<AppState>,
    Path(graph_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let requester = headers
        .get("x-requester")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("x-requester header required".to_string()))?;

    let mut service = state.service.lock().await;
    service.delete_graph(&graph_id, requester)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
