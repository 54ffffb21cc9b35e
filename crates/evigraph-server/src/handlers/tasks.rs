//! Build task polling handlers.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::tasks::BuildTask;

/// Returns the current state of a build task.
///
/// `GET /tasks/{task_id}`
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<BuildTask>, ApiError> {
    state
        .coordinator
        .get(task_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("build task {}", task_id)))
}
