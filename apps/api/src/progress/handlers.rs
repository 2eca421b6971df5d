use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::progress::aggregate::{aggregate, ProgressView};
use crate::state::AppState;
use crate::store::Store;

/// GET /api/v1/projects/:id/progress
pub async fn handle_project_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgressView>, AppError> {
    let project = state
        .store
        .project(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;
    let documents = state.store.documents_for_project(id).await?;
    let events = state.store.events_for_project(id).await?;
    Ok(Json(aggregate(
        project.current_phase,
        &documents,
        &events,
        state.config.expected_docs_per_phase,
    )))
}

/// GET /api/v1/properties/:id/progress
///
/// Properties are not required to have a project record; the view is served
/// as long as anything at all references the property.
pub async fn handle_property_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgressView>, AppError> {
    let project = state.store.project_by_property(id).await?;
    let documents = state.store.documents_for_property(id).await?;
    let events = state.store.events_for_property(id).await?;
    if project.is_none() && documents.is_empty() && events.is_empty() {
        return Err(AppError::NotFound(format!("Property {id} not found")));
    }
    Ok(Json(aggregate(
        project.and_then(|p| p.current_phase),
        &documents,
        &events,
        state.config.expected_docs_per_phase,
    )))
}
