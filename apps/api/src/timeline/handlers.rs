use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::timeline::{CreateTimelineEventRequest, TimelineEvent};
use crate::state::AppState;
use crate::store::Store;

/// POST /api/v1/projects/:id/timeline
///
/// Records a milestone event. `occurred_at` defaults to now; backdating is
/// allowed since milestones are often logged after the fact.
pub async fn handle_create_timeline_event(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateTimelineEventRequest>,
) -> Result<Json<TimelineEvent>, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Event title must not be empty".to_string()));
    }
    let project = state
        .store
        .project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {project_id} not found")))?;

    let event = TimelineEvent {
        id: Uuid::new_v4(),
        project_id: Some(project.id),
        property_id: project.property_id,
        event_type: request.event_type,
        title: request.title.trim().to_string(),
        description: request.description,
        occurred_at: request.occurred_at.unwrap_or_else(Utc::now),
        verified: request.verified,
    };
    state.store.insert_event(event.clone()).await?;
    info!(
        event_id = %event.id,
        project_id = %project.id,
        event_type = ?event.event_type,
        "Timeline event recorded"
    );
    Ok(Json(event))
}

/// GET /api/v1/projects/:id/timeline
pub async fn handle_list_timeline(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<TimelineEvent>>, AppError> {
    if state.store.project(project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Project {project_id} not found")));
    }
    let events = state.store.events_for_project(project_id).await?;
    Ok(Json(events))
}
