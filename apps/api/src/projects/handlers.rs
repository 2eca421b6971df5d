use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::project::{CreateProjectRequest, LinkPhoneRequest, Project, SetPhaseRequest};
use crate::models::team::normalize_phone;
use crate::state::AppState;
use crate::store::Store;

/// POST /api/v1/projects
pub async fn handle_create_project(
    State(state): State<AppState>,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Json<Project>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Project name must not be empty".to_string()));
    }

    let project = Project {
        id: Uuid::new_v4(),
        organization_id: request.organization_id,
        name: request.name.trim().to_string(),
        property_id: request.property_id,
        current_phase: None,
        created_at: Utc::now(),
    };
    state.store.insert_project(project.clone()).await?;
    info!(project_id = %project.id, name = %project.name, "Project created");
    Ok(Json(project))
}

/// GET /api/v1/projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let project = state
        .store
        .project(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;
    Ok(Json(project))
}

/// PUT /api/v1/projects/:id/phase
///
/// Sets or clears the declared current-phase marker. While set, the marker
/// overrides phase inference in progress reports; clearing it hands status
/// determination back to the evidence.
pub async fn handle_set_project_phase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetPhaseRequest>,
) -> Result<Json<Project>, AppError> {
    if state.store.project(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Project {id} not found")));
    }

    state.store.set_project_phase(id, request.phase).await?;
    let project = state
        .store
        .project(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;
    info!(project_id = %id, phase = ?request.phase, "Declared phase updated");
    Ok(Json(project))
}

/// POST /api/v1/projects/:id/phone
///
/// Links a verified sender number to the project. Inbound messages from
/// that number will be attributed here; linking an already-linked number
/// moves it.
pub async fn handle_link_phone(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<LinkPhoneRequest>,
) -> Result<Json<Project>, AppError> {
    let project = state
        .store
        .project(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;

    let phone = normalize_phone(&request.phone).map_err(AppError::Validation)?;
    state.store.link_phone(&phone, project.id).await?;
    info!(project_id = %project.id, "Sender number linked");
    Ok(Json(project))
}
