use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::issue::{CreateIssueRequest, Issue, IssueSeverity, IssueStatus};
use crate::state::AppState;
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct UpdateIssueStatusRequest {
    pub status: IssueStatus,
}

/// POST /api/v1/issues
///
/// Manual issue entry, next to the ones the processing pipeline raises from
/// classified photos.
pub async fn handle_create_issue(
    State(state): State<AppState>,
    Json(request): Json<CreateIssueRequest>,
) -> Result<Json<Issue>, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Issue title must not be empty".to_string()));
    }
    if state.store.project(request.project_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Project {} not found",
            request.project_id
        )));
    }

    let issue = Issue {
        id: Uuid::new_v4(),
        project_id: request.project_id,
        title: request.title.trim().to_string(),
        description: request.description,
        severity: request.severity.unwrap_or(IssueSeverity::Medium),
        status: IssueStatus::Open,
        document_id: request.document_id,
        phase: request.phase,
        assigned_to: request.assigned_to,
        resolved_at: None,
        created_at: Utc::now(),
    };
    state.store.insert_issue(issue.clone()).await?;
    info!(issue_id = %issue.id, project_id = %issue.project_id, "Issue created");
    Ok(Json(issue))
}

/// GET /api/v1/issues/:id
pub async fn handle_get_issue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Issue>, AppError> {
    let issue = state
        .store
        .issue(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue {id} not found")))?;
    Ok(Json(issue))
}

/// GET /api/v1/projects/:id/issues
pub async fn handle_list_project_issues(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Issue>>, AppError> {
    if state.store.project(project_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Project {project_id} not found")));
    }
    let issues = state.store.issues_for_project(project_id).await?;
    Ok(Json(issues))
}

/// PATCH /api/v1/issues/:id/status
///
/// Status transitions go through [`Issue::transition_status`] so the
/// `resolved_at` timestamp stays consistent with the status.
pub async fn handle_update_issue_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIssueStatusRequest>,
) -> Result<Json<Issue>, AppError> {
    let mut issue = state
        .store
        .issue(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue {id} not found")))?;

    issue.transition_status(request.status, Utc::now());
    state.store.update_issue(issue.clone()).await?;
    info!(issue_id = %issue.id, status = ?issue.status, "Issue status updated");
    Ok(Json(issue))
}
