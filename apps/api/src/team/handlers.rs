use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::mentions::resolver::{MatchKind, TEAM_KEYWORDS};
use crate::models::team::{
    normalize_phone, CreateTeamMemberRequest, TeamMember, UpdateTeamMemberRequest,
};
use crate::state::AppState;
use crate::store::Store;

#[derive(Deserialize)]
pub struct OrganizationQuery {
    pub organization_id: Uuid,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub organization_id: Uuid,
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub hard: bool,
}

/// One autocomplete entry for the mention composer.
#[derive(Debug, Serialize)]
pub struct TeamSuggestion {
    /// Token to type after the `@`.
    pub token: String,
    pub label: String,
    pub kind: MatchKind,
    /// Absent for the synthetic whole-team entries.
    pub member_id: Option<Uuid>,
}

fn canonical_phone(raw: &str) -> Result<Option<String>, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    normalize_phone(trimmed).map(Some).map_err(AppError::Validation)
}

/// GET /api/v1/team
pub async fn handle_list_team(
    State(state): State<AppState>,
    Query(params): Query<OrganizationQuery>,
) -> Result<Json<Vec<TeamMember>>, AppError> {
    let members = state.store.team_members(params.organization_id).await?;
    Ok(Json(members))
}

/// POST /api/v1/team
pub async fn handle_create_team_member(
    State(state): State<AppState>,
    Json(request): Json<CreateTeamMemberRequest>,
) -> Result<Json<TeamMember>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Member name must not be empty".to_string()));
    }
    let phone = match request.phone.as_deref() {
        Some(raw) => canonical_phone(raw)?,
        None => None,
    };

    let now = Utc::now();
    let member = TeamMember {
        id: Uuid::new_v4(),
        organization_id: request.organization_id,
        name: request.name.trim().to_string(),
        role: request.role.trim().to_string(),
        phone,
        email: request.email,
        specialties: request.specialties,
        active: request.active,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_team_member(member.clone()).await?;
    info!(member_id = %member.id, name = %member.name, "Team member created");
    Ok(Json(member))
}

/// GET /api/v1/team/:id
pub async fn handle_get_team_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamMember>, AppError> {
    let member = state
        .store
        .team_member(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Team member {id} not found")))?;
    Ok(Json(member))
}

/// PATCH /api/v1/team/:id
///
/// Partial update; omitted fields keep their value. An empty string clears
/// the phone or email, any other phone value is stored in canonical form.
pub async fn handle_update_team_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTeamMemberRequest>,
) -> Result<Json<TeamMember>, AppError> {
    let mut member = state
        .store
        .team_member(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Team member {id} not found")))?;

    if let Some(name) = request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Member name must not be empty".to_string()));
        }
        member.name = name.trim().to_string();
    }
    if let Some(role) = request.role {
        member.role = role.trim().to_string();
    }
    if let Some(phone) = request.phone.as_deref() {
        member.phone = canonical_phone(phone)?;
    }
    if let Some(email) = request.email {
        member.email = if email.trim().is_empty() { None } else { Some(email) };
    }
    if let Some(specialties) = request.specialties {
        member.specialties = specialties;
    }
    if let Some(active) = request.active {
        member.active = active;
    }
    member.updated_at = Utc::now();

    state.store.update_team_member(member.clone()).await?;
    Ok(Json(member))
}

/// DELETE /api/v1/team/:id
///
/// Deactivates by default so historical mentions keep resolving.
/// `?hard=true` removes the record entirely.
pub async fn handle_delete_team_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteQuery>,
) -> Result<StatusCode, AppError> {
    if params.hard {
        state.store.delete_team_member(id).await?;
        info!(member_id = %id, "Team member deleted");
    } else {
        state.store.deactivate_team_member(id).await?;
        info!(member_id = %id, "Team member deactivated");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/team/search
///
/// Autocomplete for the mention composer: matches the query against names,
/// roles and specialties of active members, plus the whole-team keywords.
pub async fn handle_search_team(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<TeamSuggestion>>, AppError> {
    let members = state
        .store
        .active_team_members(params.organization_id)
        .await?;
    Ok(Json(build_suggestions(&params.q, &members)))
}

fn build_suggestions(q: &str, members: &[TeamMember]) -> Vec<TeamSuggestion> {
    let q = q.trim().to_lowercase();
    let mut suggestions = Vec::new();

    // An empty query browses the directory; the team keywords only show up
    // once the user starts typing one.
    if !q.is_empty() {
        for keyword in TEAM_KEYWORDS {
            if keyword.starts_with(&q) {
                suggestions.push(TeamSuggestion {
                    token: keyword.to_string(),
                    label: "Hele team".to_string(),
                    kind: MatchKind::Team,
                    member_id: None,
                });
            }
        }
    }

    for member in members {
        let hit = if q.is_empty() || member.name.to_lowercase().contains(&q) {
            Some(MatchKind::Name)
        } else if member.role.to_lowercase().contains(&q) {
            Some(MatchKind::Role)
        } else if member
            .specialties
            .iter()
            .any(|s| s.to_lowercase().contains(&q))
        {
            Some(MatchKind::Specialty)
        } else {
            None
        };
        if let Some(kind) = hit {
            suggestions.push(TeamSuggestion {
                token: member.first_name_lower(),
                label: format!("{} ({})", member.name, member.role),
                kind,
                member_id: Some(member.id),
            });
        }
    }

    suggestions
}
