use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::mentions::resolver::{resolve_mentions, MatchKind};
use crate::models::issue::Issue;
use crate::notifications::{dispatch, DispatchReport};
use crate::state::AppState;
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct CreateMentionsRequest {
    /// Members to mention directly, by id.
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
    /// Free text to scan for `@` tokens against the team directory.
    #[serde(default)]
    pub text: Option<String>,
    /// Send notifications for newly created mentions. Defaults to true.
    #[serde(default = "default_notify")]
    pub notify: bool,
}

fn default_notify() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ResolvedMention {
    pub token: String,
    pub member_id: Uuid,
    pub member_name: String,
    pub kind: MatchKind,
}

#[derive(Debug, Serialize)]
pub struct CreateMentionsResponse {
    pub report: DispatchReport,
    pub resolved: Vec<ResolvedMention>,
}

/// Mention row joined with the directory record it points at. The member
/// block is absent when the member was hard-deleted.
#[derive(Debug, Serialize)]
pub struct MentionView {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub team_member_id: Uuid,
    pub member_name: Option<String>,
    pub member_role: Option<String>,
    pub notified: bool,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

async fn require_issue(state: &AppState, id: Uuid) -> Result<Issue, AppError> {
    state
        .store
        .issue(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue {id} not found")))
}

/// GET /api/v1/issues/:id/mentions
pub async fn handle_list_mentions(
    State(state): State<AppState>,
    Path(issue_id): Path<Uuid>,
) -> Result<Json<Vec<MentionView>>, AppError> {
    let issue = require_issue(&state, issue_id).await?;

    let mentions = state.store.mentions_for_issue(issue.id).await?;
    let mut views = Vec::with_capacity(mentions.len());
    for mention in mentions {
        let member = state.store.team_member(mention.team_member_id).await?;
        views.push(MentionView {
            id: mention.id,
            issue_id: mention.issue_id,
            team_member_id: mention.team_member_id,
            member_name: member.as_ref().map(|m| m.name.clone()),
            member_role: member.map(|m| m.role),
            notified: mention.notified,
            notified_at: mention.notified_at,
            created_at: mention.created_at,
        });
    }
    Ok(Json(views))
}

/// POST /api/v1/issues/:id/mentions
///
/// Mentions members on an issue, either by explicit id or by resolving
/// `@` tokens in free text, and notifies the newly mentioned ones.
/// Re-mentioning is a no-op: existing pairs are skipped without re-sending.
pub async fn handle_create_mentions(
    State(state): State<AppState>,
    Path(issue_id): Path<Uuid>,
    Json(request): Json<CreateMentionsRequest>,
) -> Result<Json<CreateMentionsResponse>, AppError> {
    let issue = require_issue(&state, issue_id).await?;

    let mut resolved = Vec::new();
    let mut member_ids = request.member_ids.clone();
    let mut seen: HashSet<Uuid> = member_ids.iter().copied().collect();

    if let Some(text) = request.text.as_deref() {
        // Token resolution runs against the directory of the organization
        // that owns the issue's project.
        let project = state
            .store
            .project(issue.project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", issue.project_id)))?;

        for hit in resolve_mentions(state.store.as_ref(), text, project.organization_id).await? {
            if seen.insert(hit.member.id) {
                member_ids.push(hit.member.id);
            }
            resolved.push(ResolvedMention {
                token: hit.token,
                member_id: hit.member.id,
                member_name: hit.member.name,
                kind: hit.kind,
            });
        }
    }

    if member_ids.is_empty() && request.text.is_none() {
        return Err(AppError::Validation(
            "Provide member_ids or text to mention someone".to_string(),
        ));
    }

    let report = dispatch(
        state.store.as_ref(),
        state.messenger.as_ref(),
        &issue,
        &member_ids,
        &state.config.public_base_url,
        request.notify,
    )
    .await?;

    Ok(Json(CreateMentionsResponse { report, resolved }))
}

/// DELETE /api/v1/mentions/:id
pub async fn handle_delete_mention(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.store.delete_mention(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/issues/:id/mentions/:member_id
///
/// Removes a mention by its natural (issue, member) key.
pub async fn handle_delete_mention_pair(
    State(state): State<AppState>,
    Path((issue_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state.store.delete_mention_pair(issue_id, member_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
