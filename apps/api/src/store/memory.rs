//! In-memory [`Store`] backend.
//!
//! Backs the binary out of the box and every test. All maps live behind a
//! single `RwLock`, so each trait method is atomic and the upsert methods
//! get their first-write-wins guarantee from holding the write guard across
//! the check-then-insert.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::classification::PhotoClassification;
use crate::models::document::Document;
use crate::models::issue::Issue;
use crate::models::mention::Mention;
use crate::models::message::{InboundMessage, MessageStatus};
use crate::models::phase::ConstructionPhase;
use crate::models::project::Project;
use crate::models::team::TeamMember;
use crate::models::timeline::TimelineEvent;

use super::{MentionUpsert, Store, StoreError};

#[derive(Default)]
struct Inner {
    messages: HashMap<Uuid, InboundMessage>,
    members: HashMap<Uuid, TeamMember>,
    documents: HashMap<Uuid, Document>,
    issues: HashMap<Uuid, Issue>,
    mentions: HashMap<Uuid, Mention>,
    events: HashMap<Uuid, TimelineEvent>,
    projects: HashMap<Uuid, Project>,
    /// Canonical phone -> project. A number attributes to one project.
    phone_links: HashMap<String, Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_members(mut members: Vec<TeamMember>) -> Vec<TeamMember> {
    members.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
    members
}

#[async_trait]
impl Store for MemoryStore {
    // ── inbound messages ────────────────────────────────────────────────

    async fn insert_message(&self, message: InboundMessage) -> Result<(), StoreError> {
        self.inner.write().await.messages.insert(message.id, message);
        Ok(())
    }

    async fn message(&self, id: Uuid) -> Result<Option<InboundMessage>, StoreError> {
        Ok(self.inner.read().await.messages.get(&id).cloned())
    }

    async fn message_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<InboundMessage>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .messages
            .values()
            .find(|m| m.external_message_id == external_id)
            .cloned())
    }

    async fn set_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let message = inner
            .messages
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "message", id })?;
        message.status = status;
        Ok(())
    }

    // ── team directory ──────────────────────────────────────────────────

    async fn insert_team_member(&self, member: TeamMember) -> Result<(), StoreError> {
        self.inner.write().await.members.insert(member.id, member);
        Ok(())
    }

    async fn team_member(&self, id: Uuid) -> Result<Option<TeamMember>, StoreError> {
        Ok(self.inner.read().await.members.get(&id).cloned())
    }

    async fn team_members(&self, organization_id: Uuid) -> Result<Vec<TeamMember>, StoreError> {
        let members = self
            .inner
            .read()
            .await
            .members
            .values()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(sorted_members(members))
    }

    async fn active_team_members(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<TeamMember>, StoreError> {
        let members = self
            .inner
            .read()
            .await
            .members
            .values()
            .filter(|m| m.organization_id == organization_id && m.active)
            .cloned()
            .collect();
        Ok(sorted_members(members))
    }

    async fn update_team_member(&self, member: TeamMember) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.members.contains_key(&member.id) {
            return Err(StoreError::NotFound { entity: "team member", id: member.id });
        }
        inner.members.insert(member.id, member);
        Ok(())
    }

    async fn deactivate_team_member(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let member = inner
            .members
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "team member", id })?;
        member.active = false;
        member.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_team_member(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .members
            .remove(&id)
            .ok_or(StoreError::NotFound { entity: "team member", id })?;
        Ok(())
    }

    // ── documents ───────────────────────────────────────────────────────

    async fn insert_document(&self, document: Document) -> Result<(), StoreError> {
        self.inner.write().await.documents.insert(document.id, document);
        Ok(())
    }

    async fn document(&self, id: Uuid) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.read().await.documents.get(&id).cloned())
    }

    async fn document_by_source_message(
        &self,
        message_id: Uuid,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .documents
            .values()
            .find(|d| d.source_message_id == Some(message_id))
            .cloned())
    }

    async fn documents_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        let mut docs: Vec<Document> = self
            .inner
            .read()
            .await
            .documents
            .values()
            .filter(|d| d.project_id == Some(project_id))
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(docs)
    }

    async fn documents_for_property(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<Document>, StoreError> {
        let mut docs: Vec<Document> = self
            .inner
            .read()
            .await
            .documents
            .values()
            .filter(|d| d.property_id == Some(property_id))
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(docs)
    }

    async fn attach_classification(
        &self,
        document_id: Uuid,
        payload: PhotoClassification,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let document = inner
            .documents
            .get_mut(&document_id)
            .ok_or(StoreError::NotFound { entity: "document", id: document_id })?;
        if document.extracted_data.is_some() {
            return Ok(false);
        }
        document.extracted_data = Some(payload);
        Ok(true)
    }

    // ── issues ──────────────────────────────────────────────────────────

    async fn insert_issue(&self, issue: Issue) -> Result<(), StoreError> {
        self.inner.write().await.issues.insert(issue.id, issue);
        Ok(())
    }

    async fn issue(&self, id: Uuid) -> Result<Option<Issue>, StoreError> {
        Ok(self.inner.read().await.issues.get(&id).cloned())
    }

    async fn issue_by_document(&self, document_id: Uuid) -> Result<Option<Issue>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .issues
            .values()
            .find(|i| i.document_id == Some(document_id))
            .cloned())
    }

    async fn issues_for_project(&self, project_id: Uuid) -> Result<Vec<Issue>, StoreError> {
        let mut issues: Vec<Issue> = self
            .inner
            .read()
            .await
            .issues
            .values()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect();
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(issues)
    }

    async fn update_issue(&self, issue: Issue) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.issues.contains_key(&issue.id) {
            return Err(StoreError::NotFound { entity: "issue", id: issue.id });
        }
        inner.issues.insert(issue.id, issue);
        Ok(())
    }

    // ── mentions ────────────────────────────────────────────────────────

    async fn upsert_mention(
        &self,
        issue_id: Uuid,
        team_member_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<MentionUpsert, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .mentions
            .values()
            .find(|m| m.issue_id == issue_id && m.team_member_id == team_member_id)
        {
            return Ok(MentionUpsert { mention: existing.clone(), created: false });
        }
        let mention = Mention {
            id: Uuid::new_v4(),
            issue_id,
            team_member_id,
            notified: false,
            notified_at: None,
            created_at: now,
        };
        inner.mentions.insert(mention.id, mention.clone());
        Ok(MentionUpsert { mention, created: true })
    }

    async fn mentions_for_issue(&self, issue_id: Uuid) -> Result<Vec<Mention>, StoreError> {
        let mut mentions: Vec<Mention> = self
            .inner
            .read()
            .await
            .mentions
            .values()
            .filter(|m| m.issue_id == issue_id)
            .cloned()
            .collect();
        mentions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(mentions)
    }

    async fn mark_mention_notified(
        &self,
        mention_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let mention = inner
            .mentions
            .get_mut(&mention_id)
            .ok_or(StoreError::NotFound { entity: "mention", id: mention_id })?;
        mention.notified = true;
        mention.notified_at = Some(at);
        Ok(())
    }

    async fn delete_mention(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .mentions
            .remove(&id)
            .ok_or(StoreError::NotFound { entity: "mention", id })?;
        Ok(())
    }

    async fn delete_mention_pair(
        &self,
        issue_id: Uuid,
        team_member_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let found = inner
            .mentions
            .values()
            .find(|m| m.issue_id == issue_id && m.team_member_id == team_member_id)
            .map(|m| m.id);
        match found {
            Some(id) => {
                inner.mentions.remove(&id);
                Ok(())
            }
            None => Err(StoreError::NotFound { entity: "mention", id: issue_id }),
        }
    }

    // ── timeline events ─────────────────────────────────────────────────

    async fn insert_event(&self, event: TimelineEvent) -> Result<(), StoreError> {
        self.inner.write().await.events.insert(event.id, event);
        Ok(())
    }

    async fn events_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<TimelineEvent>, StoreError> {
        let mut events: Vec<TimelineEvent> = self
            .inner
            .read()
            .await
            .events
            .values()
            .filter(|e| e.project_id == Some(project_id))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn events_for_property(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<TimelineEvent>, StoreError> {
        let mut events: Vec<TimelineEvent> = self
            .inner
            .read()
            .await
            .events
            .values()
            .filter(|e| e.property_id == Some(property_id))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    // ── projects and sender attribution ─────────────────────────────────

    async fn insert_project(&self, project: Project) -> Result<(), StoreError> {
        self.inner.write().await.projects.insert(project.id, project);
        Ok(())
    }

    async fn project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        Ok(self.inner.read().await.projects.get(&id).cloned())
    }

    async fn project_by_property(
        &self,
        property_id: Uuid,
    ) -> Result<Option<Project>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .projects
            .values()
            .find(|p| p.property_id == Some(property_id))
            .cloned())
    }

    async fn set_project_phase(
        &self,
        id: Uuid,
        phase: Option<ConstructionPhase>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let project = inner
            .projects
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "project", id })?;
        project.current_phase = phase;
        Ok(())
    }

    async fn link_phone(&self, phone: &str, project_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound { entity: "project", id: project_id });
        }
        inner.phone_links.insert(phone.to_string(), project_id);
        Ok(())
    }

    async fn project_for_phone(&self, phone: &str) -> Result<Option<Project>, StoreError> {
        let inner = self.inner.read().await;
        let Some(project_id) = inner.phone_links.get(phone) else {
            return Ok(None);
        };
        Ok(inner.projects.get(project_id).cloned())
    }
}
