//! Persistence interface of the pipeline.
//!
//! Storage is an external collaborator: the pipeline talks to this trait and
//! never to a concrete database. The in-memory backend in [`memory`] backs
//! the binary and the test suite; production deployments provide their own
//! implementation.
//!
//! Concurrency contract: every method is an atomic single-record operation.
//! `upsert_mention` and `attach_classification` are the designated
//! upsert-by-unique-key points the processing pipeline relies on for
//! idempotency — implementations must make them first-write-wins under
//! concurrent calls. No method spans records transactionally.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
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

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result of a mention upsert: the row, and whether this call created it.
#[derive(Debug, Clone)]
pub struct MentionUpsert {
    pub mention: Mention,
    pub created: bool,
}

#[async_trait]
pub trait Store: Send + Sync {
    // ── inbound messages ────────────────────────────────────────────────

    async fn insert_message(&self, message: InboundMessage) -> Result<(), StoreError>;
    async fn message(&self, id: Uuid) -> Result<Option<InboundMessage>, StoreError>;
    async fn message_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<InboundMessage>, StoreError>;
    async fn set_message_status(&self, id: Uuid, status: MessageStatus)
        -> Result<(), StoreError>;

    // ── team directory ──────────────────────────────────────────────────

    async fn insert_team_member(&self, member: TeamMember) -> Result<(), StoreError>;
    async fn team_member(&self, id: Uuid) -> Result<Option<TeamMember>, StoreError>;
    /// All members of the organization, active and inactive, sorted by
    /// (lowercased name, id).
    async fn team_members(&self, organization_id: Uuid) -> Result<Vec<TeamMember>, StoreError>;
    /// Active members only, same stable sort. The resolver's directory
    /// fetch; the sort order is what makes first-match deterministic.
    async fn active_team_members(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<TeamMember>, StoreError>;
    async fn update_team_member(&self, member: TeamMember) -> Result<(), StoreError>;
    /// Soft removal: flips `active` off, keeps the record.
    async fn deactivate_team_member(&self, id: Uuid) -> Result<(), StoreError>;
    /// Hard removal. Explicit, separate operation from the normal flow.
    async fn delete_team_member(&self, id: Uuid) -> Result<(), StoreError>;

    // ── documents ───────────────────────────────────────────────────────

    async fn insert_document(&self, document: Document) -> Result<(), StoreError>;
    async fn document(&self, id: Uuid) -> Result<Option<Document>, StoreError>;
    async fn document_by_source_message(
        &self,
        message_id: Uuid,
    ) -> Result<Option<Document>, StoreError>;
    /// Chronological, oldest first.
    async fn documents_for_project(&self, project_id: Uuid)
        -> Result<Vec<Document>, StoreError>;
    /// Chronological, oldest first.
    async fn documents_for_property(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<Document>, StoreError>;
    /// Attaches a classification payload if none is present yet.
    /// Returns whether this call attached it (first write wins).
    async fn attach_classification(
        &self,
        document_id: Uuid,
        payload: PhotoClassification,
    ) -> Result<bool, StoreError>;

    // ── issues ──────────────────────────────────────────────────────────

    async fn insert_issue(&self, issue: Issue) -> Result<(), StoreError>;
    async fn issue(&self, id: Uuid) -> Result<Option<Issue>, StoreError>;
    async fn issue_by_document(&self, document_id: Uuid) -> Result<Option<Issue>, StoreError>;
    /// Newest first.
    async fn issues_for_project(&self, project_id: Uuid) -> Result<Vec<Issue>, StoreError>;
    async fn update_issue(&self, issue: Issue) -> Result<(), StoreError>;

    // ── mentions ────────────────────────────────────────────────────────

    /// Upsert by the (issue, member) unique pair. An existing row is
    /// returned untouched with `created = false`.
    async fn upsert_mention(
        &self,
        issue_id: Uuid,
        team_member_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<MentionUpsert, StoreError>;
    async fn mentions_for_issue(&self, issue_id: Uuid) -> Result<Vec<Mention>, StoreError>;
    async fn mark_mention_notified(
        &self,
        mention_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    async fn delete_mention(&self, id: Uuid) -> Result<(), StoreError>;
    async fn delete_mention_pair(
        &self,
        issue_id: Uuid,
        team_member_id: Uuid,
    ) -> Result<(), StoreError>;

    // ── timeline events ─────────────────────────────────────────────────

    async fn insert_event(&self, event: TimelineEvent) -> Result<(), StoreError>;
    /// Chronological by `occurred_at`, oldest first.
    async fn events_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<TimelineEvent>, StoreError>;
    /// Chronological by `occurred_at`, oldest first.
    async fn events_for_property(
        &self,
        property_id: Uuid,
    ) -> Result<Vec<TimelineEvent>, StoreError>;

    // ── projects and sender attribution ─────────────────────────────────

    async fn insert_project(&self, project: Project) -> Result<(), StoreError>;
    async fn project(&self, id: Uuid) -> Result<Option<Project>, StoreError>;
    async fn project_by_property(
        &self,
        property_id: Uuid,
    ) -> Result<Option<Project>, StoreError>;
    async fn set_project_phase(
        &self,
        id: Uuid,
        phase: Option<ConstructionPhase>,
    ) -> Result<(), StoreError>;
    /// Couples a verified sender number (canonical form) to a project.
    /// Linking an already-linked number moves it.
    async fn link_phone(&self, phone: &str, project_id: Uuid) -> Result<(), StoreError>;
    /// The verified-number lookup used to attribute inbound messages.
    async fn project_for_phone(&self, phone: &str) -> Result<Option<Project>, StoreError>;
}
