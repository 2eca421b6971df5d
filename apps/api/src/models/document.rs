//! Evidence documents: photos, videos and files attached to a project.
//!
//! Channel-sourced documents carry `source_message_id`, the idempotency key
//! that keeps message reprocessing from duplicating evidence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::classification::PhotoClassification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Photo,
    Video,
    Plan,
    Report,
    Other,
}

impl DocumentType {
    /// Whether documents of this type count as construction evidence for
    /// the progress engine. Plans and reports describe intent, not state.
    pub fn is_evidentiary(self) -> bool {
        matches!(self, DocumentType::Photo | DocumentType::Video)
    }

    /// Maps a provider media content type onto a document type.
    pub fn for_media_type(content_type: &str) -> Self {
        let ct = content_type.trim().to_lowercase();
        if ct.starts_with("image/") {
            DocumentType::Photo
        } else if ct.starts_with("video/") {
            DocumentType::Video
        } else if ct == "application/pdf" {
            DocumentType::Plan
        } else {
            DocumentType::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChannel {
    Messaging,
    Upload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub doc_type: DocumentType,
    pub file_url: String,
    pub project_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    pub source_channel: SourceChannel,
    /// Set for channel-sourced evidence; unique per inbound message.
    pub source_message_id: Option<Uuid>,
    pub verified: bool,
    pub extracted_data: Option<PhotoClassification>,
    pub created_at: DateTime<Utc>,
}
