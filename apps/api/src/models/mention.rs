//! The mention join record: one row per (issue, team member) pair.
//!
//! Uniqueness of the pair is the dedupe point of the whole notification
//! path — re-mentioning someone on the same issue is a no-op and must never
//! re-notify.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub team_member_id: Uuid,
    /// Whether outbound delivery succeeded for this mention.
    pub notified: bool,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
