//! Inbound channel messages as persisted by the ingestion gateway.
//!
//! A message is immutable once created; only `status` moves, and only to
//! record the processing outcome. The full raw provider parameter map is
//! kept for audit and reprocessing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

/// Processing outcome of an inbound message.
///
/// `Received` means persisted but not (successfully) processed yet — the
/// state a reprocessing sweep looks for alongside `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Received,
    Processed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: Uuid,
    /// Provider-assigned message id; ingestion dedupes on this.
    pub external_message_id: String,
    /// Normalized sender address (leading `+`, channel prefix stripped).
    pub from_address: String,
    pub to_address: String,
    pub direction: MessageDirection,
    pub body: String,
    /// First attachment when the provider sent several.
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub status: MessageStatus,
    /// Full form parameter map as received, for audit.
    pub raw_params: BTreeMap<String, String>,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn has_media(&self) -> bool {
        self.media_url.is_some()
    }
}
