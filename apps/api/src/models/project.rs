//! Project context records. The pipeline reads projects to resolve senders
//! and the declared current-phase marker; full project administration lives
//! in the wider application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::phase::ConstructionPhase;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub property_id: Option<Uuid>,
    /// Explicitly declared current phase. When set, it overrides phase
    /// inference in the progress engine.
    pub current_phase: Option<ConstructionPhase>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub organization_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub property_id: Option<Uuid>,
}

/// Body of the declared-phase update endpoint. `null` clears the marker and
/// hands status determination back to inference.
#[derive(Debug, Clone, Deserialize)]
pub struct SetPhaseRequest {
    pub phase: Option<ConstructionPhase>,
}

/// Body of the phone-link endpoint: couples a verified sender number to the
/// project so inbound messages can be attributed.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkPhoneRequest {
    pub phone: String,
}
