//! Milestone timeline events — the immutable historical record of a build.
//!
//! Each event type declares which phase bucket(s) it populates and whether
//! it closes those phases. The mapping is many-to-one: `weather_tight`
//! closes both the structure and the roof-and-facade phases, because a
//! wind- en waterdicht building implies both are done.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::phase::ConstructionPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneType {
    ConstructionStart,
    GroundworkComplete,
    FoundationComplete,
    StructureComplete,
    WeatherTight,
    RoofComplete,
    InstallationsComplete,
    FinishingComplete,
    Handover,
    Inspection,
}

impl MilestoneType {
    /// Phase buckets this event populates. An empty slice means the event
    /// carries no phase information and falls to the terminal bucket.
    pub fn phases(self) -> &'static [ConstructionPhase] {
        match self {
            MilestoneType::ConstructionStart => &[ConstructionPhase::Groundwork],
            MilestoneType::GroundworkComplete => &[ConstructionPhase::Groundwork],
            MilestoneType::FoundationComplete => &[ConstructionPhase::Foundation],
            MilestoneType::StructureComplete => &[ConstructionPhase::Structure],
            MilestoneType::WeatherTight => {
                &[ConstructionPhase::Structure, ConstructionPhase::RoofAndFacade]
            }
            MilestoneType::RoofComplete => &[ConstructionPhase::RoofAndFacade],
            MilestoneType::InstallationsComplete => &[ConstructionPhase::Installations],
            MilestoneType::FinishingComplete => &[ConstructionPhase::Finishing],
            MilestoneType::Handover => &[ConstructionPhase::Handover],
            MilestoneType::Inspection => &[],
        }
    }

    /// Whether this event closes the phases it maps to.
    pub fn is_completion(self) -> bool {
        !matches!(self, MilestoneType::ConstructionStart | MilestoneType::Inspection)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: Uuid,
    pub project_id: Option<Uuid>,
    pub property_id: Option<Uuid>,
    pub event_type: MilestoneType,
    pub title: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub verified: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimelineEventRequest {
    pub event_type: MilestoneType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to now when omitted.
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified: bool,
}
