//! The construction phase axis — the fixed, ordered sequence every piece of
//! evidence (photo classification, milestone event) is bucketed against.
//!
//! Phases are not stored records; they are the classification axis of the
//! progress engine. The order is total and must never be reshuffled — the
//! aggregation engine relies on `index()` for "earlier/later work" reasoning.

use serde::{Deserialize, Serialize};

/// Ordered construction phases, groundwork through handover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionPhase {
    Groundwork,
    Foundation,
    Structure,
    RoofAndFacade,
    Installations,
    Finishing,
    Handover,
}

impl ConstructionPhase {
    /// All phases in build order.
    pub const ALL: [ConstructionPhase; 7] = [
        ConstructionPhase::Groundwork,
        ConstructionPhase::Foundation,
        ConstructionPhase::Structure,
        ConstructionPhase::RoofAndFacade,
        ConstructionPhase::Installations,
        ConstructionPhase::Finishing,
        ConstructionPhase::Handover,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position on the axis, 0-based.
    pub fn index(self) -> usize {
        match self {
            ConstructionPhase::Groundwork => 0,
            ConstructionPhase::Foundation => 1,
            ConstructionPhase::Structure => 2,
            ConstructionPhase::RoofAndFacade => 3,
            ConstructionPhase::Installations => 4,
            ConstructionPhase::Finishing => 5,
            ConstructionPhase::Handover => 6,
        }
    }

    /// The earliest phase — the conservative bucket for unclassifiable evidence.
    pub fn earliest() -> Self {
        ConstructionPhase::Groundwork
    }

    /// The terminal phase — the bucket for unmapped milestone events.
    pub fn terminal() -> Self {
        ConstructionPhase::Handover
    }

    /// Dutch display label, as shown on dashboards and in notifications.
    pub fn label(self) -> &'static str {
        match self {
            ConstructionPhase::Groundwork => "Grondwerk",
            ConstructionPhase::Foundation => "Fundering",
            ConstructionPhase::Structure => "Ruwbouw",
            ConstructionPhase::RoofAndFacade => "Dak en gevel",
            ConstructionPhase::Installations => "Installaties",
            ConstructionPhase::Finishing => "Afwerking",
            ConstructionPhase::Handover => "Oplevering",
        }
    }

    /// Parses a classifier-supplied phase slug. The classification service is
    /// prompted to emit the English snake_case slugs, but in practice returns
    /// Dutch construction terms often enough that both are accepted.
    /// Unknown values yield `None` and the caller falls back to the earliest
    /// bucket.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let slug = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match slug.as_str() {
            "groundwork" | "grondwerk" | "bouwrijp" => Some(ConstructionPhase::Groundwork),
            "foundation" | "fundering" => Some(ConstructionPhase::Foundation),
            "structure" | "ruwbouw" | "casco" | "skelet" => Some(ConstructionPhase::Structure),
            "roof_and_facade" | "roof" | "facade" | "dak" | "gevel" | "dak_en_gevel" => {
                Some(ConstructionPhase::RoofAndFacade)
            }
            "installations" | "installaties" | "installatie" | "leidingwerk" => {
                Some(ConstructionPhase::Installations)
            }
            "finishing" | "afwerking" | "afbouw" => Some(ConstructionPhase::Finishing),
            "handover" | "oplevering" | "delivery" => Some(ConstructionPhase::Handover),
            _ => None,
        }
    }
}
