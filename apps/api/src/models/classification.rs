//! The AI classification payload attached to channel-sourced documents.
//!
//! The classification service returns untyped JSON; this module pins it to a
//! versioned value type with explicit optional fields so nothing downstream
//! has to probe a loose map. Parsing is tolerant: unknown fields are ignored
//! and every field is individually optional, so a partially filled payload
//! from an older or newer classifier still round-trips.

use serde::{Deserialize, Serialize};

use crate::models::phase::ConstructionPhase;

/// Schema version this binary writes. Incoming payloads without a version
/// are treated as version 1.
pub const CLASSIFICATION_SCHEMA_VERSION: u32 = 1;

fn default_version() -> u32 {
    CLASSIFICATION_SCHEMA_VERSION
}

/// Classifier verdict on the quality of the documented work.
/// `score` is on a 0–10 scale; `issues` are free-text defect descriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityAssessment {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// A material the classifier recognized in the photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Structured output of the photo classification service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoClassification {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Loose phase slug as emitted by the classifier; see
    /// [`ConstructionPhase::parse_loose`].
    #[serde(default)]
    pub phase: Option<String>,
    /// Human-readable phase label as emitted by the classifier.
    #[serde(default)]
    pub phase_name: Option<String>,
    #[serde(default)]
    pub quality: Option<QualityAssessment>,
    /// Things a supervisor should look at that are not outright defects.
    #[serde(default)]
    pub attention_points: Vec<String>,
    #[serde(default)]
    pub materials: Vec<MaterialSpec>,
}

impl Default for PhotoClassification {
    fn default() -> Self {
        Self {
            version: CLASSIFICATION_SCHEMA_VERSION,
            phase: None,
            phase_name: None,
            quality: None,
            attention_points: Vec::new(),
            materials: Vec::new(),
        }
    }
}

impl PhotoClassification {
    /// Resolves the loose phase slug against the phase axis.
    pub fn construction_phase(&self) -> Option<ConstructionPhase> {
        self.phase.as_deref().and_then(ConstructionPhase::parse_loose)
    }

    pub fn quality_score(&self) -> Option<f64> {
        self.quality.as_ref().and_then(|q| q.score)
    }

    /// Quality issues followed by attention points, in payload order.
    /// The ordering is part of the issue-creation contract: reprocessing the
    /// same payload must produce the same issue title.
    pub fn findings(&self) -> Vec<&str> {
        let issues = self
            .quality
            .iter()
            .flat_map(|q| q.issues.iter())
            .map(String::as_str);
        issues
            .chain(self.attention_points.iter().map(String::as_str))
            .collect()
    }

    pub fn has_findings(&self) -> bool {
        !self.findings().is_empty()
    }

    pub fn material_names(&self) -> Vec<&str> {
        self.materials.iter().map(|m| m.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerant_parse_of_sparse_payload() {
        let parsed: PhotoClassification = serde_json::from_str(r#"{"phase": "ruwbouw"}"#).unwrap();
        assert_eq!(parsed.version, CLASSIFICATION_SCHEMA_VERSION);
        assert_eq!(parsed.construction_phase(), Some(ConstructionPhase::Structure));
        assert!(parsed.quality.is_none());
        assert!(!parsed.has_findings());
    }

    #[test]
    fn test_tolerant_parse_ignores_unknown_fields() {
        let parsed: PhotoClassification = serde_json::from_str(
            r#"{
                "phase": "fundering",
                "phase_name": "Fundering",
                "confidence": 0.93,
                "model": "vision-large",
                "quality": {"score": 7.5, "issues": []}
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.construction_phase(), Some(ConstructionPhase::Foundation));
        assert_eq!(parsed.quality_score(), Some(7.5));
    }

    #[test]
    fn test_findings_order_issues_before_attention_points() {
        let parsed: PhotoClassification = serde_json::from_str(
            r#"{
                "quality": {"score": 4.0, "issues": ["vochtplek bij raam", "kitrand ontbreekt"]},
                "attention_points": ["controleer ventilatie"]
            }"#,
        )
        .unwrap();
        assert_eq!(
            parsed.findings(),
            vec!["vochtplek bij raam", "kitrand ontbreekt", "controleer ventilatie"]
        );
        assert!(parsed.has_findings());
    }

    #[test]
    fn test_unrecognized_phase_resolves_to_none() {
        let parsed: PhotoClassification =
            serde_json::from_str(r#"{"phase": "tuinaanleg"}"#).unwrap();
        assert_eq!(parsed.construction_phase(), None);
    }
}
