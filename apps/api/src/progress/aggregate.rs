//! Pure phase aggregation.
//!
//! Inputs are the evidence documents (with their classification payloads),
//! the milestone events and the optionally declared current phase; output is
//! one view per phase plus a summary. The progress percentage is a heuristic
//! estimate, not a measurement: completed phases count fully, the current
//! phase earns partial credit from its document volume.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::document::Document;
use crate::models::phase::ConstructionPhase;
use crate::models::timeline::TimelineEvent;

/// Heuristic document volume of a fully documented phase. Overridable via
/// `EXPECTED_DOCS_PER_PHASE`; calibrated on documentation habits of field
/// crews, not on anything exact.
pub const EXPECTED_DOCUMENTS_PER_PHASE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseView {
    pub phase: ConstructionPhase,
    pub label: String,
    pub status: PhaseStatus,
    pub document_count: usize,
    pub average_quality: Option<f64>,
    pub quality_issues: Vec<String>,
    pub attention_points: Vec<String>,
    pub materials: Vec<String>,
    pub first_evidence_at: Option<DateTime<Utc>>,
    pub last_evidence_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyMilestone {
    pub key: &'static str,
    pub label: String,
    pub completed: bool,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSummary {
    pub progress_percent: f64,
    pub current_phase: Option<ConstructionPhase>,
    pub completed_phases: usize,
    pub total_phases: usize,
    pub total_documents: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressView {
    pub phases: Vec<PhaseView>,
    pub summary: ProgressSummary,
    pub key_milestones: Vec<KeyMilestone>,
}

/// (key, Dutch label, phase index). "start" flips as soon as its phase has
/// begun; the others require completion.
const KEY_MILESTONES: [(&str, &str, usize); 5] = [
    ("start", "Bouw gestart", 0),
    ("foundation_done", "Fundering gereed", 1),
    ("structure_done", "Ruwbouw gereed", 2),
    ("weather_tight", "Wind- en waterdicht", 3),
    ("handover", "Opgeleverd", 6),
];

#[derive(Default)]
struct Bucket {
    document_count: usize,
    quality_scores: Vec<f64>,
    quality_issues: Vec<String>,
    attention_points: Vec<String>,
    materials: Vec<String>,
    first_evidence_at: Option<DateTime<Utc>>,
    last_evidence_at: Option<DateTime<Utc>>,
    completed_by_event: bool,
    /// Whether this bucket holds evidence the status inference may use:
    /// bucketed documents and phase-mapped events. Unmapped events touch a
    /// bucket's dates but never this flag.
    has_inference_evidence: bool,
}

impl Bucket {
    fn touch(&mut self, at: DateTime<Utc>) {
        self.first_evidence_at = Some(self.first_evidence_at.map_or(at, |t| t.min(at)));
        self.last_evidence_at = Some(self.last_evidence_at.map_or(at, |t| t.max(at)));
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn average(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(round1(scores.iter().sum::<f64>() / scores.len() as f64))
}

fn fill_buckets(documents: &[Document], events: &[TimelineEvent]) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = (0..ConstructionPhase::COUNT)
        .map(|_| Bucket::default())
        .collect();

    for doc in documents.iter().filter(|d| d.doc_type.is_evidentiary()) {
        // No payload or an unrecognized slug buckets conservatively into the
        // earliest phase.
        let phase = doc
            .extracted_data
            .as_ref()
            .and_then(|c| c.construction_phase())
            .unwrap_or_else(ConstructionPhase::earliest);
        let bucket = &mut buckets[phase.index()];
        bucket.document_count += 1;
        bucket.has_inference_evidence = true;
        bucket.touch(doc.created_at);

        if let Some(payload) = &doc.extracted_data {
            if let Some(score) = payload.quality_score() {
                bucket.quality_scores.push(score);
            }
            if let Some(quality) = &payload.quality {
                for issue in &quality.issues {
                    push_unique(&mut bucket.quality_issues, issue);
                }
            }
            for point in &payload.attention_points {
                push_unique(&mut bucket.attention_points, point);
            }
            for name in payload.material_names() {
                push_unique(&mut bucket.materials, name);
            }
        }
    }

    for event in events {
        let phases = event.event_type.phases();
        if phases.is_empty() {
            buckets[ConstructionPhase::terminal().index()].touch(event.occurred_at);
            continue;
        }
        for phase in phases {
            let bucket = &mut buckets[phase.index()];
            bucket.touch(event.occurred_at);
            bucket.has_inference_evidence = true;
            if event.event_type.is_completion() {
                bucket.completed_by_event = true;
            }
        }
    }

    buckets
}

fn phase_statuses(declared: Option<ConstructionPhase>, buckets: &[Bucket]) -> Vec<PhaseStatus> {
    // An explicitly declared phase overrides everything the evidence says.
    if let Some(current) = declared {
        return ConstructionPhase::ALL
            .iter()
            .map(|p| match p.index().cmp(&current.index()) {
                Ordering::Less => PhaseStatus::Completed,
                Ordering::Equal => PhaseStatus::Current,
                Ordering::Greater => PhaseStatus::Upcoming,
            })
            .collect();
    }

    let last_evidence = buckets.iter().rposition(|b| b.has_inference_evidence);
    buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            if bucket.completed_by_event {
                return PhaseStatus::Completed;
            }
            // Evidence of later work implies earlier phases finished, with
            // or without their own evidence.
            match last_evidence {
                Some(last) if i < last => PhaseStatus::Completed,
                Some(last) if i == last => PhaseStatus::Current,
                _ => PhaseStatus::Upcoming,
            }
        })
        .collect()
}

fn progress_percent(statuses: &[PhaseStatus], buckets: &[Bucket], expected: f64) -> f64 {
    let total = statuses.len() as f64;
    let completed = statuses
        .iter()
        .filter(|s| **s == PhaseStatus::Completed)
        .count();
    if completed == statuses.len() {
        return 100.0;
    }

    let mut percent = completed as f64 / total * 100.0;
    if let Some(current) = statuses.iter().position(|s| *s == PhaseStatus::Current) {
        let docs = buckets[current].document_count as f64;
        percent += (docs / expected).min(1.0) * (100.0 / total);
    }
    round1(percent.min(100.0))
}

fn key_milestones(statuses: &[PhaseStatus], buckets: &[Bucket]) -> Vec<KeyMilestone> {
    KEY_MILESTONES
        .iter()
        .map(|&(key, label, index)| {
            let (completed, date) = if key == "start" {
                (
                    statuses[index] != PhaseStatus::Upcoming,
                    buckets[index].first_evidence_at,
                )
            } else {
                (
                    statuses[index] == PhaseStatus::Completed,
                    buckets[index].last_evidence_at,
                )
            };
            KeyMilestone {
                key,
                label: label.to_string(),
                completed,
                date,
            }
        })
        .collect()
}

/// Aggregates evidence into the full progress view. Pure: all inputs are
/// passed in, nothing is fetched.
pub fn aggregate(
    declared_phase: Option<ConstructionPhase>,
    documents: &[Document],
    events: &[TimelineEvent],
    expected_docs_per_phase: f64,
) -> ProgressView {
    let buckets = fill_buckets(documents, events);
    let statuses = phase_statuses(declared_phase, &buckets);

    let phases: Vec<PhaseView> = ConstructionPhase::ALL
        .iter()
        .zip(buckets.iter())
        .zip(statuses.iter())
        .map(|((phase, bucket), status)| PhaseView {
            phase: *phase,
            label: phase.label().to_string(),
            status: *status,
            document_count: bucket.document_count,
            average_quality: average(&bucket.quality_scores),
            quality_issues: bucket.quality_issues.clone(),
            attention_points: bucket.attention_points.clone(),
            materials: bucket.materials.clone(),
            first_evidence_at: bucket.first_evidence_at,
            last_evidence_at: bucket.last_evidence_at,
        })
        .collect();

    let current_phase = statuses
        .iter()
        .position(|s| *s == PhaseStatus::Current)
        .map(|i| ConstructionPhase::ALL[i]);
    let completed_phases = statuses
        .iter()
        .filter(|s| **s == PhaseStatus::Completed)
        .count();
    let summary = ProgressSummary {
        progress_percent: progress_percent(&statuses, &buckets, expected_docs_per_phase),
        current_phase,
        completed_phases,
        total_phases: ConstructionPhase::COUNT,
        total_documents: buckets.iter().map(|b| b.document_count).sum(),
    };

    let key_milestones = key_milestones(&statuses, &buckets);

    ProgressView {
        phases,
        summary,
        key_milestones,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;
    use crate::models::classification::{MaterialSpec, PhotoClassification, QualityAssessment};
    use crate::models::document::{DocumentType, SourceChannel};
    use crate::models::timeline::MilestoneType;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    fn classified(slug: &str) -> PhotoClassification {
        PhotoClassification {
            phase: Some(slug.to_string()),
            ..PhotoClassification::default()
        }
    }

    fn make_doc(extracted: Option<PhotoClassification>, at: DateTime<Utc>) -> Document {
        Document {
            id: Uuid::new_v4(),
            name: "foto.jpg".to_string(),
            doc_type: DocumentType::Photo,
            file_url: "https://media.example/foto.jpg".to_string(),
            project_id: Some(Uuid::new_v4()),
            property_id: None,
            source_channel: SourceChannel::Messaging,
            source_message_id: None,
            verified: false,
            extracted_data: extracted,
            created_at: at,
        }
    }

    fn make_event(event_type: MilestoneType, at: DateTime<Utc>) -> TimelineEvent {
        TimelineEvent {
            id: Uuid::new_v4(),
            project_id: Some(Uuid::new_v4()),
            property_id: None,
            event_type,
            title: "mijlpaal".to_string(),
            description: None,
            occurred_at: at,
            verified: true,
        }
    }

    fn statuses(view: &ProgressView) -> Vec<PhaseStatus> {
        view.phases.iter().map(|p| p.status).collect()
    }

    #[test]
    fn test_later_evidence_retroactively_completes_earlier_phases() {
        let docs = vec![
            make_doc(Some(classified("fundering")), ts(1, 9)),
            make_doc(Some(classified("dak_en_gevel")), ts(10, 9)),
        ];
        let view = aggregate(None, &docs, &[], EXPECTED_DOCUMENTS_PER_PHASE);

        let st = statuses(&view);
        assert_eq!(st[0], PhaseStatus::Completed); // no own evidence, later work exists
        assert_eq!(st[1], PhaseStatus::Completed);
        assert_eq!(st[2], PhaseStatus::Completed);
        assert_eq!(st[3], PhaseStatus::Current);
        assert!(st[4..].iter().all(|s| *s == PhaseStatus::Upcoming));
        assert_eq!(
            view.summary.current_phase,
            Some(ConstructionPhase::RoofAndFacade)
        );
    }

    #[test]
    fn test_declared_marker_overrides_inference() {
        let docs = vec![make_doc(Some(classified("afwerking")), ts(5, 9))];
        let view = aggregate(
            Some(ConstructionPhase::Installations),
            &docs,
            &[],
            EXPECTED_DOCUMENTS_PER_PHASE,
        );

        let st = statuses(&view);
        assert!(st[..4].iter().all(|s| *s == PhaseStatus::Completed));
        assert_eq!(st[4], PhaseStatus::Current);
        assert!(st[5..].iter().all(|s| *s == PhaseStatus::Upcoming));
        assert_eq!(
            view.summary.current_phase,
            Some(ConstructionPhase::Installations)
        );
    }

    #[test]
    fn test_weather_tight_event_closes_structure_and_roof() {
        let events = vec![make_event(MilestoneType::WeatherTight, ts(3, 12))];
        let view = aggregate(None, &[], &events, EXPECTED_DOCUMENTS_PER_PHASE);

        let st = statuses(&view);
        assert_eq!(st[2], PhaseStatus::Completed);
        assert_eq!(st[3], PhaseStatus::Completed);
        assert_eq!(st[0], PhaseStatus::Completed);
        assert_eq!(st[1], PhaseStatus::Completed);
        assert!(st[4..].iter().all(|s| *s == PhaseStatus::Upcoming));
        // Everything closed by events, nothing in flight.
        assert_eq!(view.summary.current_phase, None);
        assert_eq!(view.summary.progress_percent, round1(4.0 / 7.0 * 100.0));
    }

    #[test]
    fn test_progress_is_monotone_in_current_phase_documents_and_capped() {
        let mut docs: Vec<Document> = (0..3)
            .map(|i| make_doc(Some(classified("grondwerk")), ts(1, 9 + i)))
            .collect();
        let before = aggregate(None, &docs, &[], 8.0).summary.progress_percent;

        docs.push(make_doc(Some(classified("grondwerk")), ts(2, 9)));
        let after = aggregate(None, &docs, &[], 8.0).summary.progress_percent;
        assert!(after >= before);

        for _ in 0..40 {
            docs.push(make_doc(Some(classified("grondwerk")), ts(3, 9)));
        }
        let saturated = aggregate(None, &docs, &[], 8.0).summary.progress_percent;
        assert!(saturated >= after);
        assert!(saturated <= 100.0);
        // Fully saturated current phase earns exactly one phase worth.
        assert_eq!(saturated, round1(100.0 / 7.0));
    }

    #[test]
    fn test_every_phase_completed_reports_exactly_100() {
        let events: Vec<TimelineEvent> = [
            MilestoneType::GroundworkComplete,
            MilestoneType::FoundationComplete,
            MilestoneType::StructureComplete,
            MilestoneType::RoofComplete,
            MilestoneType::InstallationsComplete,
            MilestoneType::FinishingComplete,
            MilestoneType::Handover,
        ]
        .into_iter()
        .map(|t| make_event(t, ts(20, 10)))
        .collect();

        let view = aggregate(None, &[], &events, EXPECTED_DOCUMENTS_PER_PHASE);
        assert!(view.phases.iter().all(|p| p.status == PhaseStatus::Completed));
        assert_eq!(view.summary.progress_percent, 100.0);
        let handover = view.key_milestones.iter().find(|m| m.key == "handover").unwrap();
        assert!(handover.completed);
        assert_eq!(handover.date, Some(ts(20, 10)));
    }

    #[test]
    fn test_unclassified_documents_bucket_into_earliest_phase() {
        let docs = vec![
            make_doc(None, ts(1, 9)),
            make_doc(Some(classified("tuinaanleg")), ts(1, 10)),
        ];
        let view = aggregate(None, &docs, &[], EXPECTED_DOCUMENTS_PER_PHASE);

        assert_eq!(view.phases[0].document_count, 2);
        assert_eq!(view.phases[0].status, PhaseStatus::Current);
        assert_eq!(view.summary.current_phase, Some(ConstructionPhase::Groundwork));
    }

    #[test]
    fn test_inspection_events_show_dates_but_never_drive_status() {
        let events = vec![make_event(MilestoneType::Inspection, ts(4, 9))];
        let view = aggregate(None, &[], &events, EXPECTED_DOCUMENTS_PER_PHASE);

        assert!(view.phases.iter().all(|p| p.status == PhaseStatus::Upcoming));
        assert_eq!(view.summary.progress_percent, 0.0);
        let terminal = view.phases.last().unwrap();
        assert_eq!(terminal.last_evidence_at, Some(ts(4, 9)));
        assert_eq!(terminal.document_count, 0);
    }

    #[test]
    fn test_phase_rollup_averages_quality_and_dedupes_lists() {
        let mut a = classified("fundering");
        a.quality = Some(QualityAssessment {
            score: Some(8.0),
            issues: vec!["kitrand ontbreekt".to_string(), "vochtplek".to_string()],
        });
        a.materials = vec![MaterialSpec {
            name: "Ytong".to_string(),
            brand: None,
            detail: None,
        }];
        let mut b = classified("fundering");
        b.quality = Some(QualityAssessment {
            score: Some(6.0),
            issues: vec!["kitrand ontbreekt".to_string()],
        });
        b.attention_points = vec!["controleer ventilatie".to_string()];
        b.materials = vec![
            MaterialSpec {
                name: "Ytong".to_string(),
                brand: Some("Xella".to_string()),
                detail: None,
            },
            MaterialSpec {
                name: "Betonmortel".to_string(),
                brand: None,
                detail: None,
            },
        ];

        let docs = vec![
            make_doc(Some(a), ts(3, 9)),
            make_doc(Some(b), ts(4, 14)),
        ];
        let view = aggregate(None, &docs, &[], EXPECTED_DOCUMENTS_PER_PHASE);

        let foundation = &view.phases[1];
        assert_eq!(foundation.document_count, 2);
        assert_eq!(foundation.average_quality, Some(7.0));
        assert_eq!(foundation.quality_issues, vec!["kitrand ontbreekt", "vochtplek"]);
        assert_eq!(foundation.attention_points, vec!["controleer ventilatie"]);
        assert_eq!(foundation.materials, vec!["Ytong", "Betonmortel"]);
        assert_eq!(foundation.first_evidence_at, Some(ts(3, 9)));
        assert_eq!(foundation.last_evidence_at, Some(ts(4, 14)));
    }

    #[test]
    fn test_key_milestones_track_their_phase() {
        let docs = vec![
            make_doc(Some(classified("grondwerk")), ts(1, 8)),
            make_doc(Some(classified("fundering")), ts(3, 9)),
            make_doc(Some(classified("fundering")), ts(4, 14)),
            make_doc(Some(classified("ruwbouw")), ts(9, 10)),
        ];
        let view = aggregate(None, &docs, &[], EXPECTED_DOCUMENTS_PER_PHASE);
        let by_key = |key: &str| {
            view.key_milestones
                .iter()
                .find(|m| m.key == key)
                .unwrap()
                .clone()
        };

        assert_eq!(view.key_milestones.len(), 5);
        let start = by_key("start");
        assert!(start.completed);
        assert_eq!(start.date, Some(ts(1, 8)));

        let foundation = by_key("foundation_done");
        assert!(foundation.completed);
        assert_eq!(foundation.date, Some(ts(4, 14)));

        // Structure is in flight: date known, not yet done.
        let structure = by_key("structure_done");
        assert!(!structure.completed);
        assert_eq!(structure.date, Some(ts(9, 10)));

        assert!(!by_key("weather_tight").completed);
        assert!(!by_key("handover").completed);
    }

    #[test]
    fn test_non_evidentiary_documents_are_ignored() {
        let mut doc = make_doc(None, ts(1, 9));
        doc.doc_type = DocumentType::Plan;
        let view = aggregate(None, &[doc], &[], EXPECTED_DOCUMENTS_PER_PHASE);

        assert_eq!(view.summary.total_documents, 0);
        assert!(view.phases.iter().all(|p| p.status == PhaseStatus::Upcoming));
        assert_eq!(view.summary.progress_percent, 0.0);
    }
}
