//! Quality issues raised against a project, either by the classifier or by
//! hand. The `resolved_at` timestamp is owned by [`Issue::transition_status`]
//! — it is set exactly when the status enters `Resolved` and cleared when it
//! leaves, never touched anywhere else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::phase::ConstructionPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IssueSeverity {
    /// Derives a severity from the classifier's 0–10 quality score.
    /// Fixed thresholds keep reprocessing deterministic; findings without a
    /// score land on medium.
    pub fn from_quality_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s <= 2.5 => IssueSeverity::Critical,
            Some(s) if s <= 4.0 => IssueSeverity::High,
            Some(s) if s <= 6.0 => IssueSeverity::Medium,
            Some(_) => IssueSeverity::Low,
            None => IssueSeverity::Medium,
        }
    }

    /// Dutch label used in notification bodies.
    pub fn label(self) -> &'static str {
        match self {
            IssueSeverity::Low => "laag",
            IssueSeverity::Medium => "gemiddeld",
            IssueSeverity::High => "hoog",
            IssueSeverity::Critical => "kritiek",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Resolved,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub severity: IssueSeverity,
    pub status: IssueStatus,
    /// Source evidence, when raised from a classified document.
    pub document_id: Option<Uuid>,
    pub phase: Option<ConstructionPhase>,
    pub assigned_to: Option<Uuid>,
    /// Non-null iff `status == Resolved`.
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Issue {
    /// Moves the issue to `next`, maintaining the `resolved_at` invariant.
    /// Re-entering `Resolved` refreshes the timestamp.
    pub fn transition_status(&mut self, next: IssueStatus, now: DateTime<Utc>) {
        self.status = next;
        self.resolved_at = match next {
            IssueStatus::Resolved => Some(now),
            _ => None,
        };
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssueRequest {
    pub project_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<IssueSeverity>,
    #[serde(default)]
    pub phase: Option<ConstructionPhase>,
    #[serde(default)]
    pub document_id: Option<Uuid>,
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_issue() -> Issue {
        Issue {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Vochtplek bij raam".to_string(),
            description: None,
            severity: IssueSeverity::Medium,
            status: IssueStatus::Open,
            document_id: None,
            phase: None,
            assigned_to: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolving_sets_timestamp() {
        let mut issue = open_issue();
        let now = Utc::now();
        issue.transition_status(IssueStatus::Resolved, now);
        assert_eq!(issue.status, IssueStatus::Resolved);
        assert_eq!(issue.resolved_at, Some(now));
    }

    #[test]
    fn test_reopening_clears_timestamp() {
        let mut issue = open_issue();
        issue.transition_status(IssueStatus::Resolved, Utc::now());
        issue.transition_status(IssueStatus::InProgress, Utc::now());
        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(issue.resolved_at, None);
    }

    #[test]
    fn test_dismissing_never_sets_timestamp() {
        let mut issue = open_issue();
        issue.transition_status(IssueStatus::Dismissed, Utc::now());
        assert_eq!(issue.resolved_at, None);
    }

    #[test]
    fn test_severity_from_quality_score_thresholds() {
        assert_eq!(IssueSeverity::from_quality_score(Some(1.0)), IssueSeverity::Critical);
        assert_eq!(IssueSeverity::from_quality_score(Some(2.5)), IssueSeverity::Critical);
        assert_eq!(IssueSeverity::from_quality_score(Some(3.5)), IssueSeverity::High);
        assert_eq!(IssueSeverity::from_quality_score(Some(5.0)), IssueSeverity::Medium);
        assert_eq!(IssueSeverity::from_quality_score(Some(8.0)), IssueSeverity::Low);
        assert_eq!(IssueSeverity::from_quality_score(None), IssueSeverity::Medium);
    }
}
