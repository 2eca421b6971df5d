//! Team directory records. The directory is read-only from the pipeline's
//! perspective; admin surfaces create and edit members, and the normal
//! removal flow is soft-deactivation so historical mentions keep resolving.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member of an organization's site team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    /// Free-text trade or role, e.g. "Elektricien", "Uitvoerder".
    pub role: String,
    /// Canonical international form (`+` followed by digits) when present.
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Free-text specialties used by the mention resolver's last tier.
    pub specialties: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamMember {
    /// First name in lowercase, the token users type to mention someone.
    pub fn first_name_lower(&self) -> String {
        self.name
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamMemberRequest {
    pub organization_id: Uuid,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTeamMemberRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub specialties: Option<Vec<String>>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Normalizes a phone number to canonical international form.
///
/// Accepts common human input (spaces, dashes, dots, parentheses, `00`
/// country prefix) but refuses to guess a country code: numbers without an
/// international prefix are rejected rather than silently misfiled.
pub fn normalize_phone(raw: &str) -> Result<String, String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let digits = if let Some(rest) = cleaned.strip_prefix('+') {
        rest.to_string()
    } else if let Some(rest) = cleaned.strip_prefix("00") {
        rest.to_string()
    } else {
        return Err(format!(
            "phone number '{raw}' must carry an international prefix (+ or 00)"
        ));
    };

    if digits.len() < 7 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("phone number '{raw}' is not a valid international number"));
    }
    if digits.starts_with('0') {
        return Err(format!("phone number '{raw}' has a zero country code"));
    }

    Ok(format!("+{digits}"))
}
