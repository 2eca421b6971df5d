//! Tiered `@mention` resolution over the team directory.
//!
//! Tokens resolve through four tiers, first hit wins per token: team-wide
//! keyword, name, role, specialty. A member matched by one token is never
//! matched again by a later token in the same call. Matching is plain
//! case-insensitive containment; no diacritic folding.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::models::team::TeamMember;
use crate::store::{Store, StoreError};

static MENTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_-]+)").expect("mention token regex is valid"));

/// Tokens that address the whole crew. "iedereen" is the Dutch everyone.
pub const TEAM_KEYWORDS: [&str; 3] = ["team", "all", "iedereen"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Team,
    Name,
    Role,
    Specialty,
}

#[derive(Debug, Clone)]
pub struct MentionMatch {
    pub token: String,
    pub member: TeamMember,
    pub kind: MatchKind,
}

/// Extracts `@token` occurrences: lower-cased, de-duplicated, in order of
/// first appearance.
pub fn extract_tokens(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for cap in MENTION_TOKEN.captures_iter(text) {
        let token = cap[1].to_lowercase();
        if seen.insert(token.clone()) {
            tokens.push(token);
        }
    }
    tokens
}

/// Pure matching core. `members` is expected in directory order (sorted by
/// name) — the name tier takes the first hit, so the order decides
/// ambiguous tokens.
pub fn match_tokens(tokens: &[String], members: &[TeamMember]) -> Vec<MentionMatch> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut matches = Vec::new();

    for token in tokens {
        // Tier 1: team-wide keyword addresses every active member.
        if TEAM_KEYWORDS.contains(&token.as_str()) {
            for member in members.iter().filter(|m| m.active) {
                if seen.insert(member.id) {
                    matches.push(MentionMatch {
                        token: token.clone(),
                        member: member.clone(),
                        kind: MatchKind::Team,
                    });
                }
            }
            continue;
        }

        // Tier 2: name — substring of the full name or exact first name.
        // First member only; later tiers are skipped even when the hit was
        // already claimed by an earlier token.
        if let Some(member) = members.iter().find(|m| {
            m.active
                && (m.name.to_lowercase().contains(token.as_str())
                    || m.first_name_lower() == *token)
        }) {
            if seen.insert(member.id) {
                matches.push(MentionMatch {
                    token: token.clone(),
                    member: member.clone(),
                    kind: MatchKind::Name,
                });
            }
            continue;
        }

        // Tier 3: role — all members whose role contains the token.
        let role_hits: Vec<&TeamMember> = members
            .iter()
            .filter(|m| m.active && m.role.to_lowercase().contains(token.as_str()))
            .collect();
        if !role_hits.is_empty() {
            for member in role_hits {
                if seen.insert(member.id) {
                    matches.push(MentionMatch {
                        token: token.clone(),
                        member: member.clone(),
                        kind: MatchKind::Role,
                    });
                }
            }
            continue;
        }

        // Tier 4: specialty — all members with a matching specialty entry.
        for member in members.iter().filter(|m| {
            m.active
                && m.specialties
                    .iter()
                    .any(|s| s.to_lowercase().contains(token.as_str()))
        }) {
            if seen.insert(member.id) {
                matches.push(MentionMatch {
                    token: token.clone(),
                    member: member.clone(),
                    kind: MatchKind::Specialty,
                });
            }
        }
    }

    matches
}

/// Resolves mention tokens in `text` against the organization's active
/// directory. Text without any `@` never touches the store.
pub async fn resolve_mentions(
    store: &dyn Store,
    text: &str,
    organization_id: Uuid,
) -> Result<Vec<MentionMatch>, StoreError> {
    let tokens = extract_tokens(text);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let members = store.active_team_members(organization_id).await?;
    Ok(match_tokens(&tokens, &members))
}
