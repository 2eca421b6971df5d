//! Mention notification dispatch.
//!
//! Takes one issue plus the member ids the resolver produced, upserts the
//! mention rows and attempts outbound delivery for the newly created ones.
//! Delivery problems are per-recipient: they land in the report, never
//! abort the batch, and a failed send leaves the mention un-notified so a
//! later sweep can retry it.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::messaging::Messenger;
use crate::models::issue::Issue;
use crate::store::{Store, StoreError};

/// Outcome of one dispatch call. `created` counts new mention rows,
/// `notified` successful sends; an existing (issue, member) pair counts
/// toward neither.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub created: usize,
    pub notified: usize,
    pub errors: Vec<String>,
}

fn notification_body(issue: &Issue, base_url: &str) -> String {
    format!(
        "Je bent genoemd bij een melding op Bouwlog.\n\n{} (ernst: {})\nBekijk: {}/issues/{}",
        issue.title,
        issue.severity.label(),
        base_url,
        issue.id
    )
}

/// Upserts a mention per member and, for newly created ones, attempts
/// delivery when `notify` is set. Storage failures propagate; everything
/// per-recipient is absorbed into the report.
pub async fn dispatch(
    store: &dyn Store,
    messenger: &dyn Messenger,
    issue: &Issue,
    member_ids: &[Uuid],
    base_url: &str,
    notify: bool,
) -> Result<DispatchReport, StoreError> {
    let mut report = DispatchReport::default();

    for &member_id in member_ids {
        let Some(member) = store.team_member(member_id).await? else {
            report
                .errors
                .push(format!("unknown team member {member_id}"));
            continue;
        };

        let upsert = store.upsert_mention(issue.id, member.id, Utc::now()).await?;
        if !upsert.created {
            debug!(
                issue_id = %issue.id,
                member_id = %member.id,
                "Mention already exists, skipping"
            );
            continue;
        }
        report.created += 1;

        if !notify {
            continue;
        }
        let Some(phone) = member.phone.as_deref() else {
            debug!(member_id = %member.id, "Member has no phone, mention left silent");
            continue;
        };

        let body = notification_body(issue, base_url);
        match messenger.send(phone, &body, None).await {
            Ok(sid) => {
                store.mark_mention_notified(upsert.mention.id, Utc::now()).await?;
                report.notified += 1;
                info!(
                    issue_id = %issue.id,
                    member_id = %member.id,
                    provider_sid = %sid,
                    "Mention notification delivered"
                );
            }
            Err(e) => {
                warn!(
                    issue_id = %issue.id,
                    member_id = %member.id,
                    "Mention notification failed: {e}"
                );
                report
                    .errors
                    .push(format!("delivery to {} failed: {e}", member.name));
            }
        }
    }

    Ok(report)
}
