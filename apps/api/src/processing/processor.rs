//! Per-message processing pipeline.
//!
//! ingest → attribute → document → classify → issue → mentions, strictly in
//! that order for one message, with no ordering across messages. Every step
//! looks up its own idempotency key first, so a crashed or repeated run
//! converges on the same records instead of duplicating them.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::classifier::Classifier;
use crate::errors::AppError;
use crate::mentions::resolver;
use crate::models::classification::PhotoClassification;
use crate::models::document::{Document, DocumentType, SourceChannel};
use crate::models::issue::{Issue, IssueSeverity, IssueStatus};
use crate::models::message::{InboundMessage, MessageStatus};
use crate::models::project::Project;
use crate::notifications;
use crate::processing::queue::Job;
use crate::state::AppState;
use crate::store::Store;

const MAX_TITLE_CHARS: usize = 80;

/// Starts `count` workers draining the queue. The receiver sits behind a
/// mutex held only across `recv`, never across processing, so workers take
/// jobs in turns but run them concurrently.
pub fn spawn_workers(count: usize, rx: mpsc::Receiver<Job>, state: AppState) {
    let rx = Arc::new(Mutex::new(rx));
    for worker_id in 0..count {
        let rx = Arc::clone(&rx);
        let state = state.clone();
        tokio::spawn(async move {
            loop {
                let job = { rx.lock().await.recv().await };
                let Some(job) = job else {
                    debug!(worker_id, "Job queue closed, worker exiting");
                    break;
                };
                match job {
                    Job::ProcessMessage(message_id) => {
                        if let Err(e) = process_message(&state, message_id).await {
                            error!(worker_id, %message_id, "Message processing failed: {e}");
                            if let Err(mark_err) = state
                                .store
                                .set_message_status(message_id, MessageStatus::Failed)
                                .await
                            {
                                error!(%message_id, "Could not mark message failed: {mark_err}");
                            }
                        }
                    }
                }
            }
        });
    }
}

/// Runs one message through the pipeline.
///
/// A message that cannot be attributed to a project is marked `failed` and
/// absorbed — one sender's problem never fails another message. Classifier
/// outages degrade to a document without payload; the message still counts
/// as processed and the reprocess endpoint can fill the payload in later.
pub async fn process_message(state: &AppState, message_id: Uuid) -> Result<(), AppError> {
    let Some(message) = state.store.message(message_id).await? else {
        warn!(%message_id, "Processing job for unknown message, skipping");
        return Ok(());
    };
    if message.status == MessageStatus::Processed {
        debug!(%message_id, "Message already processed, skipping");
        return Ok(());
    }

    let Some(project) = state.store.project_for_phone(&message.from_address).await? else {
        warn!(
            %message_id,
            from = %message.from_address,
            "Sender is not linked to any project, marking failed"
        );
        state
            .store
            .set_message_status(message_id, MessageStatus::Failed)
            .await?;
        return Ok(());
    };

    if message.has_media() {
        let document = ensure_document(state, &message, &project).await?;
        let document = ensure_classification(state, &message, document).await?;
        if let Some(payload) = document.extracted_data.clone() {
            if payload.has_findings() {
                let issue = ensure_issue(state, &message, &document, &payload, &project).await?;
                dispatch_mentions(state, &issue, project.organization_id).await?;
            }
        }
    }

    state
        .store
        .set_message_status(message_id, MessageStatus::Processed)
        .await?;
    info!(%message_id, project_id = %project.id, "Message processed");
    Ok(())
}

/// Finds or creates the document for a message with media. Keyed on
/// `source_message_id`.
async fn ensure_document(
    state: &AppState,
    message: &InboundMessage,
    project: &Project,
) -> Result<Document, AppError> {
    if let Some(existing) = state.store.document_by_source_message(message.id).await? {
        debug!(document_id = %existing.id, "Document already exists for message");
        return Ok(existing);
    }

    let doc_type = message
        .media_type
        .as_deref()
        .map(DocumentType::for_media_type)
        .unwrap_or(DocumentType::Photo);
    let document = Document {
        id: Uuid::new_v4(),
        name: format!(
            "Veldopname {}",
            message.received_at.format("%Y-%m-%d %H:%M")
        ),
        doc_type,
        file_url: message.media_url.clone().unwrap_or_default(),
        project_id: Some(project.id),
        property_id: project.property_id,
        source_channel: SourceChannel::Messaging,
        source_message_id: Some(message.id),
        verified: false,
        extracted_data: None,
        // Evidence is dated by when the field worker sent it, not by when
        // this worker got around to it.
        created_at: message.received_at,
    };
    state.store.insert_document(document.clone()).await?;
    info!(
        document_id = %document.id,
        project_id = %project.id,
        "Document created from inbound media"
    );
    Ok(document)
}

/// Attaches a classification payload when the document has none yet.
/// Classifier failure is absorbed; storage failure propagates.
async fn ensure_classification(
    state: &AppState,
    message: &InboundMessage,
    mut document: Document,
) -> Result<Document, AppError> {
    if document.extracted_data.is_some() {
        return Ok(document);
    }

    let media_type = message.media_type.as_deref().unwrap_or("image/jpeg");
    let body = message.body.trim();
    let note = (!body.is_empty()).then_some(body);

    match state
        .classifier
        .classify(&document.file_url, media_type, note)
        .await
    {
        Ok(payload) => {
            let attached = state
                .store
                .attach_classification(document.id, payload.clone())
                .await?;
            if attached {
                document.extracted_data = Some(payload);
            } else if let Some(current) = state.store.document(document.id).await? {
                // Lost the attach race; take whatever won.
                document = current;
            }
        }
        Err(e) => {
            warn!(
                document_id = %document.id,
                message_id = %message.id,
                "Classification failed, document kept without payload: {e}"
            );
        }
    }
    Ok(document)
}

/// Finds or creates the single issue aggregating a document's findings.
/// Keyed on `document_id`; the title is deterministic in the payload.
async fn ensure_issue(
    state: &AppState,
    message: &InboundMessage,
    document: &Document,
    payload: &PhotoClassification,
    project: &Project,
) -> Result<Issue, AppError> {
    if let Some(existing) = state.store.issue_by_document(document.id).await? {
        debug!(issue_id = %existing.id, "Issue already exists for document");
        return Ok(existing);
    }

    let findings = payload.findings();
    let title = truncate_title(
        findings.first().copied().unwrap_or("Aandachtspunt"),
        MAX_TITLE_CHARS,
    );
    let issue = Issue {
        id: Uuid::new_v4(),
        project_id: project.id,
        title,
        description: issue_description(&message.body, &findings),
        severity: IssueSeverity::from_quality_score(payload.quality_score()),
        status: IssueStatus::Open,
        document_id: Some(document.id),
        phase: payload.construction_phase(),
        assigned_to: None,
        resolved_at: None,
        created_at: Utc::now(),
    };
    state.store.insert_issue(issue.clone()).await?;
    info!(
        issue_id = %issue.id,
        severity = ?issue.severity,
        "Issue created from classification findings"
    );
    Ok(issue)
}

/// Scans the issue text for mention tokens and dispatches notifications.
async fn dispatch_mentions(
    state: &AppState,
    issue: &Issue,
    organization_id: Uuid,
) -> Result<(), AppError> {
    let scan_text = match &issue.description {
        Some(description) => format!("{}\n{}", issue.title, description),
        None => issue.title.clone(),
    };
    let matches =
        resolver::resolve_mentions(state.store.as_ref(), &scan_text, organization_id).await?;
    if matches.is_empty() {
        return Ok(());
    }

    let member_ids: Vec<Uuid> = matches.iter().map(|m| m.member.id).collect();
    let report = notifications::dispatch(
        state.store.as_ref(),
        state.messenger.as_ref(),
        issue,
        &member_ids,
        &state.config.public_base_url,
        true,
    )
    .await?;
    info!(
        issue_id = %issue.id,
        created = report.created,
        notified = report.notified,
        errors = report.errors.len(),
        "Mention dispatch finished"
    );
    Ok(())
}

/// First line of the finding, clipped to `max` characters on a char
/// boundary.
fn truncate_title(finding: &str, max: usize) -> String {
    let first_line = finding.lines().next().unwrap_or(finding).trim();
    if first_line.chars().count() <= max {
        first_line.to_string()
    } else {
        let clipped: String = first_line.chars().take(max - 1).collect();
        format!("{clipped}…")
    }
}

/// Field-worker caption followed by the findings as a bullet list. The
/// caption comes first so its mention tokens survive into the issue text.
fn issue_description(note: &str, findings: &[&str]) -> Option<String> {
    let bullets: Vec<String> = findings.iter().map(|f| format!("- {f}")).collect();
    let note = note.trim();
    let text = if note.is_empty() {
        bullets.join("\n")
    } else {
        format!("{}\n\n{}", note, bullets.join("\n"))
    };
    (!text.is_empty()).then_some(text)
}
