use std::collections::BTreeMap;

use axum::{
    extract::{OriginalUri, Path, State},
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Posture;
use crate::errors::AppError;
use crate::messaging::address;
use crate::models::message::{InboundMessage, MessageDirection, MessageStatus};
use crate::processing::queue::{EnqueueError, Job};
use crate::state::AppState;
use crate::store::Store;
use crate::webhook::signature::{verify_signature, SIGNATURE_HEADER};

fn field<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k.as_str() == key)
        .map(|(_, v)| v.as_str())
}

/// POST /webhooks/messages
///
/// Fast-ack gateway for the messaging provider: verify the signature, persist
/// the raw message, enqueue a processing job and return 200. Processing
/// failures never surface here; the provider would only retry a delivery we
/// already hold.
pub async fn handle_inbound_message(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode, AppError> {
    let params: Vec<(String, String)> = serde_urlencoded::from_str(&body)
        .map_err(|e| AppError::Validation(format!("Malformed form body: {e}")))?;

    // The provider signs the public URL it posted to, not whatever host
    // header reached us behind the proxy.
    let url = format!(
        "{}{}",
        state.config.public_base_url,
        uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
    );

    match (state.config.posture, state.config.webhook_auth_token.as_deref()) {
        (Posture::Production, Some(secret)) => {
            let provided = headers
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .ok_or(AppError::SignatureRejected)?;
            if !verify_signature(secret, &url, &params, provided) {
                warn!("Webhook signature verification failed");
                return Err(AppError::SignatureRejected);
            }
        }
        (Posture::Production, None) => {
            // Config::from_env refuses this combination at startup; refuse
            // again here rather than accept unsigned traffic.
            warn!("Production posture without a webhook token, rejecting");
            return Err(AppError::SignatureRejected);
        }
        (Posture::Development, _) => {
            warn!("Skipping webhook signature verification (development posture)");
        }
    }

    let external_id = field(&params, "MessageSid")
        .or_else(|| field(&params, "SmsSid"))
        .ok_or_else(|| AppError::Validation("MessageSid is required".to_string()))?;
    let from_raw = field(&params, "From")
        .ok_or_else(|| AppError::Validation("From is required".to_string()))?;

    // Provider retry of a delivery we already persisted: re-ack, change nothing.
    if let Some(existing) = state.store.message_by_external_id(external_id).await? {
        info!(
            message_id = %existing.id,
            external_id,
            "Duplicate webhook delivery, re-acknowledging"
        );
        return Ok(StatusCode::OK);
    }

    let num_media: usize = field(&params, "NumMedia")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let (media_url, media_type) = if num_media > 0 {
        (
            field(&params, "MediaUrl0").map(str::to_string),
            field(&params, "MediaContentType0").map(str::to_string),
        )
    } else {
        (None, None)
    };

    let message = InboundMessage {
        id: Uuid::new_v4(),
        external_message_id: external_id.to_string(),
        from_address: address::normalize_address(from_raw),
        to_address: address::normalize_address(field(&params, "To").unwrap_or_default()),
        direction: MessageDirection::Incoming,
        body: field(&params, "Body").unwrap_or_default().to_string(),
        media_url,
        media_type,
        status: MessageStatus::Received,
        raw_params: params.iter().cloned().collect::<BTreeMap<_, _>>(),
        received_at: Utc::now(),
    };
    let message_id = message.id;
    let has_media = message.has_media();
    state.store.insert_message(message).await?;
    info!(%message_id, external_id, has_media, "Inbound message persisted");

    // The ack must not wait on queue capacity. A full queue leaves the
    // message in `received`, where the reprocess endpoint can pick it up.
    if let Err(e) = state.jobs.try_enqueue(Job::ProcessMessage(message_id)) {
        error!(%message_id, "Could not enqueue processing job: {e}");
    }

    Ok(StatusCode::OK)
}

/// GET /webhooks/messages
///
/// Some provider consoles probe the webhook URL before saving it.
pub async fn handle_webhook_liveness() -> &'static str {
    "Bouwlog message webhook"
}

/// POST /api/v1/messages/:id/reprocess
///
/// Re-run the processing pipeline for a stored message. Every stage is
/// idempotent, so replaying a processed message creates nothing new.
pub async fn handle_reprocess(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let message = state
        .store
        .message(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Message {id} not found")))?;

    state
        .jobs
        .try_enqueue(Job::ProcessMessage(message.id))
        .map_err(|e| match e {
            EnqueueError::Full => AppError::QueueFull,
            EnqueueError::Closed => AppError::Internal(anyhow::anyhow!(
                "processing queue is closed"
            )),
        })?;

    info!(message_id = %message.id, "Message queued for reprocessing");
    Ok(StatusCode::ACCEPTED)
}
