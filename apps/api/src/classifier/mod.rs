/// Vision classifier client — the single point of entry for photo analysis.
///
/// ARCHITECTURAL RULE: No other module may call the classification API
/// directly. All media analysis MUST go through this module.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::classification::{PhotoClassification, CLASSIFICATION_SCHEMA_VERSION};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Gave up after {retries} attempts")]
    Exhausted { retries: u32 },
}

/// Media analysis collaborator. The pipeline only sees this trait; tests
/// substitute a scripted implementation.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        media_url: &str,
        media_type: &str,
        note: Option<&str>,
    ) -> Result<PhotoClassification, ClassifierError>;
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    media_url: &'a str,
    media_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP classifier used in deployment.
/// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
#[derive(Clone)]
pub struct HttpClassifier {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpClassifier {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        media_url: &str,
        media_type: &str,
        note: Option<&str>,
    ) -> Result<PhotoClassification, ClassifierError> {
        let request_body = ClassifyRequest {
            media_url,
            media_type,
            note,
        };

        let mut last_error: Option<ClassifierError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Classifier call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ClassifierError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Classifier API returned {}: {}", status, body);
                last_error = Some(ClassifierError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                // Try to parse error message
                let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(ClassifierError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.text().await.map_err(ClassifierError::Http)?;
            let payload: PhotoClassification = serde_json::from_str(&body)?;

            if payload.version != CLASSIFICATION_SCHEMA_VERSION {
                warn!(
                    "Classifier returned schema version {} (expected {}), accepting as-is",
                    payload.version, CLASSIFICATION_SCHEMA_VERSION
                );
            }

            debug!(
                "Classification succeeded: phase={:?}, quality={:?}",
                payload.phase,
                payload.quality_score()
            );

            return Ok(payload);
        }

        Err(last_error.unwrap_or(ClassifierError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }
}
