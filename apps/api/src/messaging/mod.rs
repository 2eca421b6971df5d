/// Outbound messaging client — the single point of entry for provider sends.
///
/// ARCHITECTURAL RULE: No other module may call the messaging provider
/// directly. All outbound delivery MUST go through this module.
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub mod address;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Outbound delivery collaborator. Returns the provider message id on
/// success; callers record it only as an audit detail.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(
        &self,
        to: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<String, DeliveryError>;
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

/// HTTP messenger used in deployment. Speaks the provider's form-encoded
/// message API with basic auth. No retries here: callers isolate failures
/// per recipient and a duplicate send is worse than a missed one.
#[derive(Clone)]
pub struct HttpMessenger {
    client: Client,
    api_url: String,
    account_sid: String,
    auth_token: String,
    from_address: String,
}

impl HttpMessenger {
    pub fn new(
        api_url: String,
        account_sid: String,
        auth_token: String,
        from_address: String,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_url,
            account_sid,
            auth_token,
            from_address,
        }
    }
}

#[async_trait]
impl Messenger for HttpMessenger {
    async fn send(
        &self,
        to: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<String, DeliveryError> {
        let to_address = address::channel_address(to);
        let mut params = vec![
            ("From", self.from_address.clone()),
            ("To", to_address),
            ("Body", body.to_string()),
        ];
        if let Some(url) = media_url {
            params.push(("MediaUrl", url.to_string()));
        }

        let response = self
            .client
            .post(&self.api_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderError>(&body_text)
                .map(|e| e.message)
                .unwrap_or(body_text);
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendResponse = response.json().await?;
        debug!("Outbound message accepted: sid={}", sent.sid);
        Ok(sent.sid)
    }
}
