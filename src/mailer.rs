use anyhow::{Context, Result};
use std::sync::Arc;

use crate::error::ToolError;

/// One outgoing email. Lives only for the duration of a send.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers a message and returns the provider's message id.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, message: &EmailMessage) -> Result<String>;
}

/// Resend-style HTTP mail API.
pub struct ResendTransport {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl ResendTransport {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            endpoint,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn request_body(message: &EmailMessage) -> serde_json::Value {
        serde_json::json!({
            "from": message.from,
            "to": [message.to],
            "subject": message.subject,
            "text": message.body
        })
    }

    fn message_id(response: &serde_json::Value) -> Result<String> {
        let id = response["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .context("No message id in mail API response")?;
        Ok(id.to_string())
    }
}

#[async_trait::async_trait]
impl MailTransport for ResendTransport {
    async fn deliver(&self, message: &EmailMessage) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/emails", self.endpoint.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&Self::request_body(message))
            .send()
            .await
            .context("Failed to reach mail API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Mail API error ({}): {}", status, error_text);
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse mail API response")?;

        Self::message_id(&response_json)
    }
}

/// Sends notifications from the configured sender address.
pub struct NotificationSender {
    from: String,
    transport: Arc<dyn MailTransport>,
}

impl NotificationSender {
    pub fn new(from: String, transport: Arc<dyn MailTransport>) -> Self {
        Self { from, transport }
    }

    /// Make exactly one delivery attempt.
    pub async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, ToolError> {
        let message = EmailMessage {
            from: self.from.clone(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };

        let id = self
            .transport
            .deliver(&message)
            .await
            .map_err(|e| ToolError::DeliveryFailed(format!("{:#}", e)))?;

        log::info!("NotificationSender: email to {} accepted ({})", recipient, id);
        Ok(id)
    }
}
