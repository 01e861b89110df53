use anyhow::{Context, Result};

/// Parameters for a single chat completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
}

/// A model that completes one system + user exchange.
///
/// `Ok(None)` means the backend answered but produced no content.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<Option<String>>;
}

/// HTTP client for an OpenAI-compatible chat completions API.
pub struct OpenAiClient {
    pub endpoint: String,
    pub model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(endpoint: String, model: String, api_key: String) -> Self {
        Self {
            endpoint,
            model,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn request_body(&self, request: &ChatRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt }
            ],
            "max_tokens": request.max_tokens
        })
    }

    fn first_completion(response: &serde_json::Value) -> Result<Option<String>> {
        let choices = response["choices"]
            .as_array()
            .context("No choices in completion response")?;

        Ok(choices
            .first()
            .and_then(|choice| choice["message"]["content"].as_str())
            .filter(|content| !content.is_empty())
            .map(str::to_string))
    }
}

#[async_trait::async_trait]
impl ChatBackend for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> Result<Option<String>> {
        let response = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.endpoint.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&request))
            .send()
            .await
            .context("Failed to send request to inference API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference API error ({}): {}", status, error_text);
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse inference response")?;

        Self::first_completion(&response_json)
    }
}
