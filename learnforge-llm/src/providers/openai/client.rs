//! OpenAI-compatible HTTP client

use super::types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, Message, ResponseFormat,
};
use crate::providers::{classify_reqwest_error, http_client, status_error, DEFAULT_HTTP_TIMEOUT};
use crate::{BackendReply, ChatBackend};
use async_trait::async_trait;
use learnforge_core::ProviderError;
use reqwest::Client;
use std::time::Duration;

pub const PROVIDER_ID: &str = "openai-compatible";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const TEMPERATURE: f32 = 0.7;

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Server root, without the `/v1/...` path
    /// * `api_key` - Bearer token
    /// * `model` - Model name (e.g., "gpt-3.5-turbo")
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Client against the public OpenAI API with the default model.
    pub fn with_defaults(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(DEFAULT_BASE_URL, api_key, DEFAULT_MODEL, DEFAULT_HTTP_TIMEOUT)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: TEMPERATURE,
            response_format: ResponseFormat::json_object(),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAIClient {
    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<BackendReply, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|api_error| api_error.error.message)
                .unwrap_or(body);
            return Err(status_error(status, &message));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(classify_reqwest_error)?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        let model = body
            .model
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| self.model.clone());

        Ok(BackendReply { content, model })
    }
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let client = OpenAIClient::new("http://localhost:1/", "sk-test", "gpt-test", DEFAULT_HTTP_TIMEOUT)
            .unwrap();
        let body = serde_json::to_value(client.build_request("hello")).unwrap();
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(client.endpoint(), "http://localhost:1/v1/chat/completions");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = OpenAIClient::with_defaults("sk-secret").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
