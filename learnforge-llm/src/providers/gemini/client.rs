//! Gemini HTTP client

use super::types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use crate::providers::{classify_reqwest_error, http_client, status_error, DEFAULT_HTTP_TIMEOUT};
use crate::{BackendReply, ChatBackend};
use async_trait::async_trait;
use learnforge_core::ProviderError;
use reqwest::Client;
use std::time::Duration;

pub const PROVIDER_ID: &str = "gemini";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

const TEMPERATURE: f32 = 0.7;

/// Header carrying the API key. Keeps the key out of request URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a new client. An empty model falls back to [`DEFAULT_MODEL`].
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let model = model.into();
        Ok(Self {
            client: http_client(timeout)?,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: if model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model
            },
        })
    }

    pub fn with_defaults(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(DEFAULT_BASE_URL, api_key, DEFAULT_MODEL, DEFAULT_HTTP_TIMEOUT)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_mime_type: "application/json".to_string(),
            },
        }
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
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
            .header(API_KEY_HEADER, self.api_key.as_str())
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

        let body: GenerateContentResponse =
            response.json().await.map_err(classify_reqwest_error)?;

        let content = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ProviderError::EmptyResponse)?;

        let model = body
            .model_version
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| self.model.clone());

        Ok(BackendReply { content, model })
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
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
        let client = GeminiClient::new("http://localhost:1", "g-key", "", DEFAULT_HTTP_TIMEOUT)
            .unwrap();
        let body = serde_json::to_value(client.build_request("hello")).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(
            client.endpoint(),
            "http://localhost:1/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_response_accepts_model_version_or_model() {
        let with_version: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[],"modelVersion":"gemini-x"}"#).unwrap();
        assert_eq!(with_version.model_version.as_deref(), Some("gemini-x"));

        let with_model: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[],"model":"gemini-y"}"#).unwrap();
        assert_eq!(with_model.model_version.as_deref(), Some("gemini-y"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = GeminiClient::with_defaults("g-secret").unwrap();
        assert!(!format!("{:?}", client).contains("g-secret"));
    }

    #[test]
    fn test_endpoint_never_carries_api_key() {
        let client = GeminiClient::new("http://localhost:1", "g-secret", "m", DEFAULT_HTTP_TIMEOUT)
            .unwrap();
        assert!(!client.endpoint().contains("g-secret"));
    }

    #[tokio::test]
    async fn test_transport_error_never_leaks_api_key() {
        let client = GeminiClient::new(
            "http://127.0.0.1:1",
            "SECRETKEY123",
            "m",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.complete("prompt").await.unwrap_err();

        assert!(err.is_retryable());
        assert!(!err.to_string().contains("SECRETKEY123"));
        assert!(!format!("{:?}", err).contains("SECRETKEY123"));
    }
}
