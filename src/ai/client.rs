use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::debug;

use super::types::{CandidateBatch, ChatResponse};
use super::{CandidateTest, TestSynthesizer};
use crate::config::{AiConfig, RequestConfig};
use crate::error::{AiError, AiResult};

use async_trait::async_trait;

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct AiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_ms: u64,
}

impl AiClient {
    pub fn new(config: &AiConfig, request: &RequestConfig) -> AiResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(request.ai_timeout_ms))
            .build()
            .map_err(|e| AiError::Unavailable {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.deployment.clone(),
            timeout_ms: request.ai_timeout_ms,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> AiError {
        if e.is_timeout() {
            AiError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            AiError::Unavailable {
                message: e.to_string(),
            }
        }
    }

    /// Strip markdown code fences the model sometimes wraps around JSON.
    fn extract_json(content: &str) -> &str {
        let trimmed = content.trim();
        let without_open = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        without_open
            .strip_suffix("```")
            .unwrap_or(without_open)
            .trim()
    }

    fn parse_candidates(content: &str) -> AiResult<Vec<CandidateTest>> {
        let payload = Self::extract_json(content);
        let batch: CandidateBatch =
            serde_json::from_str(payload).map_err(|e| AiError::InvalidResponse {
                message: format!("Response was not valid candidate JSON: {}", e),
            })?;
        Ok(batch.test_cases)
    }
}

#[async_trait]
impl TestSynthesizer for AiClient {
    async fn synthesize(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> AiResult<Vec<CandidateTest>> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": 0.3,
            "response_format": { "type": "json_object" }
        });

        debug!(model = %self.model, "Requesting test synthesis");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok());
                return Err(AiError::RateLimited { retry_after_secs });
            }
            status if status.is_server_error() => {
                let message = response.text().await.unwrap_or_default();
                return Err(AiError::Unavailable {
                    message: format!("{}: {}", status, message),
                });
            }
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                return Err(AiError::InvalidResponse {
                    message: format!("Unexpected status {}: {}", status, message),
                });
            }
            _ => {}
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse {
                message: format!("Failed to parse completion: {}", e),
            })?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| AiError::InvalidResponse {
                message: "Completion contained no choices".to_string(),
            })?;

        Self::parse_candidates(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_strips_fences() {
        assert_eq!(
            AiClient::extract_json("```json\n{\"test_cases\":[]}\n```"),
            "{\"test_cases\":[]}"
        );
        assert_eq!(AiClient::extract_json("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_candidates_rejects_prose() {
        let result = AiClient::parse_candidates("Here are your test cases!");
        assert!(matches!(result, Err(AiError::InvalidResponse { .. })));
    }

    #[test]
    fn test_parse_candidates_accepts_batch() {
        let cases = AiClient::parse_candidates(
            r#"{"test_cases":[{"title":"Verify rollback on failure"}]}"#,
        )
        .unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].title, "Verify rollback on failure");
    }
}
