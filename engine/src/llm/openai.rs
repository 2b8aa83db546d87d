use super::{parse_severity, triage_messages, Advisor, AdvisorError, SeverityParse};
use crate::config::OpenAIConfig;
use crate::secrets::{SecretManager, SecretString};
use crate::triage::ensure_disclaimer;
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::TriageResult;
use serde_json::json;
use std::time::Duration;

/// Longest slice of an error body kept for logs
const MAX_ERROR_BODY: usize = 200;

/// Advisor backed by an OpenAI-compatible chat completions endpoint
pub struct OpenAIAdvisor {
    config: OpenAIConfig,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl OpenAIAdvisor {
    /// Create a new advisor
    ///
    /// `timeout` bounds the whole HTTP exchange; a hang surfaces as
    /// `UpstreamError`.
    pub fn new(
        config: OpenAIConfig,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key: api_key.filter(|key| !key.is_blank()),
            client,
        })
    }

    /// Request body for the given symptoms
    pub fn build_payload(&self, symptoms: &str) -> serde_json::Value {
        let api_messages: Vec<serde_json::Value> = triage_messages(symptoms)
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        json!({
            "model": self.config.model,
            "messages": api_messages,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        })
    }

    fn classify_transport_error(e: reqwest::Error) -> AdvisorError {
        if e.is_timeout() {
            AdvisorError::UpstreamError("Request timed out".to_string())
        } else if e.is_connect() {
            AdvisorError::UpstreamUnavailable(format!("Cannot connect to model endpoint: {}", e))
        } else {
            AdvisorError::UpstreamError(format!("Request failed: {}", e))
        }
    }
}

#[async_trait]
impl Advisor for OpenAIAdvisor {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn advise(&self, symptoms: &str) -> super::Result<TriageResult> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AdvisorError::UpstreamUnavailable("No API key configured".to_string()))?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.unsecure()))
            .header("Content-Type", "application/json")
            .json(&self.build_payload(symptoms))
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let body: String = SecretManager::scrub(&text)
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();

            return Err(AdvisorError::UpstreamError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let data: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AdvisorError::UpstreamError("Timed out reading response".to_string())
            } else {
                AdvisorError::UpstreamError(format!("Malformed response body: {}", e))
            }
        })?;

        let content = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AdvisorError::UpstreamError("No content in response".to_string()))?;

        match parse_severity(content) {
            SeverityParse::Parsed { severity, advice } => {
                Ok(TriageResult::new(ensure_disclaimer(&advice), severity))
            }
            SeverityParse::Failure(reason) => Err(AdvisorError::UpstreamError(reason)),
        }
    }
}
