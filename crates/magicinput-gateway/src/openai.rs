//! OpenAI-compatible escalation gateway.
//!
//! [`OpenAiGateway`] posts one chat completion per analysis to
//! `{base_url}/chat/completions` and normalizes the reply. It performs a
//! single attempt; retries and timeouts are the caller's policy.

use crate::config::GatewayConfig;
use crate::parse::parse_response;
use crate::prompt::build_messages;
use crate::EscalationGateway;
use async_trait::async_trait;
use magicinput_core::{ChatMessage, Error, EscalatedResult, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Escalation gateway speaking the OpenAI chat completion protocol
pub struct OpenAiGateway {
    config: GatewayConfig,
    http: reqwest::Client,
}

impl OpenAiGateway {
    /// Create a new gateway from configuration
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    /// Returns the gateway configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn complete(&self, api_key: &str, content: &str) -> Result<String> {
        let url = self.config.completions_url();
        let request = CompletionRequest {
            model: &self.config.model,
            messages: build_messages(content),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(model = %self.config.model, chars = content.chars().count(), "Sending escalation request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("failed to read response body: {}", e)))?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            warn!(status = status.as_u16(), "Escalation service rejected the credential");
            return Err(Error::service(format!(
                "authentication rejected (HTTP {}): {}",
                status.as_u16(),
                body
            )));
        }
        if !status.is_success() {
            return Err(Error::service(format!("HTTP {}: {}", status, body)));
        }

        let envelope: CompletionResponse = serde_json::from_str(&body)
            .map_err(|e| Error::service(format!("failed to parse response: {}", e)))?;
        let content = envelope
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::service("response contained no choices"))?
            .message
            .content
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(Error::service("response contained an empty message"));
        }
        Ok(content)
    }
}

#[async_trait]
impl EscalationGateway for OpenAiGateway {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn analyze(&self, content: &str) -> Result<Vec<EscalatedResult>> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| Error::config("API key is not configured"))?;

        let reply = self.complete(api_key, content).await?;
        let results = parse_response(&reply);

        debug!(results = results.len(), "Escalation response normalized");
        Ok(results)
    }
}
