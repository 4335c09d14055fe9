//! Escalation service configuration

use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Default model name
pub const DEFAULT_MODEL: &str = "qwen-plus";

/// Connection settings for the escalation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bearer credential; escalation is disabled while this is blank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the chat completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Completion token limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl GatewayConfig {
    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Credential with surrounding whitespace removed, if non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Whether a credential is present
    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    /// Chat completions endpoint
    pub fn completions_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    /// Key masked for display; the last four characters stay visible only
    /// on keys longer than eight
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key().map(|key| {
            let chars: Vec<char> = key.chars().collect();
            if chars.len() <= 8 {
                return "*".repeat(chars.len());
            }
            let visible = chars.len() - 4;
            let tail: String = chars[visible..].iter().collect();
            format!("{}{}", "*".repeat(visible.min(8)), tail)
        })
    }
}
