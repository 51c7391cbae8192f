use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{LlmConfig, LlmProvider};

pub mod anthropic;
pub mod gemini;
pub mod openai;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Token usage information from LLM response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

/// Response from LLM including text and token usage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a conversation with an optional system prompt.
    /// Implementations ask the backend for a JSON reply where it supports it.
    async fn send_message_with_system(
        &self,
        messages: &[Message],
        system_prompt: Option<&str>,
    ) -> Result<LlmResponse>;

    /// Short provider name for logs
    fn name(&self) -> &str;
}

/// Shared reqwest client with the configured timeout
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

/// Create the provider-specific client selected by the config
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match config.provider {
        LlmProvider::Gemini => {
            let api_key = config.resolve_api_key().with_context(|| {
                format!(
                    "Gemini API key not set. Set {} or configure api_key",
                    config.provider.api_key_env()
                )
            })?;
            tracing::info!("Using Gemini model {}", config.model);
            Ok(Box::new(gemini::GeminiClient::new(api_key, config)?))
        }
        LlmProvider::OpenAI => {
            // Self-hosted OpenAI-compatible servers often run without auth
            let api_key = config.resolve_api_key();
            if api_key.is_none() && config.base_url.is_none() {
                anyhow::bail!(
                    "OpenAI API key not set. Set {} or configure api_key",
                    config.provider.api_key_env()
                );
            }
            tracing::info!("Using OpenAI-compatible model {}", config.model);
            Ok(Box::new(openai::OpenAiClient::new(api_key, config)?))
        }
        LlmProvider::Anthropic => {
            let api_key = config.resolve_api_key().with_context(|| {
                format!(
                    "Anthropic API key not set. Set {} or configure api_key",
                    config.provider.api_key_env()
                )
            })?;
            tracing::info!("Using Anthropic model {}", config.model);
            Ok(Box::new(anthropic::AnthropicClient::new(api_key, config)?))
        }
    }
}
