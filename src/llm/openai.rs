//! OpenAI-compatible chat completions client
//!
//! Works with OpenAI itself and with any server that implements the chat
//! completions API (Ollama, vLLM, LiteLLM, LM Studio). JSON mode is requested
//! through `response_format`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, LlmClient, LlmResponse, Message, TokenUsage};
use crate::config::LlmConfig;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiClient {
    /// Optional API key (some self-hosted servers don't require auth)
    api_key: Option<String>,
    model: String,
    max_tokens: usize,
    temperature: f32,
    /// Base URL without trailing slash, e.g. "http://localhost:11434/v1"
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: usize,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, config: &LlmConfig) -> Result<Self> {
        // Normalize base URL - remove trailing slash if present
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            base_url,
            client: http_client(config.request_timeout_secs)?,
        })
    }

    fn build_request(&self, messages: &[Message], system_prompt: Option<&str>) -> OpenAiRequest {
        let mut openai_messages = Vec::with_capacity(messages.len() + 1);

        if let Some(system) = system_prompt {
            openai_messages.push(OpenAiMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }

        openai_messages.extend(messages.iter().map(|m| OpenAiMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }));

        OpenAiRequest {
            model: self.model.clone(),
            messages: openai_messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn send_message_with_system(
        &self,
        messages: &[Message],
        system_prompt: Option<&str>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, system_prompt);
        let url = format!("{}/chat/completions", self.base_url);

        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        // Add authorization header only if API key is provided
        if let Some(ref api_key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to OpenAI-compatible API at {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI-compatible API error ({}): {}", status, error_text);
        }

        let openai_response: OpenAiResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI-compatible API response")?;

        let text = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No response from OpenAI-compatible API"))?
            .message
            .content
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            usage: openai_response
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
