use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Base URL for API (optional, for proxies, Ollama or test servers)
    #[serde(default)]
    pub base_url: Option<String>,
    /// HTTP client timeout in seconds (default: 120)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Anthropic => "anthropic",
        }
    }

    /// Environment variable consulted when the config file carries no key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "GOOGLE_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini-2.5-flash",
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            other => anyhow::bail!("Unknown provider '{}'", other),
        }
    }
}

/// Bounds for one planning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Upper bound on tasks per run (default: 10)
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,

    /// Per-call oracle timeout in seconds (default: 60)
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

/// Pacing of the typing-style description reveal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Characters added per frame (default: 4)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Delay between prefix frames in milliseconds; 0 disables pacing (default: 10)
    #[serde(default = "default_frame_delay")]
    pub frame_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_max_tokens() -> usize {
    2048
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout() -> u64 {
    120
}

fn default_max_tasks() -> usize {
    10
}

fn default_call_timeout() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    4
}

fn default_frame_delay() -> u64 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_tasks: default_max_tasks(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            frame_delay_ms: default_frame_delay(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
        }
    }
}

impl LlmConfig {
    /// Key from the config file, falling back to the provider's environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(self.provider.api_key_env()).ok())
            .filter(|k| !k.is_empty())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;
        Ok(config_dir.join("planstream").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.planner.max_tasks == 0 {
            anyhow::bail!("planner.max_tasks must be at least 1");
        }
        if self.planner.call_timeout_secs == 0 {
            anyhow::bail!("planner.call_timeout_secs must be at least 1");
        }
        if self.reveal.chunk_size == 0 {
            anyhow::bail!("reveal.chunk_size must be at least 1");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        // Try to detect provider from environment variables
        let provider = if std::env::var("GOOGLE_API_KEY").is_ok() {
            LlmProvider::Gemini
        } else if std::env::var("OPENAI_API_KEY").is_ok() {
            LlmProvider::OpenAI
        } else if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            LlmProvider::Anthropic
        } else {
            LlmProvider::Gemini
        };

        Self {
            llm: LlmConfig {
                provider,
                api_key: None,
                model: provider.default_model().to_string(),
                max_tokens: default_max_tokens(),
                temperature: default_temperature(),
                base_url: None,
                request_timeout_secs: default_request_timeout(),
            },
            planner: PlannerConfig::default(),
            reveal: RevealConfig::default(),
            server: ServerConfig::default(),
        }
    }
}
