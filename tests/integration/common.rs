use async_trait::async_trait;
use planstream::config::{Config, LlmConfig, LlmProvider};
use planstream::planning::{GenerationOracle, OracleError, Proposal, TaskCandidate, TaskRecord};
use planstream::server::WireEvent;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Oracle that replays a fixed list of replies, then finishes
pub struct ReplayOracle {
    replies: Mutex<VecDeque<Result<Proposal, String>>>,
    pub calls: Arc<AtomicUsize>,
}

impl ReplayOracle {
    pub fn new(replies: Vec<Result<Proposal, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Oracle proposing `count` tasks with the given description, then finishing
    pub fn tasks(count: usize, description: &str) -> Self {
        let mut replies: Vec<_> = (1..=count)
            .map(|n| {
                Ok(Proposal::Task(
                    TaskCandidate::new(format!("Task {}", n), description).with_tags(["Backend"]),
                ))
            })
            .collect();
        replies.push(Ok(Proposal::Finished));
        Self::new(replies)
    }
}

#[async_trait]
impl GenerationOracle for ReplayOracle {
    async fn propose(&self, _prompt: &str, _tasks: &[TaskRecord]) -> Result<Proposal, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(proposal)) => Ok(proposal),
            Some(Err(message)) => Err(OracleError::Backend(anyhow::anyhow!(message))),
            None => Ok(Proposal::Finished),
        }
    }
}

/// Config for tests: no pacing, no key lookups
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.llm = llm_config(LlmProvider::Gemini, None);
    config.reveal.frame_delay_ms = 0;
    config
}

pub fn llm_config(provider: LlmProvider, base_url: Option<String>) -> LlmConfig {
    LlmConfig {
        provider,
        api_key: Some("test-key".to_string()),
        model: provider.default_model().to_string(),
        max_tokens: 512,
        temperature: 0.2,
        base_url,
        request_timeout_secs: 5,
    }
}

/// Parse an SSE body into the frames it carries
pub fn parse_frames(body: &str) -> Vec<WireEvent> {
    body.split("\n\n")
        .filter_map(|block| {
            let data: Vec<&str> = block
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(|d| d.strip_prefix(' ').unwrap_or(d))
                .collect();
            if data.is_empty() {
                None
            } else {
                Some(serde_json::from_str(&data.join("\n")).expect("frame is valid JSON"))
            }
        })
        .collect()
}
