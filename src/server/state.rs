//! Server state
//!
//! Everything here is shared read-only across requests. Each plan stream
//! builds its own `PlannerLoop`, so no per-request state lives in `AppState`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::llm::create_client;
use crate::planning::{GenerationOracle, LlmOracle, PlannerLoop, RevealEncoder};

use super::transport::StreamTransport;

/// Shared application state for the server
pub struct AppState {
    /// Application configuration
    pub config: Config,

    /// Source of plan steps; called serially within each request
    pub oracle: Arc<dyn GenerationOracle>,

    /// Cancelled on shutdown; every stream listens on a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, oracle: Arc<dyn GenerationOracle>) -> Self {
        Self {
            config,
            oracle,
            shutdown: CancellationToken::new(),
        }
    }

    /// State backed by the LLM provider named in the config
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let client = create_client(&config.llm)?;
        let oracle: Arc<dyn GenerationOracle> = Arc::new(LlmOracle::new(client));
        Ok(Self::new(config, oracle))
    }

    /// Fresh planner for one request
    pub fn planner(&self, prompt: &str) -> PlannerLoop {
        PlannerLoop::new(Arc::clone(&self.oracle), prompt, &self.config.planner)
    }

    /// Fresh transport for one request, cancelled with the server
    pub fn transport(&self) -> StreamTransport {
        StreamTransport::new(
            RevealEncoder::from_config(&self.config.reveal),
            self.shutdown.child_token(),
        )
    }
}
