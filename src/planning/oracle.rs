//! The generation oracle: the external source of the next task.
//!
//! The planner only sees [`GenerationOracle`]. [`LlmOracle`] is the
//! production implementation that asks a chat model for one task at a time.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::llm::{LlmClient, Message};
use crate::utils::extract_json_object;

use super::types::{TaskCandidate, TaskRecord};

/// What one oracle call produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// The next task of the plan
    Task(TaskCandidate),
    /// The plan is complete
    Finished,
}

/// Every way an oracle call can fail. All of them end the run.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Malformed oracle response: {0}")]
    Malformed(String),

    #[error("Oracle backend failed: {0:#}")]
    Backend(#[from] anyhow::Error),

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),
}

impl OracleError {
    /// Description that is safe to send to the client.
    /// Backend errors can embed URLs, keys or raw provider bodies, so they are
    /// reduced to a generic message; the full error only goes to the log.
    pub fn public_detail(&self) -> String {
        match self {
            OracleError::Malformed(_) => "The planner returned a malformed response".to_string(),
            OracleError::Backend(_) => "The planning backend request failed".to_string(),
            OracleError::Timeout(d) => format!("The planner did not respond within {}s", d.as_secs()),
        }
    }
}

/// Capability: given the prompt and the plan so far, propose the next step.
#[async_trait]
pub trait GenerationOracle: Send + Sync {
    async fn propose(&self, prompt: &str, tasks: &[TaskRecord]) -> Result<Proposal, OracleError>;
}

const PLANNER_SYSTEM_PROMPT: &str = r#"You are an expert project planner and technical architect.
Break a high-level project idea into a series of actionable, technical tasks.

Generate tasks ONE AT A TIME in a logical implementation order. For each step:
1. Review the project idea.
2. Review the tasks already generated.
3. Decide the NEXT logical task.
4. If the plan is complete and covers backend, frontend, DevOps and testing, finish the plan.

Be specific, technical and practical.

## Output Format:
Respond with ONLY a JSON object (no markdown, no explanation):
{
  "task": {
    "id": "a unique identifier",
    "title": "Concise, actionable title",
    "description": "What the task involves, its goal and expected outcome",
    "tags": ["Backend", "UI", "DevOps"]
  },
  "is_finished": false
}

When no more tasks are needed respond with {"task": null, "is_finished": true}."#;

/// Reply shape requested from the model
#[derive(Debug, Deserialize)]
struct TaskGeneration {
    #[serde(default)]
    task: Option<TaskCandidate>,
    #[serde(default)]
    is_finished: bool,
}

/// Oracle backed by a chat model
pub struct LlmOracle {
    client: Box<dyn LlmClient>,
}

impl LlmOracle {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }

    fn user_message(prompt: &str, tasks: &[TaskRecord]) -> String {
        let history = if tasks.is_empty() {
            "No tasks generated yet.".to_string()
        } else {
            tasks
                .iter()
                .map(|t| format!("- {}: {}", t.title, t.description))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "Project idea: {}\n\nAlready generated tasks:\n{}\n\nGenerate the next task or finish the plan.",
            prompt, history
        )
    }

    /// Validate a model reply into a proposal
    pub fn parse_reply(text: &str) -> Result<Proposal, OracleError> {
        let json = extract_json_object(text).ok_or_else(|| {
            OracleError::Malformed(format!(
                "no JSON object in reply: {}",
                crate::utils::truncate_str(text.trim(), 200)
            ))
        })?;

        let generation: TaskGeneration = serde_json::from_str(json)
            .map_err(|e| OracleError::Malformed(format!("invalid JSON: {}", e)))?;

        if generation.is_finished {
            return Ok(Proposal::Finished);
        }

        match generation.task {
            Some(task) if !task.title.trim().is_empty() => Ok(Proposal::Task(task)),
            Some(_) => Err(OracleError::Malformed("task has an empty title".to_string())),
            None => Err(OracleError::Malformed(
                "reply is neither a task nor a finish signal".to_string(),
            )),
        }
    }
}

#[async_trait]
impl GenerationOracle for LlmOracle {
    async fn propose(&self, prompt: &str, tasks: &[TaskRecord]) -> Result<Proposal, OracleError> {
        let messages = vec![Message::user(Self::user_message(prompt, tasks))];
        let response = self
            .client
            .send_message_with_system(&messages, Some(PLANNER_SYSTEM_PROMPT))
            .await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                "{} usage: {} tokens ({} input, {} output)",
                self.client.name(),
                usage.total(),
                usage.input_tokens,
                usage.output_tokens
            );
        }

        Self::parse_reply(&response.text)
    }
}
