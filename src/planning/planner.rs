//! Bounded planner loop
//!
//! Drives the oracle one call at a time and hands each accepted task to the
//! caller before asking for the next one. The caller pulls events with
//! [`PlannerLoop::next_event`], so a slow consumer naturally paces the loop.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::config::PlannerConfig;

use super::oracle::{GenerationOracle, OracleError, Proposal};
use super::types::{LoopStatus, PlanState, TaskCandidate, TaskRecord};

/// Output of one planner step
#[derive(Debug)]
pub enum PlanEvent {
    /// A completed task, already appended to the plan
    Task(TaskRecord),
    /// Normal termination. `capped` is true when the task bound stopped the run.
    Completed { capped: bool },
    /// The oracle failed; the run is over
    Failed(OracleError),
}

pub struct PlannerLoop {
    oracle: Arc<dyn GenerationOracle>,
    state: PlanState,
    status: LoopStatus,
    max_tasks: usize,
    call_timeout: Duration,
    /// Set once the terminal event has been handed out
    reported: bool,
    oracle_calls: usize,
}

impl PlannerLoop {
    pub fn new(oracle: Arc<dyn GenerationOracle>, prompt: impl Into<String>, config: &PlannerConfig) -> Self {
        Self {
            oracle,
            state: PlanState::new(prompt),
            status: LoopStatus::Running,
            max_tasks: config.max_tasks,
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            reported: false,
            oracle_calls: 0,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn status(&self) -> LoopStatus {
        self.status
    }

    pub fn state(&self) -> &PlanState {
        &self.state
    }

    pub fn oracle_calls(&self) -> usize {
        self.oracle_calls
    }

    /// Advance the loop by at most one oracle call.
    ///
    /// Yields every accepted task, then exactly one terminal event
    /// (`Completed` or `Failed`), then `None` forever.
    pub async fn next_event(&mut self) -> Option<PlanEvent> {
        match self.status {
            LoopStatus::Running => {}
            LoopStatus::FinishedCapped if !self.reported => {
                self.reported = true;
                tracing::info!("Plan capped at {} tasks", self.state.len());
                return Some(PlanEvent::Completed { capped: true });
            }
            _ => return None,
        }

        if self.state.len() >= self.max_tasks {
            self.transition(LoopStatus::FinishedCapped);
            self.reported = true;
            return Some(PlanEvent::Completed { capped: true });
        }

        self.oracle_calls += 1;
        tracing::debug!(
            "Oracle call {} ({} tasks so far)",
            self.oracle_calls,
            self.state.len()
        );

        let result = match tokio::time::timeout(
            self.call_timeout,
            self.oracle.propose(self.state.prompt(), self.state.tasks()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.call_timeout)),
        };

        let result = match result {
            Ok(Proposal::Task(candidate)) if candidate.title.trim().is_empty() => Err(
                OracleError::Malformed("task has an empty title".to_string()),
            ),
            other => other,
        };

        match result {
            Ok(Proposal::Finished) => {
                self.transition(LoopStatus::FinishedComplete);
                self.reported = true;
                tracing::info!("Plan complete with {} tasks", self.state.len());
                Some(PlanEvent::Completed { capped: false })
            }
            Ok(Proposal::Task(candidate)) => {
                let record = self.accept(candidate);
                tracing::info!("Task {} accepted: {}", self.state.len(), record.title);
                if self.state.len() >= self.max_tasks {
                    self.transition(LoopStatus::FinishedCapped);
                }
                Some(PlanEvent::Task(record))
            }
            Err(e) => {
                tracing::error!("Planner aborted: {:#}", e);
                self.transition(LoopStatus::FinishedError);
                self.reported = true;
                Some(PlanEvent::Failed(e))
            }
        }
    }

    /// Assign an id where needed and append to the plan
    fn accept(&mut self, candidate: TaskCandidate) -> TaskRecord {
        let id = match candidate.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() && !self.state.contains_id(id) => id.to_string(),
            Some(id) if !id.is_empty() => {
                tracing::warn!("Oracle reused task id {}, assigning a fresh one", id);
                Uuid::new_v4().to_string()
            }
            _ => Uuid::new_v4().to_string(),
        };

        let record = candidate.into_record(id);
        self.state.push(record.clone());
        record
    }

    fn transition(&mut self, next: LoopStatus) {
        debug_assert!(!self.status.is_terminal(), "transition out of terminal state");
        self.status = next;
        self.state.finish();
    }
}
