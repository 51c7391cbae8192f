//! Core types for incremental plan generation

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One task card, as streamed to the client.
///
/// Once a record has been appended to a [`PlanState`] it is never modified;
/// the reveal encoder only ever produces copies with a shortened description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl TaskRecord {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Copy of this record with `description` replaced
    pub fn with_description(&self, description: &str) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            description: description.to_string(),
            tags: self.tags.clone(),
        }
    }
}

/// A task as proposed by the oracle, before the planner has vetted its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCandidate {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TaskCandidate {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Finalize into a record carrying `id`
    pub fn into_record(self, id: String) -> TaskRecord {
        TaskRecord {
            id,
            title: self.title,
            description: self.description,
            tags: self.tags,
        }
    }
}

/// The per-request accumulator driven by the planner loop.
#[derive(Debug, Clone)]
pub struct PlanState {
    prompt: String,
    tasks: Vec<TaskRecord>,
    finished: bool,
}

impl PlanState {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            tasks: Vec::new(),
            finished: false,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub(crate) fn push(&mut self, task: TaskRecord) {
        debug_assert!(!self.finished, "append after plan finished");
        self.tasks.push(task);
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }
}

/// Planner loop states. Every `Finished*` state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    Running,
    FinishedComplete,
    FinishedCapped,
    FinishedError,
}

impl LoopStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoopStatus::Running)
    }
}
