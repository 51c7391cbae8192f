//! Server types and DTOs
//!
//! This module defines the wire frames of the plan stream and the
//! request/response bodies of the plain JSON endpoints.

use serde::{Deserialize, Serialize};

use crate::planning::TaskRecord;

/// One frame of the plan stream.
///
/// Serialized untagged, so a task frame is the bare task object and a status
/// frame is `{"status": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireEvent {
    /// Snapshot of a task, possibly with a partial description
    Task(TaskRecord),
    /// Terminal frame; nothing follows it
    Status(StatusFrame),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusFrame {
    Completed,
    Error { detail: String },
}

impl WireEvent {
    pub fn completed() -> Self {
        WireEvent::Status(StatusFrame::Completed)
    }

    pub fn error(detail: impl Into<String>) -> Self {
        WireEvent::Status(StatusFrame::Error {
            detail: detail.into(),
        })
    }

    pub fn is_status(&self) -> bool {
        matches!(self, WireEvent::Status(_))
    }

    /// JSON body of the frame
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Full server-push frame: `data: <json>` terminated by a blank line
    pub fn to_sse_frame(&self) -> String {
        format!("data: {}\n\n", self.to_json())
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Query string of `GET /api/stream_tasks`
#[derive(Debug, Deserialize)]
pub struct StreamTasksParams {
    #[serde(default)]
    pub prompt: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub provider: String,
}

/// Config response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub provider: String,
    pub model: String,
    pub max_tasks: usize,
    pub chunk_size: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
