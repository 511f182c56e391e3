//! # Task identity and lifecycle record.
//!
//! A task is created at admission and lives in the
//! [`TaskRegistry`](crate::registry::TaskRegistry) until the retention
//! sweeper evicts it. The registry is the single source of truth for status.
//!
//! ## Lifecycle
//! ```text
//! Pending ──► Processing ──► Completed
//!    │                  └──► Failed
//!    └──────────────────────► Failed        (command never resolved)
//! ```
//!
//! ## Rules
//! - Transitions are monotonic; timestamps are written once, never retracted.
//! - Only the pump mutates status, result, and timestamps.
//! - `result` and `error` are mutually exclusive, written exactly once.
//! - Caller threads never mutate a task after admission.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::HandlerError;

/// Opaque unique task identifier, assigned at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a fresh random id.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a task.
///
/// A deadline expiring on a synchronous waiter is **not** a status: the
/// registry keeps the true terminal state and the waiter observes
/// [`WaitOutcome::TimedOut`](crate::WaitOutcome::TimedOut) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Admitted, waiting in the queue.
    Pending,
    /// Currently executing on the host thread.
    Processing,
    /// Finished successfully; `result` is set.
    Completed,
    /// Finished with an error; `error` is set.
    Failed,
}

impl TaskStatus {
    /// Returns true for `Completed` and `Failed`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Structured failure recorded on a failed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureInfo {
    /// Short stable failure label (snake_case).
    pub kind: String,
    /// Human-readable description.
    pub message: String,
    /// Optional structured payload with failure context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl FailureInfo {
    pub(crate) fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            details: None,
        }
    }
}

impl From<HandlerError> for FailureInfo {
    fn from(err: HandlerError) -> Self {
        Self {
            kind: err.kind,
            message: err.message,
            details: err.details,
        }
    }
}

/// Registry-internal task record.
///
/// `params` is owned exclusively by the record until the executor takes it;
/// it is consumed exactly once.
#[derive(Debug)]
pub(crate) struct TaskRecord {
    pub id: TaskId,
    pub command: String,
    pub params: Option<Value>,
    pub metadata: Value,
    pub status: TaskStatus,
    /// Admission counter; breaks ties independent of timestamp resolution.
    pub seq: u64,
    pub created_at: SystemTime,
    pub started_at: Option<SystemTime>,
    pub completed_at: Option<SystemTime>,
    pub result: Option<Value>,
    pub error: Option<FailureInfo>,
    /// Handler wall time, measured by the executor.
    pub elapsed: Option<Duration>,
}

impl TaskRecord {
    /// Creates a fresh `Pending` record at admission time.
    pub fn admitted(id: TaskId, command: String, params: Value, metadata: Value, seq: u64) -> Self {
        Self {
            id,
            command,
            params: Some(params),
            metadata,
            status: TaskStatus::Pending,
            seq,
            created_at: SystemTime::now(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
            elapsed: None,
        }
    }

    /// Produces the public, serializable view of this record.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            command: self.command.clone(),
            status: self.status,
            seq: self.seq,
            created_at_ms: epoch_ms(self.created_at),
            started_at_ms: self.started_at.map(epoch_ms),
            completed_at_ms: self.completed_at.map(epoch_ms),
            elapsed_ms: self.elapsed.map(|d| d.as_millis() as u64),
            metadata: self.metadata.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Public, immutable view of a task, as returned by status queries.
///
/// Timestamps are epoch milliseconds. `result` and `error` are mutually
/// exclusive; both are absent until the task reaches a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    /// Task id.
    pub id: TaskId,
    /// Command name this task resolves against the handler registry.
    pub command: String,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Admission sequence number.
    pub seq: u64,
    /// Admission time (epoch ms).
    pub created_at_ms: u64,
    /// Execution start time (epoch ms), absent while `Pending`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    /// Completion time (epoch ms), absent until terminal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    /// Handler wall time in milliseconds, absent until terminal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    /// Caller-supplied metadata, never interpreted by the bridge.
    pub metadata: Value,
    /// Handler result, present only when `Completed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure details, present only when `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureInfo>,
}

/// Converts a wall-clock timestamp to epoch milliseconds.
fn epoch_ms(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}
