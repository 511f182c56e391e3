//! # Wire-facing submission types.
//!
//! Transports (HTTP, WebSocket, JSON-RPC) deserialize inbound submissions
//! into [`SubmitRequest`] and feed them to
//! [`Bridge::handle`](crate::Bridge::handle), which maps the `mode` field to
//! the typed `submit` / `submit_wait` entry points and serializes the
//! [`SubmitReply`] back.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{TaskId, TaskSnapshot};

/// Whether the caller blocks for the result or polls later by task id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Block the caller until the task completes or the deadline elapses.
    Sync,
    /// Return the task id immediately; the caller polls for the result.
    #[default]
    Async,
}

/// A single inbound command submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    /// Command name, resolved against the handler registry at execution time.
    pub command: String,

    /// Command-specific payload, passed to the handler untouched.
    #[serde(default)]
    pub params: Value,

    /// Sync (block with deadline) or async (poll by id). Default: async.
    #[serde(default)]
    pub mode: Mode,

    /// Sync-wait deadline in milliseconds. Default: 10 000.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Opaque caller metadata, stored on the task and never interpreted.
    #[serde(default)]
    pub metadata: Value,
}

impl SubmitRequest {
    /// Default sync-wait deadline when `timeout_ms` is absent.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Returns the effective sync-wait deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(Self::DEFAULT_TIMEOUT)
    }
}

/// Reply to a submission.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitReply {
    /// Async mode: the task was admitted and will run when the pump drains it.
    Queued {
        /// Id to poll via status queries.
        task_id: TaskId,
    },

    /// Sync mode: the task reached a terminal state within the deadline.
    ///
    /// The snapshot is nested so its own `status` (`completed`/`failed`)
    /// cannot collide with the reply tag.
    Done {
        /// Terminal snapshot (`Completed` or `Failed`).
        task: TaskSnapshot,
    },

    /// Sync mode: the deadline elapsed first. The task keeps executing and
    /// stays queryable under `task_id`.
    TimedOut {
        /// Id to poll for the eventual terminal state.
        task_id: TaskId,
    },
}
