//! Error types used by the bridge and by command handlers.
//!
//! This module defines the error surface of the crate:
//!
//! - [`AdmitError`] — a submission was rejected before a task was created.
//! - [`QueryError`] — a status query referenced an unknown task id.
//! - [`RegisterError`] — handler registration was rejected.
//! - [`HandlerError`] — a structured failure returned by a command handler.
//!
//! The enums provide `as_label()` helpers returning short stable snake_case
//! labels for logs and metrics.

use serde_json::Value;
use thiserror::Error;

use crate::tasks::TaskId;

/// # Errors raised by the admission gate.
///
/// A rejected submission never creates a task: there is no id to poll and
/// nothing enters the queue or the registry. The caller's recourse is
/// resubmission (with backoff for [`AdmitError::QueueFull`]).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmitError {
    /// The command name was empty.
    #[error("command name is empty")]
    EmptyCommand,

    /// The queue is at capacity; try again after the pump drains.
    #[error("queue full (capacity {capacity})")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// Pre-check is enabled and no handler is registered under this name.
    #[error("unknown command '{command}'")]
    UnknownCommand {
        /// The command name that failed to resolve.
        command: String,
    },

    /// The bridge has been shut down and accepts no new work.
    #[error("bridge is shut down")]
    Closed,
}

impl AdmitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use hostbridge::AdmitError;
    ///
    /// let err = AdmitError::QueueFull { capacity: 100 };
    /// assert_eq!(err.as_label(), "queue_full");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmitError::EmptyCommand => "empty_command",
            AdmitError::QueueFull { .. } => "queue_full",
            AdmitError::UnknownCommand { .. } => "unknown_command",
            AdmitError::Closed => "bridge_closed",
        }
    }
}

/// # Errors raised by status queries.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No task with this id exists (never admitted, or already evicted).
    #[error("task {id} not found")]
    NotFound {
        /// The id that failed to resolve.
        id: TaskId,
    },
}

impl QueryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueryError::NotFound { .. } => "task_not_found",
        }
    }
}

/// # Errors raised by handler registration.
///
/// The handler registry is append-only: re-registering an existing name is
/// rejected and the original handler stays in place.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// A handler is already registered under this name.
    #[error("handler '{command}' already registered")]
    AlreadyRegistered {
        /// The contested command name.
        command: String,
    },

    /// The command name was empty.
    #[error("command name is empty")]
    EmptyCommand,
}

impl RegisterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RegisterError::AlreadyRegistered { .. } => "already_registered",
            RegisterError::EmptyCommand => "empty_command",
        }
    }
}

/// # Structured failure returned by a command handler.
///
/// Handlers fail with a stable `kind` label, a human-readable message, and an
/// optional JSON detail payload. The pump records the failure on the task;
/// it is never retried automatically and never propagated to other tasks.
///
/// # Example
/// ```
/// use hostbridge::HandlerError;
///
/// let err = HandlerError::new("object_not_found", "no object named 'Cube'")
///     .with_details(serde_json::json!({ "name": "Cube" }));
/// assert_eq!(err.kind, "object_not_found");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct HandlerError {
    /// Short stable failure label (snake_case).
    pub kind: String,
    /// Human-readable description.
    pub message: String,
    /// Optional structured payload with failure context.
    pub details: Option<Value>,
}

impl HandlerError {
    /// Creates a new handler error with the given kind and message.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Shorthand for the common invalid-parameters failure.
    ///
    /// # Example
    /// ```
    /// use hostbridge::HandlerError;
    ///
    /// let err = HandlerError::invalid_params("missing field 'size'");
    /// assert_eq!(err.kind, "invalid_params");
    /// ```
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new("invalid_params", message)
    }

    /// Attaches a structured detail payload.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}
