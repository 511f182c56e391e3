//! # Runtime events emitted by the bridge.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Admission events**: submissions entering or bouncing off the gate
//! - **Execution events**: the pump driving tasks through their lifecycle
//! - **Retention events**: terminal records evicted by the sweeper
//! - **Infrastructure events**: registration, shutdown, subscriber faults
//!
//! The [`Event`] struct carries optional metadata such as the task id,
//! command name, failure reason, and handler wall time.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use hostbridge::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::TaskFailed)
//!     .with_command("add_cube")
//!     .with_reason("unknown_command");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.command.as_deref(), Some("add_cube"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::tasks::TaskId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Admission events ===
    /// A submission passed the gate and entered the queue.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `command`: command name
    /// - `depth`: queue depth after admission
    TaskAdmitted,

    /// A submission was rejected before a task was created.
    ///
    /// Sets:
    /// - `command`: command name (when known)
    /// - `reason`: rejection label (`queue_full`, `empty_command`, ...)
    SubmitRejected,

    // === Execution events ===
    /// The pump picked a task and handed it to the executor.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `command`: command name
    TaskStarted,

    /// A task finished successfully.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `command`: command name
    /// - `elapsed_ms`: handler wall time
    TaskCompleted,

    /// A task finished with an error (handler failure, panic, or a command
    /// that never resolved).
    ///
    /// Sets:
    /// - `task`: task id
    /// - `command`: command name
    /// - `reason`: failure label
    /// - `elapsed_ms`: handler wall time (absent for unresolved commands)
    TaskFailed,

    // === Retention events ===
    /// A terminal record was evicted by the retention sweeper.
    ///
    /// Sets:
    /// - `task`: task id
    TaskEvicted,

    // === Infrastructure events ===
    /// A handler was registered.
    ///
    /// Sets:
    /// - `command`: command name
    HandlerRegistered,

    /// The bridge was shut down; further admissions are rejected.
    ShutdownRequested,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: panic info, prefixed with the subscriber name
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and drop cause
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task id, if applicable.
    pub task: Option<TaskId>,
    /// Command name, if applicable.
    pub command: Option<Arc<str>>,
    /// Short reason label or failure message.
    pub reason: Option<Arc<str>>,
    /// Handler wall time in milliseconds (compact).
    pub elapsed_ms: Option<u64>,
    /// Queue depth at emission time.
    pub depth: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            command: None,
            reason: None,
            elapsed_ms: None,
            depth: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, id: TaskId) -> Self {
        self.task = Some(id);
        self
    }

    /// Attaches a command name.
    #[inline]
    pub fn with_command(mut self, command: impl Into<Arc<str>>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attaches a reason label or failure message.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the handler wall time (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u64::MAX)) as u64;
        self.elapsed_ms = Some(ms);
        self
    }

    /// Attaches the queue depth.
    #[inline]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, cause: &'static str) -> Self {
        Event::now(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} cause={cause}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::now(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }

    /// Returns true for overflow events, which are never re-reported.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}
