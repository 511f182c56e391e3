//! # Run a single command on the host thread.
//!
//! Executes one resolved handler with the task's parameters, isolates
//! faults, and measures wall time.
//!
//! Handler resolution happens in the pump step, before the task enters
//! `Processing` — a command that never resolves fails without a start.
//! This module only ever sees a resolved handler.
//!
//! ## Rules
//! - A handler error becomes a [`FailureInfo`] carrying the handler's own
//!   `kind` label.
//! - A handler panic is caught and recorded as `handler_panic`; it
//!   terminates only this task, never the pump loop.
//! - Wall time is measured around the call and attached to the outcome,
//!   success or failure.
//! - No retries.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::handlers::Handler;
use crate::tasks::FailureInfo;

/// Result of one handler invocation.
pub(crate) struct ExecOutcome {
    /// Handler result or structured failure.
    pub output: Result<Value, FailureInfo>,
    /// Handler wall time.
    pub elapsed: Duration,
}

/// Invokes `handler` with `params`, catching panics and timing the call.
pub(crate) fn run(handler: &dyn Handler, params: Value) -> ExecOutcome {
    let started = Instant::now();
    let res = catch_unwind(AssertUnwindSafe(|| handler.call(params)));
    let elapsed = started.elapsed();

    let output = match res {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(FailureInfo::from(err)),
        Err(panic_err) => Err(FailureInfo::new(
            "handler_panic",
            panic_message(panic_err.as_ref()),
        )),
    };

    ExecOutcome { output, elapsed }
}

/// Builds the failure recorded for a command with no registered handler.
pub(crate) fn unresolved(command: &str) -> FailureInfo {
    FailureInfo::new(
        "unknown_command",
        format!("no handler registered for '{command}'"),
    )
}

/// Extracts a readable message from a caught panic payload.
fn panic_message(err: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = err.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = err.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
