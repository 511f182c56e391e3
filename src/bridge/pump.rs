//! # Host-thread pump: drain the queue on the coordinating thread.
//!
//! [`Bridge::pump`] is the hook the host calls on the one thread authorized
//! to touch its state — from a periodic timer, an idle callback, or an
//! explicit drain. It is a plain synchronous function: no runtime is needed
//! on the calling side, and it returns promptly relative to
//! [`Config::batch_size`](crate::Config::batch_size).
//!
//! ## Per tick
//! ```text
//! loop (≤ batch_size):
//!   ├─► pop id from queue
//!   ├─► resolve handler
//!   │     └─ unknown ──► Failed (never enters Processing), signal waiter
//!   ├─► Pending → Processing, started_at, TaskStarted
//!   ├─► executor: invoke, isolate panic, measure wall time
//!   ├─► write result|error + completed_at, → Completed|Failed
//!   └─► signal waiter, publish TaskCompleted|TaskFailed
//! retention sweep piggybacks on the tick
//! ```
//!
//! ## Rules
//! - The pump thread blocks on the handler; that is acceptable because it
//!   **is** the host thread and nothing else may run on it anyway.
//! - A failing handler terminates only its task; the loop keeps draining.
//! - Waiters are signalled per task, not per batch.
//! - A concurrent second `pump()` call executes nothing: the re-entrancy
//!   guard refuses rather than run handlers on two threads.

use std::sync::atomic::{AtomicBool, Ordering};

use super::core::Bridge;
use super::exec;
use crate::events::{Event, EventKind};
use crate::tasks::TaskId;

/// What one pump invocation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Tasks driven to a terminal state this tick.
    pub executed: usize,
    /// Queue depth after the tick.
    pub remaining: usize,
}

/// Clears the re-entrancy flag even if a registry write panics mid-tick.
struct PumpGuard<'a>(&'a AtomicBool);

impl Drop for PumpGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Bridge {
    /// Drains up to [`Config::batch_size`](crate::Config::batch_size) tasks,
    /// then runs the retention sweep.
    ///
    /// Call this from the host's coordinating thread only.
    pub fn pump(&self) -> PumpReport {
        if self.pumping.swap(true, Ordering::Acquire) {
            // Another invocation is in flight; executing here would break
            // the single-thread invariant.
            return PumpReport {
                executed: 0,
                remaining: self.queue.depth(),
            };
        }
        let _guard = PumpGuard(&self.pumping);

        let mut executed = 0;
        for _ in 0..self.cfg.batch_clamped() {
            let Some(id) = self.queue.pop() else { break };
            self.run_task(id);
            executed += 1;
        }

        self.sweep();

        PumpReport {
            executed,
            remaining: self.queue.depth(),
        }
    }

    /// Drives one task from `Pending` to a terminal state.
    fn run_task(&self, id: TaskId) {
        let Some(command) = self.registry.command_of(id) else {
            // Queued id without a record; nothing to execute.
            return;
        };

        // Deferred resolution happens here, before Processing.
        let Some(handler) = self.handlers.resolve(&command) else {
            let failure = exec::unresolved(&command);
            let reason = failure.kind.clone();
            self.registry.finish(id, Err(failure), None);
            self.bus.publish(
                Event::now(EventKind::TaskFailed)
                    .with_task(id)
                    .with_command(command)
                    .with_reason(reason),
            );
            return;
        };

        let Some(info) = self.registry.begin(id) else {
            return;
        };
        self.set_current(Some(id));
        self.bus.publish(
            Event::now(EventKind::TaskStarted)
                .with_task(id)
                .with_command(command.clone()),
        );

        let outcome = exec::run(handler.as_ref(), info.params);
        let failure_kind = outcome.output.as_ref().err().map(|f| f.kind.clone());
        self.registry
            .finish(id, outcome.output, Some(outcome.elapsed));
        self.set_current(None);

        let event = match failure_kind {
            None => Event::now(EventKind::TaskCompleted),
            Some(kind) => Event::now(EventKind::TaskFailed).with_reason(kind),
        };
        self.bus.publish(
            event
                .with_task(id)
                .with_command(command)
                .with_elapsed(outcome.elapsed),
        );
    }
}
