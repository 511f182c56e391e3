//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//!
//! ## Output format
//! ```text
//! [admitted] task=5b2f... command=add_cube depth=1
//! [started] task=5b2f... command=add_cube
//! [completed] task=5b2f... command=add_cube elapsed=12ms
//! [failed] task=9a01... command=boom reason="handler_error"
//! [evicted] task=5b2f...
//! [rejected] command=add_cube reason="queue_full"
//! [shutdown-requested]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Intended for development and demos —
/// implement a custom [`Subscribe`] for structured logging or metrics.
#[derive(Debug, Default)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TaskAdmitted => {
                println!(
                    "[admitted] task={:?} command={:?} depth={:?}",
                    e.task, e.command, e.depth
                );
            }
            EventKind::SubmitRejected => {
                println!("[rejected] command={:?} reason={:?}", e.command, e.reason);
            }
            EventKind::TaskStarted => {
                println!("[started] task={:?} command={:?}", e.task, e.command);
            }
            EventKind::TaskCompleted => {
                println!(
                    "[completed] task={:?} command={:?} elapsed={:?}ms",
                    e.task, e.command, e.elapsed_ms
                );
            }
            EventKind::TaskFailed => {
                println!(
                    "[failed] task={:?} command={:?} reason={:?}",
                    e.task, e.command, e.reason
                );
            }
            EventKind::TaskEvicted => {
                println!("[evicted] task={:?}", e.task);
            }
            EventKind::HandlerRegistered => {
                println!("[handler-registered] command={:?}", e.command);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panicked] reason={:?}", e.reason);
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] reason={:?}", e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
