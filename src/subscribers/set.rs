//! # Non-blocking event fan-out to multiple subscribers.
//!
//! [`SubscriberSet`] distributes events to every subscriber concurrently
//! without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` uses `try_send` and returns immediately.
//! - **Overflow**: the event is dropped for that subscriber only and a
//!   `SubscriberOverflow` is published (overflow events themselves are never
//!   re-reported, which would loop).
//! - **Isolation**: a slow or panicking subscriber does not affect others.
//! - **Per-subscriber FIFO**; no cross-subscriber ordering.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

/// Per-subscriber channel metadata.
struct Channel {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator: one bounded queue and one worker per subscriber.
pub struct SubscriberSet {
    channels: Vec<Channel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker task per subscriber.
    ///
    /// Must be called inside a tokio runtime (workers are spawned here).
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(Self::spawn_worker(sub, rx, bus.clone()));
            channels.push(Channel { name, tx });
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Emits an event to all subscribers without blocking.
    ///
    /// On a full or closed queue the event is dropped for that subscriber
    /// and a `SubscriberOverflow` is published in its place.
    pub fn emit(&self, event: Arc<Event>) {
        let is_overflow_evt = event.is_subscriber_overflow();

        for ch in &self.channels {
            match ch.tx.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !is_overflow_evt {
                        self.bus.publish(Event::subscriber_overflow(ch.name, "full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::subscriber_overflow(ch.name, "closed"));
                    }
                }
            }
        }
    }

    /// Gracefully shuts down all subscriber workers.
    ///
    /// 1. Drops all channel senders (workers see the channel closed).
    /// 2. Awaits all worker tasks.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// Worker loop: drain the queue, isolate panics per event.
    fn spawn_worker(
        sub: Arc<dyn Subscribe>,
        mut rx: mpsc::Receiver<Arc<Event>>,
        bus: Bus,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let fut = sub.on_event(ev.as_ref());
                if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                    bus.publish(Event::subscriber_panicked(
                        sub.name(),
                        panic_message(&panic_err),
                    ));
                }
            }
        })
    }
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
