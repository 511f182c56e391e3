//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (the admission gate,
//! the pump, the sweeper, the subscriber fan-out).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                  Subscriber (one):
//!   gate   ──┐
//!   pump   ──┼──────► Bus ──────► event listener ────► SubscriberSet
//!   sweeper ──┘  (broadcast chan)   (in Bridge)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and is safe to call
//!   from the host thread (no runtime needed on the publishing side).
//! - **Bounded capacity**: a single ring buffer stores recent events.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip
//!   the `n` oldest items.
//! - **No persistence**: events are dropped if no subscriber is attached.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender); multiple
/// publishers may publish concurrently.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (min 1, clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active subscribers.
    ///
    /// If there are no receivers the event is dropped; the call still
    /// returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes subsequent events.
    ///
    /// Each call creates an independent receiver; it only sees events sent
    /// after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
