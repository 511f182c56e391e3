//! # Builder for assembling a [`Bridge`].
//!
//! Wires configuration and subscribers into a ready bridge:
//! ```text
//! BridgeBuilder::new(cfg)
//!     .with_subscriber(...)      // optional, repeatable
//!     .build()                   // Bus + listener + Bridge
//! ```
//!
//! With at least one subscriber, `build()` spawns the event listener task
//! and must run inside a tokio runtime. With none, no task is spawned and
//! the bridge can be built and pumped without a runtime; only the waiting
//! APIs need one.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::events::Bus;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::core::Bridge;

/// Assembles a [`Bridge`] from configuration and subscribers.
pub struct BridgeBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl BridgeBuilder {
    /// Starts a builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the subscriber list.
    #[must_use]
    pub fn with_subscribers(mut self, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subs;
        self
    }

    /// Appends one subscriber.
    #[must_use]
    pub fn with_subscriber(mut self, sub: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(sub);
        self
    }

    /// Builds the bridge and, when subscribers are present, spawns the
    /// event listener that forwards bus events into the fan-out set.
    ///
    /// The listener exits on [`Bridge::shutdown`] and then drains the
    /// subscriber workers gracefully.
    pub fn build(self) -> Arc<Bridge> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let closed = CancellationToken::new();
        let bridge = Arc::new(Bridge::new_internal(
            self.cfg,
            bus.clone(),
            closed.clone(),
        ));

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            let mut rx = bus.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = closed.cancelled() => break,
                        msg = rx.recv() => match msg {
                            Ok(ev) => set.emit(Arc::new(ev)),
                            Err(RecvError::Lagged(_)) => continue,
                            Err(RecvError::Closed) => break,
                        }
                    }
                }
                set.shutdown().await;
            });
        }

        bridge
    }
}
