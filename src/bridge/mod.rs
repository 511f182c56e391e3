//! The bridge context: admission gate, host-thread pump, executor, sweeper.

mod builder;
mod core;
mod exec;
mod pump;

pub use builder::BridgeBuilder;
pub use core::{Bridge, BridgeStats, WaitOutcome};
pub use pump::PumpReport;
