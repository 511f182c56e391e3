//! # Global bridge configuration.
//!
//! Provides [`Config`], the centralized settings for a [`Bridge`](crate::Bridge).
//!
//! ## Sentinel values
//! - `retention_cap = 0` → no count-based eviction
//! - `retention_age = 0s` → no age-based eviction
//! - `batch_size` is clamped to a minimum of 1 by the pump

use std::time::Duration;

/// Global configuration for the bridge.
///
/// Defines:
/// - **Admission**: queue capacity, optional handler pre-check
/// - **Pump behavior**: how many tasks one tick may execute
/// - **Retention**: how long terminal tasks stay queryable
/// - **Event system**: bus capacity for event delivery
///
/// ## Field semantics
/// - `queue_capacity`: submissions beyond this are rejected with `QueueFull`
/// - `batch_size`: tasks executed per `pump()` call; keep small so the host
///   thread returns promptly (min 1, clamped)
/// - `precheck_commands`: when `true`, admission fails fast on unknown
///   commands; when `false` (default) resolution is deferred to execution,
///   so handlers may be registered after a task referencing them is queued
/// - `retention_cap`: max terminal tasks kept in the registry (`0` = no cap)
/// - `retention_age`: terminal tasks older than this are evicted (`0s` = keep)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of admitted, not-yet-started tasks.
    ///
    /// When the queue is at capacity, `submit` rejects immediately with
    /// [`AdmitError::QueueFull`](crate::AdmitError::QueueFull); no task is
    /// created.
    pub queue_capacity: usize,

    /// Maximum tasks executed per pump invocation.
    ///
    /// The pump runs on the host's own thread; a small batch keeps the host
    /// responsive between ticks. Clamped to a minimum of 1.
    pub batch_size: usize,

    /// Fail admission fast when the command has no registered handler.
    ///
    /// Off by default: the original registry may be extended after tasks
    /// referencing new commands are already queued.
    pub precheck_commands: bool,

    /// Maximum number of terminal (completed/failed) tasks retained.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = oldest terminal tasks (by admission sequence) are evicted
    ///   first once the count exceeds `n`
    pub retention_cap: usize,

    /// Maximum age of a terminal task before eviction.
    ///
    /// - `Duration::ZERO` = no age-based eviction
    /// - `> 0` = tasks whose completion is older than this are evicted
    pub retention_age: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will receive `Lagged` and skip older items. Minimum value is 1.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the pump batch size clamped to a minimum of 1.
    #[inline]
    pub fn batch_clamped(&self) -> usize {
        self.batch_size.max(1)
    }

    /// Returns the retention cap as an `Option`.
    ///
    /// - `None` → no count-based eviction
    /// - `Some(n)` → at most `n` terminal tasks retained
    #[inline]
    pub fn retention_cap_opt(&self) -> Option<usize> {
        if self.retention_cap == 0 {
            None
        } else {
            Some(self.retention_cap)
        }
    }

    /// Returns the retention age as an `Option`.
    ///
    /// - `None` → no age-based eviction
    /// - `Some(d)` → terminal tasks older than `d` are evicted
    #[inline]
    pub fn retention_age_opt(&self) -> Option<Duration> {
        if self.retention_age == Duration::ZERO {
            None
        } else {
            Some(self.retention_age)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `queue_capacity = 100`
    /// - `batch_size = 1` (one task per host tick)
    /// - `precheck_commands = false` (deferred resolution)
    /// - `retention_cap = 1024`
    /// - `retention_age = 1h`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            batch_size: 1,
            precheck_commands: false,
            retention_cap: 1024,
            retention_age: Duration::from_secs(3600),
            bus_capacity: 1024,
        }
    }
}
