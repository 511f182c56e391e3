//! # hostbridge
//!
//! **Hostbridge** is a command admission and single-thread execution bridge.
//!
//! It sits between many concurrent callers and a host application whose
//! state may only be touched from one designated "coordinating" thread
//! (a DCC main loop, an embedded interpreter, a UI event loop). Callers
//! submit named commands from any thread; the bridge queues them, the host
//! drains the queue on its own thread via [`Bridge::pump`], and results
//! flow back to callers synchronously (block with deadline) or
//! asynchronously (poll by task id).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!  │   caller #1  │   │   caller #2  │   │   caller #N  │
//!  │ submit(sync) │   │ submit(async)│   │  status(id)  │
//!  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!         ▼                  ▼                  ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Bridge                                                      │
//! │  - admission gate (validate, sequence, bound)                │
//! │  - TaskQueue (bounded FIFO of admitted ids)                  │
//! │  - TaskRegistry (id → record + result waiter)                │
//! │  - HandlerRegistry (command name → Handler)                  │
//! │  - Bus (broadcast events) + SubscriberSet (fan-out)          │
//! └──────────────────────────┬───────────────────────────────────┘
//!                            │ pump()            host's one thread
//!                            ▼
//!               ┌────────────────────────┐
//!               │  executor              │
//!               │  resolve → invoke      │
//!               │  isolate panics, time  │
//!               └───────────┬────────────┘
//!                           ▼
//!               terminal write + waiter signal
//!                           │
//!                           ▼
//!               retention sweeper (cap / age)
//! ```
//!
//! ### Task lifecycle
//! ```text
//! submit ──► admission gate
//!   ├─ closed / empty / full / (precheck: unknown) ──► rejected, no task
//!   └─ admitted: record(Pending, seq) + queue push ──► TaskAdmitted
//!
//! pump (host thread, per tick, ≤ batch_size):
//!   ├─► pop id
//!   ├─► resolve handler
//!   │     └─ unknown ──► Failed (never enters Processing)
//!   ├─► Pending → Processing ──► TaskStarted
//!   ├─► invoke handler (panic-isolated, timed)
//!   └─► Completed | Failed, signal waiters ──► TaskCompleted | TaskFailed
//!
//! retention sweep (piggybacked on the tick):
//!   └─► evict terminal records past the age window / count cap
//! ```
//!
//! ## Features
//! | Area              | Description                                                         | Key types / traits                     |
//! |-------------------|---------------------------------------------------------------------|----------------------------------------|
//! | **Submission**    | Admit commands sync (deadline) or async (poll by id).               | [`Bridge`], [`SubmitRequest`], [`Mode`]|
//! | **Handlers**      | Register named command handlers, as closures or trait objects.      | [`Handler`], [`HandlerFn`]             |
//! | **Host pump**     | Drain and execute on the host's coordinating thread.                | [`Bridge::pump`], [`PumpReport`]       |
//! | **Tracking**      | Query task status, results, and aggregate statistics.               | [`TaskSnapshot`], [`BridgeStats`]      |
//! | **Events**        | Observe admissions, execution, and eviction.                        | [`Subscribe`], [`Event`], [`EventKind`]|
//! | **Errors**        | Typed errors for admission, queries, registration, and handlers.    | [`AdmitError`], [`HandlerError`]       |
//! | **Configuration** | Centralize queue, batch, and retention settings.                    | [`Config`]                             |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use hostbridge::{Bridge, Config, HandlerError};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = Bridge::builder(Config::default()).build();
//!
//!     // Host side: register what the host can do.
//!     bridge.register_fn("add_cube", |params| {
//!         let size = params.get("size").and_then(|v| v.as_f64()).unwrap_or(1.0);
//!         Ok::<_, HandlerError>(json!({ "created": "Cube", "size": size }))
//!     })?;
//!
//!     // Caller side: admit asynchronously, poll by id.
//!     let id = bridge.submit("add_cube", json!({ "size": 2.0 }), json!(null))?;
//!
//!     // Host side: the coordinating thread drains the queue on its tick.
//!     let report = bridge.pump();
//!     assert_eq!(report.executed, 1);
//!
//!     let snap = bridge.status(id)?;
//!     assert_eq!(snap.result.unwrap()["created"], "Cube");
//!     Ok(())
//! }
//! ```
mod bridge;
mod config;
mod error;
mod events;
mod handlers;
mod queue;
mod registry;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use bridge::{Bridge, BridgeBuilder, BridgeStats, PumpReport, WaitOutcome};
pub use config::Config;
pub use error::{AdmitError, HandlerError, QueryError, RegisterError};
pub use events::{Event, EventKind};
pub use handlers::{Handler, HandlerFn, HandlerRef, HandlerRegistry};
pub use registry::StatusCounts;
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{FailureInfo, Mode, SubmitReply, SubmitRequest, TaskId, TaskSnapshot, TaskStatus};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
