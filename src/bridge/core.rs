//! # Bridge: the one context object tying admission, queue, registry, and pump.
//!
//! A [`Bridge`] is constructed once at startup via [`Bridge::builder`] and
//! shared by reference with every collaborator — there are no hidden
//! module-level singletons. Caller threads submit through it; the host
//! calls [`Bridge::pump`](crate::Bridge::pump) on its own coordinating
//! thread.
//!
//! ## High-level architecture
//! ```text
//! callers (N threads / tasks)                    host (1 thread)
//!   submit / submit_wait / handle                  pump()
//!        │                                           │
//!        ▼                                           ▼
//!   ┌─ admission gate ─┐        pop          ┌─ executor ─────────┐
//!   │ validate, seq    ├──► TaskQueue ──────►│ resolve → invoke   │
//!   │ insert record    │    (bounded FIFO)   │ isolate, time      │
//!   └───────┬──────────┘                     └─────────┬──────────┘
//!           ▼                                          ▼
//!       TaskRegistry ◄─── terminal write + waiter signal
//!           │
//!           ├──► status / tasks / stats (any thread)
//!           └──► retention sweep (piggybacked on pump)
//!
//! every step ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - Caller threads may suspend only on their own task's waiter, never on
//!   the queue or registry lock beyond a structural mutation.
//! - The host thread never suspends on network I/O or caller signals; it
//!   only executes handlers and writes results back.
//! - Tasks execute strictly in admission sequence order.
//! - A sync caller's deadline expiring changes only what that caller
//!   observes; the task still runs to completion and stays queryable.

use std::borrow::Cow;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{AdmitError, HandlerError, QueryError, RegisterError};
use crate::events::{Bus, Event, EventKind};
use crate::handlers::{HandlerFn, HandlerRef, HandlerRegistry};
use crate::queue::TaskQueue;
use crate::registry::TaskRegistry;
use crate::tasks::{Mode, SubmitReply, SubmitRequest, TaskId, TaskRecord, TaskSnapshot};

use super::builder::BridgeBuilder;

/// What a synchronous caller observes at its deadline.
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// Terminal snapshot (`Completed` or `Failed`).
    Done(TaskSnapshot),
    /// The deadline elapsed first. The task keeps executing and stays
    /// queryable under `id`; a later poll shows the true terminal state.
    TimedOut {
        /// Id to poll for the eventual terminal state.
        id: TaskId,
    },
}

/// Aggregate bridge statistics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BridgeStats {
    /// Tasks admitted, waiting in the queue.
    pub pending: usize,
    /// Tasks executing on the host thread (0 or 1).
    pub processing: usize,
    /// Tasks finished successfully and still retained.
    pub completed: usize,
    /// Tasks finished with an error and still retained.
    pub failed: usize,
    /// Current queue depth.
    pub queue_depth: usize,
    /// Records currently retained in the registry.
    pub registry_size: usize,
    /// The task currently executing, if any.
    pub current: Option<TaskId>,
}

/// Command admission, queueing, and execution bridge.
///
/// See the [module docs](self) for the architecture. Construct via
/// [`Bridge::builder`].
pub struct Bridge {
    pub(super) cfg: Config,
    pub(super) handlers: HandlerRegistry,
    pub(super) queue: TaskQueue,
    pub(super) registry: TaskRegistry,
    pub(super) bus: Bus,
    /// Serializes admissions and owns the sequence counter, so queue order
    /// and sequence order are identical.
    pub(super) gate: Mutex<u64>,
    /// Re-entrancy guard for `pump()`.
    pub(super) pumping: AtomicBool,
    /// Task currently executing on the host thread.
    pub(super) current: Mutex<Option<TaskId>>,
    /// Cancelled on shutdown; admissions are rejected afterwards.
    pub(super) closed: CancellationToken,
}

impl Bridge {
    /// Starts building a bridge with the given configuration.
    pub fn builder(cfg: Config) -> BridgeBuilder {
        BridgeBuilder::new(cfg)
    }

    pub(super) fn new_internal(cfg: Config, bus: Bus, closed: CancellationToken) -> Self {
        let queue = TaskQueue::new(cfg.queue_capacity);
        Self {
            cfg,
            handlers: HandlerRegistry::new(),
            queue,
            registry: TaskRegistry::new(),
            bus,
            gate: Mutex::new(0),
            pumping: AtomicBool::new(false),
            current: Mutex::new(None),
            closed,
        }
    }

    // ---------------------------
    // Handler registration
    // ---------------------------

    /// Registers a handler under its own name.
    ///
    /// Append-only: re-registering an existing name fails with
    /// [`RegisterError::AlreadyRegistered`] and the original handler stays.
    /// Registration stays open after startup, so queued tasks referencing a
    /// not-yet-registered command can still resolve by the time the pump
    /// reaches them.
    pub fn register(&self, handler: HandlerRef) -> Result<(), RegisterError> {
        let name = handler.name().to_string();
        self.handlers.register(handler)?;
        self.bus
            .publish(Event::now(EventKind::HandlerRegistered).with_command(name));
        Ok(())
    }

    /// Registers a closure as a handler. Shorthand for
    /// [`register`](Self::register) with a [`HandlerFn`].
    pub fn register_fn<F>(
        &self,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<(), RegisterError>
    where
        F: Fn(Value) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.register(HandlerFn::arc(name, f))
    }

    /// Returns the sorted list of registered command names.
    pub fn commands(&self) -> Vec<String> {
        self.handlers.names()
    }

    // ---------------------------
    // Admission
    // ---------------------------

    /// Submits a command in async mode: returns the task id immediately;
    /// the caller polls via [`status`](Self::status) or waits via
    /// [`wait`](Self::wait).
    ///
    /// Never blocks beyond a structural queue/registry mutation.
    pub fn submit(
        &self,
        command: impl Into<String>,
        params: Value,
        metadata: Value,
    ) -> Result<TaskId, AdmitError> {
        self.admit(command.into(), params, metadata)
    }

    /// Submits a command in sync mode: blocks the caller until the task is
    /// terminal or `timeout` elapses. On timeout the task keeps executing.
    pub async fn submit_wait(
        &self,
        command: impl Into<String>,
        params: Value,
        metadata: Value,
        timeout: Duration,
    ) -> Result<WaitOutcome, AdmitError> {
        let id = self.admit(command.into(), params, metadata)?;
        match self.wait(id, timeout).await {
            Ok(outcome) => Ok(outcome),
            // The record was evicted between completion and the read; the
            // result is no longer retrievable, which is what a deadline
            // expiry also means for this caller.
            Err(QueryError::NotFound { id }) => Ok(WaitOutcome::TimedOut { id }),
        }
    }

    /// Wire-level entry point: maps a [`SubmitRequest`]'s `mode` field onto
    /// [`submit`](Self::submit) / [`submit_wait`](Self::submit_wait).
    pub async fn handle(&self, req: SubmitRequest) -> Result<SubmitReply, AdmitError> {
        match req.mode {
            Mode::Async => {
                let task_id = self.submit(req.command, req.params, req.metadata)?;
                Ok(SubmitReply::Queued { task_id })
            }
            Mode::Sync => {
                let timeout = req.timeout();
                match self
                    .submit_wait(req.command, req.params, req.metadata, timeout)
                    .await?
                {
                    WaitOutcome::Done(task) => Ok(SubmitReply::Done { task }),
                    WaitOutcome::TimedOut { id } => Ok(SubmitReply::TimedOut { task_id: id }),
                }
            }
        }
    }

    fn admit(&self, command: String, params: Value, metadata: Value) -> Result<TaskId, AdmitError> {
        if self.closed.is_cancelled() {
            return Err(self.reject(AdmitError::Closed, &command));
        }
        if command.is_empty() {
            return Err(self.reject(AdmitError::EmptyCommand, &command));
        }
        if self.cfg.precheck_commands && !self.handlers.contains(&command) {
            let err = AdmitError::UnknownCommand {
                command: command.clone(),
            };
            return Err(self.reject(err, &command));
        }

        let mut next_seq = self.gate_lock();
        if self.queue.is_full() {
            drop(next_seq);
            let err = AdmitError::QueueFull {
                capacity: self.queue.capacity(),
            };
            return Err(self.reject(err, &command));
        }
        *next_seq += 1;
        let seq = *next_seq;
        let id = TaskId::generate();
        self.registry.insert(TaskRecord::admitted(
            id,
            command.clone(),
            params,
            metadata,
            seq,
        ));
        // Cannot fail: capacity was checked under the gate and only
        // admissions push.
        let _ = self.queue.push(id);
        let depth = self.queue.depth();
        drop(next_seq);

        self.bus.publish(
            Event::now(EventKind::TaskAdmitted)
                .with_task(id)
                .with_command(command)
                .with_depth(depth),
        );
        Ok(id)
    }

    fn reject(&self, err: AdmitError, command: &str) -> AdmitError {
        self.bus.publish(
            Event::now(EventKind::SubmitRejected)
                .with_command(command.to_string())
                .with_reason(err.as_label()),
        );
        err
    }

    // ---------------------------
    // Result delivery
    // ---------------------------

    /// Waits for a task to reach a terminal state, up to `timeout`.
    ///
    /// Every waiter on the same task is released by the single completion
    /// signal. Waiting never busy-polls and never touches the host thread.
    pub async fn wait(&self, id: TaskId, timeout: Duration) -> Result<WaitOutcome, QueryError> {
        let Some(mut rx) = self.registry.watch(id) else {
            return Err(QueryError::NotFound { id });
        };

        let waited = tokio::time::timeout(timeout, async {
            loop {
                if *rx.borrow_and_update() {
                    return true;
                }
                if rx.changed().await.is_err() {
                    // Sender gone: the record was removed.
                    return *rx.borrow();
                }
            }
        })
        .await;

        match waited {
            Ok(true) => self
                .registry
                .snapshot(id)
                .map(WaitOutcome::Done)
                .ok_or(QueryError::NotFound { id }),
            Ok(false) => Err(QueryError::NotFound { id }),
            Err(_elapsed) => Ok(WaitOutcome::TimedOut { id }),
        }
    }

    /// Returns the current view of a task.
    pub fn status(&self, id: TaskId) -> Result<TaskSnapshot, QueryError> {
        self.registry
            .snapshot(id)
            .ok_or(QueryError::NotFound { id })
    }

    /// Returns snapshots of all retained tasks, newest admission first.
    pub fn tasks(&self) -> Vec<TaskSnapshot> {
        self.registry.snapshots()
    }

    /// Aggregate counts, queue depth, and the currently executing task.
    pub fn stats(&self) -> BridgeStats {
        let c = self.registry.counts();
        BridgeStats {
            pending: c.pending,
            processing: c.processing,
            completed: c.completed,
            failed: c.failed,
            queue_depth: self.queue.depth(),
            registry_size: self.registry.len(),
            current: *self.current_lock(),
        }
    }

    /// Subscribes to the raw event stream.
    ///
    /// For buffered, panic-isolated delivery prefer registering a
    /// [`Subscribe`](crate::Subscribe) via the builder.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    // ---------------------------
    // Retention & shutdown
    // ---------------------------

    /// Runs a retention sweep and returns the number of evicted tasks.
    ///
    /// Also piggybacked on every [`pump`](Self::pump) tick. Eviction bounds
    /// memory only; it has no effect on already-returned results.
    pub fn sweep(&self) -> usize {
        let evicted = self
            .registry
            .sweep(self.cfg.retention_cap_opt(), self.cfg.retention_age_opt());
        for id in &evicted {
            self.bus
                .publish(Event::now(EventKind::TaskEvicted).with_task(*id));
        }
        evicted.len()
    }

    /// Shuts the bridge down: further admissions fail with
    /// [`AdmitError::Closed`]. Already-admitted tasks remain drainable by
    /// the pump and queryable until swept.
    pub fn shutdown(&self) {
        if !self.closed.is_cancelled() {
            self.bus.publish(Event::now(EventKind::ShutdownRequested));
            self.closed.cancel();
        }
    }

    /// Returns true once [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    pub(super) fn set_current(&self, id: Option<TaskId>) {
        *self.current_lock() = id;
    }

    fn current_lock(&self) -> std::sync::MutexGuard<'_, Option<TaskId>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn gate_lock(&self) -> std::sync::MutexGuard<'_, u64> {
        self.gate.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use serde_json::json;

    use super::*;
    use crate::tasks::TaskStatus;

    fn echo_bridge(cfg: Config) -> Arc<Bridge> {
        let bridge = Bridge::builder(cfg).build();
        bridge.register_fn("echo", Ok).expect("register echo");
        bridge
    }

    #[test]
    fn test_async_submit_then_pump() {
        let bridge = echo_bridge(Config::default());
        let id = bridge
            .submit("echo", json!({"x": 1}), Value::Null)
            .unwrap();

        let snap = bridge.status(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Pending);
        assert!(snap.started_at_ms.is_none());

        let report = bridge.pump();
        assert_eq!(report.executed, 1);
        assert_eq!(report.remaining, 0);

        let snap = bridge.status(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Completed);
        assert_eq!(snap.result, Some(json!({"x": 1})));
        assert!(snap.started_at_ms.is_some());
        assert!(snap.completed_at_ms.is_some());
        assert!(snap.elapsed_ms.is_some());
    }

    #[test]
    fn test_queue_full_rejects_fast() {
        let bridge = echo_bridge(Config::default());
        for i in 0..100 {
            bridge.submit("echo", json!(i), Value::Null).unwrap();
        }

        let err = bridge.submit("echo", json!(100), Value::Null).unwrap_err();
        assert!(matches!(err, AdmitError::QueueFull { capacity: 100 }));

        // The rejected submission left no trace.
        let stats = bridge.stats();
        assert_eq!(stats.queue_depth, 100);
        assert_eq!(stats.registry_size, 100);
    }

    #[test]
    fn test_fifo_execution_order() {
        let cfg = Config {
            batch_size: 16,
            ..Config::default()
        };
        let bridge = Bridge::builder(cfg).build();

        let order = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&order);
        bridge
            .register_fn("mark", move |p: Value| {
                seen.lock().unwrap().push(p.as_i64().unwrap());
                Ok(Value::Null)
            })
            .unwrap();

        for n in 0..5 {
            bridge.submit("mark", json!(n), Value::Null).unwrap();
        }
        let report = bridge.pump();
        assert_eq!(report.executed, 5);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_command_fails_without_processing() {
        let bridge = echo_bridge(Config::default());
        let id = bridge
            .submit("does_not_exist", Value::Null, Value::Null)
            .unwrap();
        assert_eq!(bridge.pump().executed, 1);

        let snap = bridge.status(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Failed);
        assert_eq!(snap.error.as_ref().unwrap().kind, "unknown_command");
        // Never entered Processing.
        assert!(snap.started_at_ms.is_none());
    }

    #[test]
    fn test_late_registration_resolves_queued_task() {
        let bridge = Bridge::builder(Config::default()).build();
        let id = bridge.submit("later", json!(7), Value::Null).unwrap();

        // Handler arrives after admission but before the pump drains.
        bridge.register_fn("later", Ok).unwrap();
        bridge.pump();

        assert_eq!(bridge.status(id).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_precheck_rejects_unknown() {
        let cfg = Config {
            precheck_commands: true,
            ..Config::default()
        };
        let bridge = echo_bridge(cfg);

        let err = bridge.submit("nope", Value::Null, Value::Null).unwrap_err();
        assert!(matches!(err, AdmitError::UnknownCommand { .. }));
        assert_eq!(bridge.stats().registry_size, 0);

        // Known commands still pass the pre-check.
        assert!(bridge.submit("echo", Value::Null, Value::Null).is_ok());
    }

    #[test]
    fn test_empty_command_rejected() {
        let bridge = echo_bridge(Config::default());
        let err = bridge.submit("", Value::Null, Value::Null).unwrap_err();
        assert!(matches!(err, AdmitError::EmptyCommand));
    }

    #[test]
    fn test_shutdown_rejects_new_keeps_old() {
        let bridge = echo_bridge(Config::default());
        let id = bridge.submit("echo", json!(1), Value::Null).unwrap();

        bridge.shutdown();
        assert!(bridge.is_closed());
        let err = bridge.submit("echo", json!(2), Value::Null).unwrap_err();
        assert!(matches!(err, AdmitError::Closed));

        // Already-admitted work still drains.
        bridge.pump();
        assert_eq!(bridge.status(id).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_handler_panic_isolated_from_pump() {
        let bridge = echo_bridge(Config::default());
        bridge
            .register_fn("boom", |_p: Value| -> Result<Value, HandlerError> {
                panic!("host state corrupted")
            })
            .unwrap();

        let bad = bridge.submit("boom", Value::Null, Value::Null).unwrap();
        let good = bridge.submit("echo", json!("ok"), Value::Null).unwrap();

        bridge.pump();
        bridge.pump();

        let snap = bridge.status(bad).unwrap();
        assert_eq!(snap.status, TaskStatus::Failed);
        assert_eq!(snap.error.as_ref().unwrap().kind, "handler_panic");

        assert_eq!(bridge.status(good).unwrap().status, TaskStatus::Completed);
    }

    #[test]
    fn test_handler_error_kind_recorded() {
        let bridge = Bridge::builder(Config::default()).build();
        bridge
            .register_fn("locked", |_p: Value| {
                Err::<Value, _>(HandlerError::new("scene_locked", "scene is read-only"))
            })
            .unwrap();

        let id = bridge.submit("locked", Value::Null, Value::Null).unwrap();
        bridge.pump();

        let err = bridge.status(id).unwrap().error.unwrap();
        assert_eq!(err.kind, "scene_locked");
        assert_eq!(err.message, "scene is read-only");
    }

    #[test]
    fn test_handler_rejects_bad_params() {
        let bridge = Bridge::builder(Config::default()).build();
        bridge
            .register_fn("resize", |p: Value| {
                p.get("size")
                    .and_then(Value::as_f64)
                    .map(|size| json!({ "size": size }))
                    .ok_or_else(|| HandlerError::invalid_params("missing field 'size'"))
            })
            .unwrap();

        let id = bridge.submit("resize", json!({}), Value::Null).unwrap();
        bridge.pump();

        let err = bridge.status(id).unwrap().error.unwrap();
        assert_eq!(err.kind, "invalid_params");
        assert_eq!(err.message, "missing field 'size'");
    }

    #[test]
    fn test_retention_cap_evicts_oldest() {
        let cfg = Config {
            retention_cap: 2,
            retention_age: Duration::ZERO,
            ..Config::default()
        };
        let bridge = echo_bridge(cfg);

        let a = bridge.submit("echo", json!("a"), Value::Null).unwrap();
        let b = bridge.submit("echo", json!("b"), Value::Null).unwrap();
        let c = bridge.submit("echo", json!("c"), Value::Null).unwrap();
        for _ in 0..3 {
            bridge.pump();
        }

        assert!(matches!(
            bridge.status(a),
            Err(QueryError::NotFound { .. })
        ));
        assert!(bridge.status(b).is_ok());
        assert!(bridge.status(c).is_ok());
    }

    #[test]
    fn test_sweep_noop_when_nothing_terminal() {
        let cfg = Config {
            retention_cap: 1,
            ..Config::default()
        };
        let bridge = echo_bridge(cfg);
        bridge.submit("echo", Value::Null, Value::Null).unwrap();
        assert_eq!(bridge.sweep(), 0);
        assert_eq!(bridge.stats().registry_size, 1);
    }

    #[test]
    fn test_concurrent_pump_refused() {
        let bridge = Bridge::builder(Config::default()).build();
        bridge
            .register_fn("slow", |p: Value| {
                thread::sleep(Duration::from_millis(150));
                Ok(p)
            })
            .unwrap();
        bridge.submit("slow", Value::Null, Value::Null).unwrap();

        let other = Arc::clone(&bridge);
        let first = thread::spawn(move || other.pump());
        thread::sleep(Duration::from_millis(30));

        // Second pump while the first is mid-handler executes nothing.
        assert_eq!(bridge.pump().executed, 0);
        assert_eq!(first.join().unwrap().executed, 1);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let bridge = echo_bridge(Config::default());
        let err = bridge.register_fn("echo", Ok).unwrap_err();
        assert!(matches!(err, RegisterError::AlreadyRegistered { .. }));
        assert_eq!(bridge.commands(), vec!["echo".to_string()]);
    }

    #[test]
    fn test_events_trace_lifecycle() {
        let bridge = Bridge::builder(Config::default()).build();
        let mut rx = bridge.events();

        bridge.register_fn("echo", Ok).unwrap();
        bridge.submit("echo", Value::Null, Value::Null).unwrap();
        bridge.pump();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::HandlerRegistered,
                EventKind::TaskAdmitted,
                EventKind::TaskStarted,
                EventKind::TaskCompleted,
            ]
        );
    }

    #[test]
    fn test_stats_after_mixed_outcomes() {
        let bridge = echo_bridge(Config::default());
        bridge.submit("echo", Value::Null, Value::Null).unwrap();
        bridge.submit("missing", Value::Null, Value::Null).unwrap();
        bridge.submit("echo", Value::Null, Value::Null).unwrap();
        bridge.pump();
        bridge.pump();

        let stats = bridge.stats();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.processing, 0);
        assert_eq!(stats.queue_depth, 1);
        assert!(stats.current.is_none());
    }

    #[tokio::test]
    async fn test_sync_wait_returns_result() {
        let bridge = echo_bridge(Config::default());

        let pumper = Arc::clone(&bridge);
        let host = thread::spawn(move || loop {
            if pumper.pump().executed > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        });

        let outcome = bridge
            .submit_wait("echo", json!({"k": "v"}), Value::Null, Duration::from_secs(5))
            .await
            .unwrap();
        host.join().unwrap();

        match outcome {
            WaitOutcome::Done(snap) => {
                assert_eq!(snap.status, TaskStatus::Completed);
                assert_eq!(snap.result, Some(json!({"k": "v"})));
            }
            WaitOutcome::TimedOut { .. } => panic!("expected completion"),
        }
    }

    #[tokio::test]
    async fn test_sync_timeout_then_task_completes() {
        let bridge = Bridge::builder(Config::default()).build();
        bridge
            .register_fn("slow", |p: Value| {
                thread::sleep(Duration::from_millis(200));
                Ok(p)
            })
            .unwrap();

        let pumper = Arc::clone(&bridge);
        let host = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            pumper.pump()
        });

        let outcome = bridge
            .submit_wait("slow", json!(1), Value::Null, Duration::from_millis(80))
            .await
            .unwrap();
        let id = match outcome {
            WaitOutcome::TimedOut { id } => id,
            WaitOutcome::Done(_) => panic!("deadline should elapse first"),
        };

        // The task was unaffected by the caller's deadline.
        host.join().unwrap();
        let snap = bridge.status(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Completed);
        assert_eq!(snap.result, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_all_waiters_released_by_one_completion() {
        let bridge = echo_bridge(Config::default());
        let id = bridge.submit("echo", json!("shared"), Value::Null).unwrap();

        let pumper = Arc::clone(&bridge);
        let host = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            pumper.pump();
        });

        let timeout = Duration::from_secs(5);
        let (a, b) = tokio::join!(bridge.wait(id, timeout), bridge.wait(id, timeout));
        host.join().unwrap();

        for outcome in [a.unwrap(), b.unwrap()] {
            match outcome {
                WaitOutcome::Done(snap) => assert_eq!(snap.result, Some(json!("shared"))),
                WaitOutcome::TimedOut { .. } => panic!("waiter not released"),
            }
        }
    }

    #[tokio::test]
    async fn test_wait_unknown_id() {
        let bridge = echo_bridge(Config::default());
        let err = bridge
            .wait(TaskId::generate(), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_handle_async_mode() {
        let bridge = echo_bridge(Config::default());
        let req: SubmitRequest =
            serde_json::from_value(json!({"command": "echo", "params": {"x": 1}})).unwrap();

        let reply = bridge.handle(req).await.unwrap();
        let SubmitReply::Queued { task_id } = reply else {
            panic!("async mode queues");
        };

        let wire = serde_json::to_value(SubmitReply::Queued { task_id }).unwrap();
        assert_eq!(wire["status"], "queued");
        assert_eq!(bridge.status(task_id).unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_handle_sync_mode() {
        let bridge = echo_bridge(Config::default());

        let pumper = Arc::clone(&bridge);
        let host = thread::spawn(move || loop {
            if pumper.pump().executed > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        });

        let req: SubmitRequest = serde_json::from_value(json!({
            "command": "echo",
            "params": {"x": 2},
            "mode": "sync",
            "timeout_ms": 5000,
        }))
        .unwrap();
        let reply = bridge.handle(req).await.unwrap();
        host.join().unwrap();

        let SubmitReply::Done { task } = reply else {
            panic!("sync mode returns the terminal snapshot");
        };
        assert_eq!(task.result.as_ref(), Some(&json!({"x": 2})));

        // The reply tag and the snapshot's own status travel separately.
        let wire = serde_json::to_value(SubmitReply::Done { task }).unwrap();
        assert_eq!(wire["status"], "done");
        assert_eq!(wire["task"]["status"], "completed");
        assert_eq!(wire["task"]["result"], json!({"x": 2}));
    }
}
