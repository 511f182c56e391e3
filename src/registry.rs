//! # Task registry — single source of truth for task state.
//!
//! Maps task id → record + result waiter. Callers read snapshots; the pump
//! performs the only status mutations; the retention sweeper performs the
//! only removals.
//!
//! ## Architecture
//! ```text
//! admission ──► insert(record)            caller ──► snapshot(id)
//!                                         caller ──► watch(id) ──► await done
//! pump ──► begin(id)    Pending → Processing, takes params
//! pump ──► finish(id)   Processing → Completed|Failed, signals waiter
//! sweep ──► remove terminal records (count cap / age window)
//! ```
//!
//! ## Rules
//! - The lock is held for map and field access only, never across a handler.
//! - The waiter is signalled **after** the terminal write, never before.
//! - One `watch` channel per task; every receiver is released on signal.
//! - Eviction only touches terminal records.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::tasks::{FailureInfo, TaskId, TaskRecord, TaskSnapshot, TaskStatus};

/// Record plus its completion waiter.
struct Entry {
    record: TaskRecord,
    /// Flipped to `true` exactly once, after the terminal write.
    done: watch::Sender<bool>,
}

/// Aggregate status counts plus registry size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Admitted, waiting in the queue.
    pub pending: usize,
    /// Executing on the host thread.
    pub processing: usize,
    /// Finished successfully.
    pub completed: usize,
    /// Finished with an error.
    pub failed: usize,
}

impl StatusCounts {
    /// Total number of records.
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.failed
    }
}

/// Command name and parameters handed to the executor by [`TaskRegistry::begin`].
pub(crate) struct BeginInfo {
    pub command: String,
    pub params: Value,
}

/// Thread-safe map of task records.
#[derive(Default)]
pub(crate) struct TaskRegistry {
    inner: Mutex<HashMap<TaskId, Entry>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a freshly admitted record and creates its waiter.
    pub fn insert(&self, record: TaskRecord) {
        let (done, _rx) = watch::channel(false);
        let id = record.id;
        self.lock().insert(id, Entry { record, done });
    }

    /// Returns a fresh waiter receiver for this task.
    ///
    /// The receiver observes `true` once the task is terminal; receivers
    /// created after completion see `true` immediately.
    pub fn watch(&self, id: TaskId) -> Option<watch::Receiver<bool>> {
        self.lock().get(&id).map(|e| e.done.subscribe())
    }

    /// Returns the public view of a task.
    pub fn snapshot(&self, id: TaskId) -> Option<TaskSnapshot> {
        self.lock().get(&id).map(|e| e.record.snapshot())
    }

    /// Returns the command name a task resolves against.
    ///
    /// Used by the pump to resolve the handler before the task enters
    /// `Processing`.
    pub fn command_of(&self, id: TaskId) -> Option<String> {
        self.lock().get(&id).map(|e| e.record.command.clone())
    }

    /// Returns snapshots of all records, newest admission first.
    pub fn snapshots(&self) -> Vec<TaskSnapshot> {
        let map = self.lock();
        let mut all: Vec<TaskSnapshot> = map.values().map(|e| e.record.snapshot()).collect();
        all.sort_unstable_by(|a, b| b.seq.cmp(&a.seq));
        all
    }

    /// Number of records currently retained.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Aggregate counts by status.
    pub fn counts(&self) -> StatusCounts {
        let map = self.lock();
        let mut c = StatusCounts::default();
        for e in map.values() {
            match e.record.status {
                TaskStatus::Pending => c.pending += 1,
                TaskStatus::Processing => c.processing += 1,
                TaskStatus::Completed => c.completed += 1,
                TaskStatus::Failed => c.failed += 1,
            }
        }
        c
    }

    /// Transitions `Pending → Processing` and hands out command + params.
    ///
    /// Pump-only. Returns `None` when the record vanished or is not pending
    /// (both indicate a bug elsewhere; the pump skips such ids).
    pub fn begin(&self, id: TaskId) -> Option<BeginInfo> {
        let mut map = self.lock();
        let entry = map.get_mut(&id)?;
        if entry.record.status != TaskStatus::Pending {
            return None;
        }
        entry.record.status = TaskStatus::Processing;
        entry.record.started_at = Some(SystemTime::now());

        let params = entry.record.params.take().unwrap_or(Value::Null);
        Some(BeginInfo {
            command: entry.record.command.clone(),
            params,
        })
    }

    /// Writes the terminal state and releases every waiter.
    ///
    /// Pump-only. The `done` signal is sent after the record write while the
    /// lock is still held, so no waiter can observe a terminal signal before
    /// the registry reflects it.
    pub fn finish(
        &self,
        id: TaskId,
        output: Result<Value, FailureInfo>,
        elapsed: Option<Duration>,
    ) {
        let mut map = self.lock();
        let Some(entry) = map.get_mut(&id) else {
            return;
        };
        if entry.record.status.is_terminal() {
            return;
        }

        entry.record.completed_at = Some(SystemTime::now());
        entry.record.elapsed = elapsed;
        match output {
            Ok(result) => {
                entry.record.status = TaskStatus::Completed;
                entry.record.result = Some(result);
            }
            Err(error) => {
                entry.record.status = TaskStatus::Failed;
                entry.record.error = Some(error);
            }
        }
        let _ = entry.done.send_replace(true);
    }

    /// Evicts terminal records and returns the evicted ids.
    ///
    /// Two passes, both skipping `Pending`/`Processing` records:
    /// 1. age window — terminal records completed more than `age` ago;
    /// 2. count cap — if more than `cap` terminal records remain, the oldest
    ///    by admission sequence go first.
    pub fn sweep(&self, cap: Option<usize>, age: Option<Duration>) -> Vec<TaskId> {
        let now = SystemTime::now();
        let mut map = self.lock();
        let mut evicted = Vec::new();

        if let Some(age) = age {
            let expired: Vec<TaskId> = map
                .values()
                .filter(|e| e.record.status.is_terminal())
                .filter(|e| {
                    e.record
                        .completed_at
                        .and_then(|t| now.duration_since(t).ok())
                        .is_some_and(|elapsed| elapsed > age)
                })
                .map(|e| e.record.id)
                .collect();
            for id in expired {
                map.remove(&id);
                evicted.push(id);
            }
        }

        if let Some(cap) = cap {
            let mut terminal: Vec<(u64, TaskId)> = map
                .values()
                .filter(|e| e.record.status.is_terminal())
                .map(|e| (e.record.seq, e.record.id))
                .collect();
            if terminal.len() > cap {
                terminal.sort_unstable_by_key(|(seq, _)| *seq);
                for (_, id) in terminal.drain(..terminal.len() - cap) {
                    map.remove(&id);
                    evicted.push(id);
                }
            }
        }

        evicted
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TaskId, Entry>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn admit(reg: &TaskRegistry, seq: u64) -> TaskId {
        let id = TaskId::generate();
        reg.insert(TaskRecord::admitted(
            id,
            "echo".into(),
            json!({"n": seq}),
            Value::Null,
            seq,
        ));
        id
    }

    fn complete(reg: &TaskRegistry, id: TaskId) {
        reg.begin(id).expect("pending");
        reg.finish(id, Ok(json!("ok")), Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let reg = TaskRegistry::new();
        let id = admit(&reg, 1);
        assert_eq!(reg.snapshot(id).unwrap().status, TaskStatus::Pending);

        let info = reg.begin(id).unwrap();
        assert_eq!(info.command, "echo");
        assert_eq!(info.params, json!({"n": 1}));
        let snap = reg.snapshot(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Processing);
        assert!(snap.started_at_ms.is_some());

        reg.finish(id, Ok(json!(42)), Some(Duration::from_millis(3)));
        let snap = reg.snapshot(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Completed);
        assert_eq!(snap.result, Some(json!(42)));
        assert!(snap.error.is_none());
        assert_eq!(snap.elapsed_ms, Some(3));
    }

    #[test]
    fn test_begin_only_from_pending() {
        let reg = TaskRegistry::new();
        let id = admit(&reg, 1);
        assert!(reg.begin(id).is_some());
        // Double begin is a no-op.
        assert!(reg.begin(id).is_none());
    }

    #[test]
    fn test_finish_is_write_once() {
        let reg = TaskRegistry::new();
        let id = admit(&reg, 1);
        reg.begin(id).unwrap();
        reg.finish(id, Ok(json!("first")), None);
        reg.finish(id, Err(FailureInfo::new("late", "ignored")), None);

        let snap = reg.snapshot(id).unwrap();
        assert_eq!(snap.status, TaskStatus::Completed);
        assert_eq!(snap.result, Some(json!("first")));
        assert!(snap.error.is_none());
    }

    #[test]
    fn test_waiter_signalled_after_terminal_write() {
        let reg = TaskRegistry::new();
        let id = admit(&reg, 1);
        let rx = reg.watch(id).unwrap();
        assert!(!*rx.borrow());

        complete(&reg, id);
        assert!(*rx.borrow());
        // Late subscribers see the signal immediately.
        assert!(*reg.watch(id).unwrap().borrow());
    }

    #[test]
    fn test_counts() {
        let reg = TaskRegistry::new();
        let a = admit(&reg, 1);
        let b = admit(&reg, 2);
        let _c = admit(&reg, 3);
        complete(&reg, a);
        reg.begin(b).unwrap();

        let c = reg.counts();
        assert_eq!(c.pending, 1);
        assert_eq!(c.processing, 1);
        assert_eq!(c.completed, 1);
        assert_eq!(c.failed, 0);
        assert_eq!(c.total(), 3);
    }

    #[test]
    fn test_sweep_cap_evicts_oldest_terminal() {
        let reg = TaskRegistry::new();
        let a = admit(&reg, 1);
        let b = admit(&reg, 2);
        let c = admit(&reg, 3);
        for id in [a, b, c] {
            complete(&reg, id);
        }

        let evicted = reg.sweep(Some(2), None);
        assert_eq!(evicted, vec![a]);
        assert!(reg.snapshot(a).is_none());
        assert!(reg.snapshot(b).is_some());
        assert!(reg.snapshot(c).is_some());
    }

    #[test]
    fn test_sweep_never_evicts_live_tasks() {
        let reg = TaskRegistry::new();
        let pending = admit(&reg, 1);
        let processing = admit(&reg, 2);
        reg.begin(processing).unwrap();

        let evicted = reg.sweep(Some(0), Some(Duration::ZERO));
        assert!(evicted.is_empty());
        assert!(reg.snapshot(pending).is_some());
        assert!(reg.snapshot(processing).is_some());
    }

    #[test]
    fn test_sweep_age_window() {
        let reg = TaskRegistry::new();
        let old = admit(&reg, 1);
        complete(&reg, old);

        // A generous window keeps fresh completions.
        assert!(reg.sweep(None, Some(Duration::from_secs(3600))).is_empty());
        assert!(reg.snapshot(old).is_some());
    }

    #[test]
    fn test_snapshots_newest_first() {
        let reg = TaskRegistry::new();
        let a = admit(&reg, 1);
        let b = admit(&reg, 2);
        let all = reg.snapshots();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b);
        assert_eq!(all[1].id, a);
    }
}
