//! Deferred controller work
//!
//! Timers are modelled as deadlines on an injected clock rather than as
//! callbacks, so the controller stays the only owner of its state. The host
//! calls `ViewportController::tick` whenever a deadline may have passed.

use std::cell::Cell;
use std::rc::Rc;

/// Millisecond time source
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Clock that only moves when told to; clones share the same time
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeferredTask {
    /// Reapply the camera without the focus animation
    SettleTransform,
    /// Drop the transient highlight from a member
    ClearHighlight { id: String },
}

#[derive(Clone, Debug)]
struct Scheduled {
    due_ms: f64,
    seq: u64,
    task: DeferredTask,
}

#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
    entries: Vec<Scheduled>,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: f64, task: DeferredTask) {
        self.entries.push(Scheduled {
            due_ms,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    /// Drop every pending task equal to `task`; returns how many were dropped
    pub fn cancel(&mut self, task: &DeferredTask) -> usize {
        let before = self.entries.len();
        self.entries.retain(|s| &s.task != task);
        before - self.entries.len()
    }

    /// Remove and return the tasks due at `now_ms`, earliest first
    pub fn take_due(&mut self, now_ms: f64) -> Vec<DeferredTask> {
        let (mut due, pending): (Vec<Scheduled>, Vec<Scheduled>) =
            self.entries.drain(..).partition(|s| s.due_ms <= now_ms);
        self.entries = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|s| s.task).collect()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.entries.iter().map(|s| s.due_ms).min_by(|a, b| a.total_cmp(b))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear(id: &str) -> DeferredTask {
        DeferredTask::ClearHighlight { id: id.to_string() }
    }

    #[test]
    fn test_take_due_in_deadline_order() {
        let mut q = TaskQueue::new();
        q.schedule(300.0, clear("B"));
        q.schedule(100.0, DeferredTask::SettleTransform);
        q.schedule(500.0, clear("C"));

        assert_eq!(q.next_deadline(), Some(100.0));
        assert_eq!(q.take_due(300.0), vec![DeferredTask::SettleTransform, clear("B")]);
        assert_eq!(q.len(), 1);
        assert!(q.take_due(499.0).is_empty());
        assert_eq!(q.take_due(500.0), vec![clear("C")]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_cancel_matches_exact_task() {
        let mut q = TaskQueue::new();
        q.schedule(10.0, clear("A"));
        q.schedule(20.0, clear("B"));
        assert_eq!(q.cancel(&clear("A")), 1);
        assert_eq!(q.cancel(&clear("A")), 0);
        assert_eq!(q.next_deadline(), Some(20.0));
    }

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(250.0);
        assert_eq!(other.now_ms(), 250.0);
    }
}
