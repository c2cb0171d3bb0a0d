//! Manual Scheduler
//!
//! A deterministic [`TaskScheduler`] driven explicitly by the caller. Tasks
//! run in priority order (FIFO within a priority) only when the caller asks,
//! microtasks run only on [`ManualScheduler::flush_microtasks`], and yielding
//! is scripted with [`ManualScheduler::yield_after`].
//!
//! This is what the crate's own tests run on, and it is a reasonable driver
//! for embedders that own their event loop.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{CallbackId, Microtask, SchedulerPriority, Task, TaskScheduler, TaskStatus};
use crate::error::ReconcileError;

/// Counters describing how the scheduler has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Callbacks requested through `schedule_callback`.
    pub scheduled: usize,
    /// Callbacks cancelled before they finished.
    pub cancelled: usize,
    /// Times `should_yield` answered true.
    pub yields: usize,
}

struct Entry {
    id: CallbackId,
    priority: SchedulerPriority,
    seq: u64,
    /// `None` while the task is running.
    task: Option<Task>,
}

#[derive(Default)]
struct ManualState {
    next_id: u64,
    next_seq: u64,
    tasks: Vec<Entry>,
    microtasks: VecDeque<Microtask>,
    priority_stack: Vec<SchedulerPriority>,
    /// Number of units allowed per task invocation before yielding.
    yield_after: Option<usize>,
    yield_checks: usize,
    stats: SchedulerStats,
}

/// A caller-driven, single-threaded task scheduler.
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<ManualState>,
}

impl ManualScheduler {
    /// Create a new scheduler, ready to be shared with roots.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Run `f` with `priority` as the ambient priority.
    pub fn run_with_priority<R>(&self, priority: SchedulerPriority, f: impl FnOnce() -> R) -> R {
        self.state.lock().priority_stack.push(priority);
        let result = f();
        self.state.lock().priority_stack.pop();
        result
    }

    /// Make `should_yield` answer true once `units` checks have passed within
    /// a single task invocation.
    pub fn yield_after(&self, units: usize) {
        self.state.lock().yield_after = Some(units);
    }

    /// Stop scripted yielding.
    pub fn never_yield(&self) {
        self.state.lock().yield_after = None;
    }

    pub fn stats(&self) -> SchedulerStats {
        self.state.lock().stats
    }

    /// Number of callbacks waiting to run.
    pub fn pending_tasks(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Number of microtasks waiting for the next flush.
    pub fn pending_microtasks(&self) -> usize {
        self.state.lock().microtasks.len()
    }

    pub fn has_pending_microtasks(&self) -> bool {
        !self.state.lock().microtasks.is_empty()
    }

    /// Run queued microtasks, including any queued while flushing.
    pub fn flush_microtasks(&self) -> Result<(), ReconcileError> {
        loop {
            let next = self.state.lock().microtasks.pop_front();
            match next {
                Some(microtask) => microtask()?,
                None => return Ok(()),
            }
        }
    }

    /// Invoke the most urgent waiting task once.
    ///
    /// Returns `Ok(false)` when no task was waiting. A task that fails is
    /// dropped and its error returned.
    pub fn run_next_task(&self) -> Result<bool, ReconcileError> {
        let (id, mut task) = {
            let mut state = self.state.lock();
            let Some(pos) = state
                .tasks
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.task.is_some())
                .min_by_key(|(_, entry)| (entry.priority, entry.seq))
                .map(|(pos, _)| pos)
            else {
                return Ok(false);
            };
            let entry = &mut state.tasks[pos];
            let id = entry.id;
            let priority = entry.priority;
            let Some(task) = entry.task.take() else {
                return Ok(false);
            };
            state.priority_stack.push(priority);
            state.yield_checks = 0;
            (id, task)
        };

        let result = task();

        let mut state = self.state.lock();
        state.priority_stack.pop();
        // The entry is gone if the task was cancelled while running.
        let pos = state.tasks.iter().position(|entry| entry.id == id);
        match (&result, pos) {
            (Ok(TaskStatus::Continue), Some(pos)) => state.tasks[pos].task = Some(task),
            (_, Some(pos)) => {
                state.tasks.remove(pos);
            }
            (_, None) => {}
        }
        result.map(|_| true)
    }

    /// Alternate microtask flushes and task invocations until both queues are empty.
    pub fn run_until_idle(&self) -> Result<(), ReconcileError> {
        loop {
            self.flush_microtasks()?;
            if !self.run_next_task()? && !self.has_pending_microtasks() {
                return Ok(());
            }
        }
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule_callback(&self, priority: SchedulerPriority, task: Task) -> CallbackId {
        let mut state = self.state.lock();
        let id = CallbackId::new(state.next_id);
        state.next_id += 1;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.tasks.push(Entry {
            id,
            priority,
            seq,
            task: Some(task),
        });
        state.stats.scheduled += 1;
        id
    }

    fn cancel_callback(&self, id: CallbackId) {
        let mut state = self.state.lock();
        if let Some(pos) = state.tasks.iter().position(|entry| entry.id == id) {
            state.tasks.remove(pos);
            state.stats.cancelled += 1;
        }
    }

    fn should_yield(&self) -> bool {
        let mut state = self.state.lock();
        match state.yield_after {
            Some(limit) if state.yield_checks >= limit => {
                state.stats.yields += 1;
                true
            }
            Some(_) => {
                state.yield_checks += 1;
                false
            }
            None => false,
        }
    }

    fn current_priority(&self) -> SchedulerPriority {
        self.state
            .lock()
            .priority_stack
            .last()
            .copied()
            .unwrap_or(SchedulerPriority::Normal)
    }

    fn schedule_microtask(&self, task: Microtask) {
        self.state.lock().microtasks.push_back(task);
    }
}
