//! Priority Scheduling
//!
//! This module defines the boundary between the reconciler and the external
//! cooperative task scheduler, plus the lane model the reconciler uses to
//! tag and order pending work.
//!
//! # Overview
//!
//! Every update is tagged with a lane computed from the ambient scheduler
//! priority at the moment it is requested. A root merges the lanes of its
//! pending updates and asks the scheduler for at most one callback at the
//! priority of its highest pending lane. Sync-lane work bypasses the task
//! queue entirely and is flushed from a microtask.
//!
//! The reconciler never blocks or spawns threads. The scheduler decides when
//! callbacks run and answers the `should_yield` question the work loop asks
//! between units of work.

mod lanes;
mod manual;

pub use lanes::Lanes;
pub use manual::{ManualScheduler, SchedulerStats};

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// Priority levels understood by the external task scheduler, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPriority {
    Immediate,
    UserBlocking,
    Normal,
    Low,
    Idle,
}

/// Handle to a scheduled callback, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

impl CallbackId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// What a task asks of the scheduler when it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The task is finished and can be dropped.
    Done,
    /// The task yielded and should be invoked again under the same id.
    Continue,
}

pub type TaskResult = Result<TaskStatus, ReconcileError>;

/// A priority-tagged callback. It may be invoked several times while it keeps
/// returning [`TaskStatus::Continue`].
pub type Task = Box<dyn FnMut() -> TaskResult + Send>;

/// A callback run once at the end of the current tick.
pub type Microtask = Box<dyn FnOnce() -> Result<(), ReconcileError> + Send>;

/// The external cooperative scheduler the reconciler runs on.
///
/// Implementations must never invoke a task or microtask from inside
/// `schedule_callback` or `schedule_microtask`; both are deferred.
pub trait TaskScheduler: Send + Sync {
    /// Request that `task` run at `priority`.
    fn schedule_callback(&self, priority: SchedulerPriority, task: Task) -> CallbackId;

    /// Cancel a scheduled callback. Unknown or finished ids are ignored.
    fn cancel_callback(&self, id: CallbackId);

    /// Whether the running task should give control back now.
    fn should_yield(&self) -> bool;

    /// Priority of the code currently running.
    fn current_priority(&self) -> SchedulerPriority;

    /// Run `task` after the current tick.
    fn schedule_microtask(&self, task: Microtask);
}
