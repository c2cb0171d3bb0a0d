//! Update Queues
//!
//! Each state binding (and the host root) owns a shared queue of pending
//! updates. Setters append to it from anywhere; the render phase drains it
//! into the binding's base queue and replays the base queue against the base
//! state, applying only the updates whose lane is being rendered.
//!
//! # Rebasing
//!
//! Skipped updates stay in the base queue. Once one update has been skipped,
//! every later update is kept too (with an empty lane, so it always applies
//! again) and the base state freezes at the value before the first skip.
//! Replaying from that base later yields the same result as applying every
//! update in insertion order.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::scheduler::Lanes;

/// Type-erased binding state.
pub type StateValue = Arc<dyn Any + Send + Sync>;

/// `previous state -> next state`.
pub type Reducer = Arc<dyn Fn(&StateValue) -> StateValue + Send + Sync>;

/// What an update does to the state it is applied to.
#[derive(Clone)]
pub enum Action {
    Replace(StateValue),
    Reduce(Reducer),
}

impl Action {
    pub fn apply(&self, state: &StateValue) -> StateValue {
        match self {
            Action::Replace(value) => value.clone(),
            Action::Reduce(reducer) => reducer(state),
        }
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Replace(_) => f.write_str("Replace(..)"),
            Action::Reduce(_) => f.write_str("Reduce(..)"),
        }
    }
}

/// A state transition tagged with the lane that requested it.
#[derive(Debug, Clone)]
pub struct Update {
    pub action: Action,
    pub lane: Lanes,
}

/// Updates enqueued since the binding was last rendered, oldest first.
#[derive(Debug, Default)]
pub struct UpdateQueue {
    pending: VecDeque<Update>,
}

impl UpdateQueue {
    pub fn enqueue(&mut self, update: Update) {
        self.pending.push_back(update);
    }

    /// Remove and return every pending update.
    pub fn take_pending(&mut self) -> VecDeque<Update> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

pub type SharedQueue = Arc<Mutex<UpdateQueue>>;

/// Result of replaying a base queue.
#[derive(Debug)]
pub struct Processed {
    /// State after every applied update.
    pub state: StateValue,
    /// State the retained updates must be replayed from.
    pub base_state: StateValue,
    /// Updates to keep for a later render.
    pub base_queue: Vec<Update>,
    /// Lanes of the updates that were skipped.
    pub skipped_lanes: Lanes,
}

/// Replay `base_queue` over `base_state`, applying only the updates whose
/// lane is included in `render_lanes`.
pub fn process_update_queue(
    base_state: &StateValue,
    base_queue: &[Update],
    render_lanes: Lanes,
) -> Processed {
    let mut state = base_state.clone();
    let mut new_base_state = None;
    let mut new_base_queue = Vec::new();
    let mut skipped_lanes = Lanes::NONE;

    for update in base_queue {
        if !render_lanes.includes(update.lane) {
            if new_base_queue.is_empty() {
                new_base_state = Some(state.clone());
            }
            new_base_queue.push(update.clone());
            skipped_lanes |= update.lane;
            continue;
        }

        if !new_base_queue.is_empty() {
            new_base_queue.push(Update {
                action: update.action.clone(),
                lane: Lanes::NONE,
            });
        }
        state = update.action.apply(&state);
    }

    Processed {
        base_state: new_base_state.unwrap_or_else(|| state.clone()),
        state,
        base_queue: new_base_queue,
        skipped_lanes,
    }
}
