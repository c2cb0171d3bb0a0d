//! State Bindings
//!
//! A state binding keeps one value per component position across renders.
//! Its setter is a weak handle: it can be cloned freely, called from any
//! thread or from effects, and silently does nothing once the component is
//! gone.

use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{trace, warn};

use super::update_queue::{
    process_update_queue, Action, SharedQueue, StateValue, Update, UpdateQueue,
};
use super::UpdateTarget;
use crate::scheduler::Lanes;

/// Persistent record of one state binding.
#[derive(Clone)]
pub struct StateHook {
    /// Value produced by the last render.
    pub memoized: StateValue,
    /// Value the base queue is replayed from.
    pub base_state: StateValue,
    /// Updates retained for a later render.
    pub base_queue: Vec<Update>,
    /// Updates enqueued by setters since the last render.
    pub queue: SharedQueue,
}

impl StateHook {
    pub fn mount(initial: StateValue) -> Self {
        Self::with_queue(initial, Arc::new(Mutex::new(UpdateQueue::default())))
    }

    pub fn with_queue(initial: StateValue, queue: SharedQueue) -> Self {
        Self {
            memoized: initial.clone(),
            base_state: initial,
            base_queue: Vec::new(),
            queue,
        }
    }

    /// Compute the next generation of this binding for `render_lanes`.
    ///
    /// `self` is the committed record. Pending updates move into its base
    /// queue first, so a render that is thrown away loses nothing. Returns
    /// the new record and the lanes that were skipped.
    pub fn rebase(&mut self, render_lanes: Lanes) -> (StateHook, Lanes) {
        let pending = self.queue.lock().take_pending();
        self.base_queue.extend(pending);

        if self.base_queue.is_empty() {
            return (self.clone(), Lanes::NONE);
        }

        let processed = process_update_queue(&self.base_state, &self.base_queue, render_lanes);
        let next = StateHook {
            memoized: processed.state,
            base_state: processed.base_state,
            base_queue: processed.base_queue,
            queue: self.queue.clone(),
        };
        (next, processed.skipped_lanes)
    }
}

/// Writes to a state binding of type `T`.
pub struct StateSetter<T> {
    queue: Weak<Mutex<UpdateQueue>>,
    target: Weak<dyn UpdateTarget>,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            target: self.target.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSetter")
            .field("mounted", &(self.queue.strong_count() > 0))
            .finish()
    }
}

impl<T: Send + Sync + 'static> StateSetter<T> {
    pub(crate) fn new(queue: &SharedQueue, target: Weak<dyn UpdateTarget>) -> Self {
        Self {
            queue: Arc::downgrade(queue),
            target,
            _marker: PhantomData,
        }
    }

    /// Replace the state with `value`.
    pub fn set(&self, value: T) {
        self.dispatch(Action::Replace(Arc::new(value)));
    }

    /// Compute the next state from the previous one.
    pub fn update<F>(&self, f: F)
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        self.dispatch(Action::Reduce(Arc::new(move |state: &StateValue| {
            match state.downcast_ref::<T>() {
                Some(previous) => Arc::new(f(previous)) as StateValue,
                None => {
                    warn!("state reducer received a value of another type; keeping it");
                    state.clone()
                }
            }
        })));
    }

    fn dispatch(&self, action: Action) {
        let (Some(queue), Some(target)) = (self.queue.upgrade(), self.target.upgrade()) else {
            trace!("dropping update for an unmounted binding");
            return;
        };
        let lane = target.request_update_lane();
        queue.lock().enqueue(Update { action, lane });
        target.schedule_update(lane);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(state: &StateValue) -> i32 {
        *state.downcast_ref::<i32>().unwrap()
    }

    #[test]
    fn rebase_without_updates_keeps_state() {
        let mut hook = StateHook::mount(Arc::new(7_i32));
        let (next, skipped) = hook.rebase(Lanes::DEFAULT);
        assert_eq!(read(&next.memoized), 7);
        assert_eq!(skipped, Lanes::NONE);
    }

    #[test]
    fn rebase_keeps_merged_updates_on_the_committed_record() {
        let mut hook = StateHook::mount(Arc::new(0_i32));
        hook.queue.lock().enqueue(Update {
            action: Action::Replace(Arc::new(5_i32)),
            lane: Lanes::IDLE,
        });

        let (next, skipped) = hook.rebase(Lanes::DEFAULT);
        assert_eq!(read(&next.memoized), 0);
        assert_eq!(skipped, Lanes::IDLE);
        // A thrown-away render must not lose the update.
        assert_eq!(hook.base_queue.len(), 1);
        assert!(hook.queue.lock().is_empty());

        let (next, _) = hook.rebase(Lanes::IDLE);
        assert_eq!(read(&next.memoized), 5);
    }
}
