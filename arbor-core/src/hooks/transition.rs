//! Transitions
//!
//! A transition marks updates as non-urgent. Starting one flips the binding's
//! pending flag on at the ambient priority, then runs the caller's scope with
//! the root's transition context entered so every update requested inside it
//! (including the flag flipping back off) lands in the transition lane.

use std::sync::Weak;

use super::{StateSetter, UpdateTarget};

/// Handle returned by `use_transition`.
#[derive(Clone)]
pub struct Transition {
    set_pending: StateSetter<bool>,
    target: Weak<dyn UpdateTarget>,
}

impl Transition {
    pub(crate) fn new(set_pending: StateSetter<bool>, target: Weak<dyn UpdateTarget>) -> Self {
        Self { set_pending, target }
    }

    /// Run `scope`, sending every update it requests through the transition lane.
    pub fn start<F: FnOnce()>(&self, scope: F) {
        self.set_pending.set(true);
        let Some(target) = self.target.upgrade() else {
            scope();
            return;
        };
        let _scope = TransitionScope::enter(target.as_ref());
        self.set_pending.set(false);
        scope();
    }
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition").finish_non_exhaustive()
    }
}

/// Keeps the transition context entered until dropped.
struct TransitionScope<'a> {
    target: &'a dyn UpdateTarget,
}

impl<'a> TransitionScope<'a> {
    fn enter(target: &'a dyn UpdateTarget) -> Self {
        target.enter_transition();
        Self { target }
    }
}

impl Drop for TransitionScope<'_> {
    fn drop(&mut self) {
        self.target.exit_transition();
    }
}
