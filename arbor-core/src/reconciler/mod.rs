//! Reconciler
//!
//! This module drives a mounted tree from pending updates to host mutations.
//!
//! # Pipeline
//!
//! 1. A root render or a binding write enqueues an update at a lane and
//!    merges the lane into the root's pending lanes.
//! 2. `ensure_root_is_scheduled` keeps at most one callback per root: sync
//!    work goes through the root's sync queue and a microtask, everything
//!    else through the external scheduler at the lane's priority.
//! 3. The work loop renders the highest pending lane node by node. Each node
//!    is begun top-down (components run, children are reconciled) and
//!    completed bottom-up (host objects are created or diffed, flags bubble
//!    into `subtree_flags`). Concurrent renders check `should_yield` between
//!    nodes and resume where they left off.
//! 4. A completed tree is committed in one uninterrupted sweep, after which
//!    it becomes current and its passive effects are scheduled.
//!
//! # Locking
//!
//! A root holds three independent locks: `work` for render and commit,
//! `schedule` for pending lanes and the callback bookkeeping, and the sync
//! callback queue. Binding setters never take `work`. When more than one is
//! needed they are taken in the order `work`, then `schedule`.

/// Emit a development diagnostic when enabled in the root's configuration.
macro_rules! dev_warn {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            tracing::warn!($($arg)+);
        }
    };
}

mod begin;
mod child;
mod commit;
mod complete;
mod root;
mod work_loop;

pub use root::Root;
