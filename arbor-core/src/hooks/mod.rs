//! Stateful Bindings
//!
//! Function components keep local state and effects through bindings called
//! in a fixed order from their body. A [`Hooks`] session is created for each
//! component render and handed to the body. The session's phase is chosen
//! once: on mount every call allocates a new record, on update every call
//! pairs with the record at the same position from the previous render.
//!
//! # Binding order
//!
//! Records are matched purely by call position. A body that calls a
//! different number of bindings than last time, or a different kind at some
//! position, fails the render with a [`RenderError`] instead of reading state
//! that belongs to another binding.
//!
//! # Example
//!
//! ```rust,ignore
//! let counter = Component::new("Counter", |_props, hooks| {
//!     let (count, set_count) = hooks.use_state(0_i64)?;
//!     hooks.use_effect(move || { set_count.set(1); None }, Some(vec![]))?;
//!     Ok(VNode::text(count))
//! });
//! ```

mod effect;
mod state;
mod transition;
mod update_queue;

pub use effect::{Create, Deps, Destroy, Effect, EffectTag, PendingPassiveEffects};
pub use state::{StateHook, StateSetter};
pub use transition::Transition;
pub use update_queue::{
    process_update_queue, Action, Processed, Reducer, SharedQueue, StateValue, Update,
    UpdateQueue,
};

use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::error::RenderError;
use crate::scheduler::Lanes;

/// Where binding setters deliver their updates. Implemented by roots.
pub trait UpdateTarget: Send + Sync {
    /// Lane for an update requested right now.
    fn request_update_lane(&self) -> Lanes;

    /// An update was enqueued at `lane`.
    fn schedule_update(&self, lane: Lanes);

    fn enter_transition(&self);

    fn exit_transition(&self);
}

/// One binding record.
#[derive(Clone)]
pub enum Hook {
    State(StateHook),
    Effect(Arc<Effect>),
    /// Marks the position of a transition binding.
    Transition,
}

impl Hook {
    fn kind(&self) -> &'static str {
        match self {
            Hook::State(_) => "state",
            Hook::Effect(_) => "effect",
            Hook::Transition => "transition",
        }
    }
}

/// Which records a session's binding calls consume.
enum Phase<'a> {
    Mount,
    Update { previous: &'a mut Vec<Hook> },
}

/// What one component render left behind.
pub struct HookOutput {
    pub hooks: Vec<Hook>,
    /// Some effect record needs to run after commit.
    pub has_passive_effect: bool,
    pub skipped_lanes: Lanes,
}

/// Binding session for one component render.
pub struct Hooks<'a> {
    component: &'a str,
    phase: Phase<'a>,
    hooks: Vec<Hook>,
    render_lanes: Lanes,
    target: Weak<dyn UpdateTarget>,
    has_passive_effect: bool,
    skipped_lanes: Lanes,
}

impl<'a> Hooks<'a> {
    /// Start a session. `previous` holds the committed records of the
    /// component, or `None` when it is mounting.
    pub(crate) fn new(
        component: &'a str,
        previous: Option<&'a mut Vec<Hook>>,
        render_lanes: Lanes,
        target: Weak<dyn UpdateTarget>,
    ) -> Self {
        let phase = match previous {
            Some(previous) => Phase::Update { previous },
            None => Phase::Mount,
        };
        Self {
            component,
            phase,
            hooks: Vec::new(),
            render_lanes,
            target,
            has_passive_effect: false,
            skipped_lanes: Lanes::NONE,
        }
    }

    /// Name of the component being rendered.
    pub fn component(&self) -> &str {
        self.component
    }

    /// Whether this is the component's first render.
    pub fn is_mounting(&self) -> bool {
        matches!(self.phase, Phase::Mount)
    }

    /// The committed record at the current position, or `None` on mount.
    fn previous(&mut self) -> Result<Option<&mut Hook>, RenderError> {
        let index = self.hooks.len();
        match &mut self.phase {
            Phase::Mount => Ok(None),
            Phase::Update { previous } => {
                let expected = previous.len();
                match previous.get_mut(index) {
                    Some(hook) => Ok(Some(hook)),
                    None => Err(RenderError::HookCountMismatch {
                        component: self.component.to_string(),
                        expected,
                        found: index + 1,
                    }),
                }
            }
        }
    }

    fn kind_mismatch(&self, expected: &'static str, found: &'static str) -> RenderError {
        RenderError::HookKindMismatch {
            component: self.component.to_string(),
            index: self.hooks.len(),
            expected,
            found,
        }
    }

    /// A state binding initialised with `initial` on mount.
    pub fn use_state<T>(&mut self, initial: T) -> Result<(T, StateSetter<T>), RenderError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.use_state_with(move || initial)
    }

    /// A state binding whose initial value is computed once, on mount.
    pub fn use_state_with<T, F>(&mut self, init: F) -> Result<(T, StateSetter<T>), RenderError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let render_lanes = self.render_lanes;
        let hook = match self.previous()? {
            None => StateHook::mount(Arc::new(init())),
            Some(Hook::State(previous)) => {
                let (next, skipped) = previous.rebase(render_lanes);
                self.skipped_lanes |= skipped;
                next
            }
            Some(other) => {
                let found = other.kind();
                return Err(self.kind_mismatch("state", found));
            }
        };

        let Some(value) = hook.memoized.downcast_ref::<T>().cloned() else {
            return Err(RenderError::StateTypeMismatch {
                component: self.component.to_string(),
                index: self.hooks.len(),
            });
        };
        let setter = StateSetter::new(&hook.queue, self.target.clone());
        self.hooks.push(Hook::State(hook));
        Ok((value, setter))
    }

    /// A passive effect. `create` runs after commit on mount, and again after
    /// any commit where `deps` differs from the previous render's list. With
    /// `deps` of `None` it runs after every commit.
    pub fn use_effect<F>(&mut self, create: F, deps: Option<Vec<Value>>) -> Result<(), RenderError>
    where
        F: FnOnce() -> Option<Destroy> + Send + 'static,
    {
        let create: Create = Box::new(create);
        let deps: Option<Deps> = deps.map(Deps::from_vec);
        let effect = match self.previous()? {
            None => Effect::mount(create, deps),
            Some(Hook::Effect(previous)) => Effect::update(previous, create, deps),
            Some(other) => {
                let found = other.kind();
                return Err(self.kind_mismatch("effect", found));
            }
        };

        if effect.needs_run() {
            self.has_passive_effect = true;
        }
        self.hooks.push(Hook::Effect(Arc::new(effect)));
        Ok(())
    }

    /// A pending flag plus a handle that runs updates in the transition lane.
    pub fn use_transition(&mut self) -> Result<(bool, Transition), RenderError> {
        let (pending, set_pending) = self.use_state(false)?;
        match self.previous()? {
            None | Some(Hook::Transition) => {}
            Some(other) => {
                let found = other.kind();
                return Err(self.kind_mismatch("transition", found));
            }
        }
        self.hooks.push(Hook::Transition);
        Ok((pending, Transition::new(set_pending, self.target.clone())))
    }

    /// End the session, checking that every previous record was consumed.
    pub(crate) fn finish(self) -> Result<HookOutput, RenderError> {
        if let Phase::Update { previous } = &self.phase {
            if previous.len() != self.hooks.len() {
                return Err(RenderError::HookCountMismatch {
                    component: self.component.to_string(),
                    expected: previous.len(),
                    found: self.hooks.len(),
                });
            }
        }
        Ok(HookOutput {
            hooks: self.hooks,
            has_passive_effect: self.has_passive_effect,
            skipped_lanes: self.skipped_lanes,
        })
    }
}
