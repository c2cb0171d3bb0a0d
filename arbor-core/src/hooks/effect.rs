//! Passive Effects
//!
//! An effect binding records a `create` callback and an optional dependency
//! list each render. The record is flagged to run only when the dependencies
//! changed. Its destroy callback lives in an instance shared by every
//! generation of the binding, so the next run (or the unmount) can find the
//! cleanup left by the previous one.
//!
//! Effects run after commit, in three phases per flush: every unmount
//! destroy, then every stale destroy of records about to re-run, then every
//! create.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::debug;

/// Cleanup returned by an effect.
pub type Destroy = Box<dyn FnOnce() + Send>;

/// Body of an effect. It runs once per record.
pub type Create = Box<dyn FnOnce() -> Option<Destroy> + Send>;

/// Dependency list compared between renders.
pub type Deps = SmallVec<[Value; 4]>;

/// Kind bits of an effect record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EffectTag(u8);

impl EffectTag {
    pub const NONE: EffectTag = EffectTag(0);
    /// The record belongs to a passive (post-commit) effect.
    pub const PASSIVE: EffectTag = EffectTag(1 << 0);
    /// The record must run at the next flush.
    pub const HAS_EFFECT: EffectTag = EffectTag(1 << 1);

    pub const fn union(self, other: EffectTag) -> EffectTag {
        EffectTag(self.0 | other.0)
    }

    pub const fn contains(self, other: EffectTag) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Debug for EffectTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.contains(Self::PASSIVE), self.contains(Self::HAS_EFFECT)) {
            (true, true) => f.write_str("PASSIVE | HAS_EFFECT"),
            (true, false) => f.write_str("PASSIVE"),
            (false, true) => f.write_str("HAS_EFFECT"),
            (false, false) => f.write_str("NONE"),
        }
    }
}

/// State shared by all generations of one effect binding.
#[derive(Default)]
pub struct EffectInstance {
    destroy: Option<Destroy>,
}

/// One render's record of an effect binding.
pub struct Effect {
    pub tag: EffectTag,
    create: Mutex<Option<Create>>,
    pub deps: Option<Deps>,
    instance: Arc<Mutex<EffectInstance>>,
}

impl Effect {
    /// A record for a binding seen for the first time.
    pub fn mount(create: Create, deps: Option<Deps>) -> Self {
        Self {
            tag: EffectTag::PASSIVE.union(EffectTag::HAS_EFFECT),
            create: Mutex::new(Some(create)),
            deps,
            instance: Arc::default(),
        }
    }

    /// The next record after `previous`. It runs unless both renders passed
    /// equal dependency lists.
    pub fn update(previous: &Effect, create: Create, deps: Option<Deps>) -> Self {
        let unchanged = matches!((&previous.deps, &deps), (Some(old), Some(new)) if old == new);
        let tag = if unchanged {
            EffectTag::PASSIVE
        } else {
            EffectTag::PASSIVE.union(EffectTag::HAS_EFFECT)
        };
        Self {
            tag,
            create: Mutex::new(Some(create)),
            deps,
            instance: previous.instance.clone(),
        }
    }

    pub fn needs_run(&self) -> bool {
        self.tag.contains(EffectTag::HAS_EFFECT)
    }

    /// Run the cleanup left by the previous run, if any.
    pub fn destroy(&self) {
        let destroy = self.instance.lock().destroy.take();
        if let Some(destroy) = destroy {
            destroy();
        }
    }

    /// Run this record's body and store the cleanup it returns.
    pub fn create(&self) {
        let create = self.create.lock().take();
        if let Some(create) = create {
            let destroy = create();
            self.instance.lock().destroy = destroy;
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("tag", &self.tag)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

/// Effects queued by commits and not yet flushed.
#[derive(Debug, Default)]
pub struct PendingPassiveEffects {
    /// Effects of deleted components.
    pub unmount: Vec<Arc<Effect>>,
    /// Effects whose dependencies changed.
    pub update: Vec<Arc<Effect>>,
}

impl PendingPassiveEffects {
    pub fn is_empty(&self) -> bool {
        self.unmount.is_empty() && self.update.is_empty()
    }

    /// Run the batch: unmount destroys, then stale destroys, then creates.
    pub fn run(self) {
        debug!(
            unmount = self.unmount.len(),
            update = self.update.len(),
            "flushing passive effects"
        );
        for effect in &self.unmount {
            effect.destroy();
        }
        for effect in &self.update {
            effect.destroy();
        }
        for effect in &self.update {
            effect.create();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn logging(log: &Arc<Mutex<Vec<String>>>, name: &str) -> Create {
        let log = log.clone();
        let name = name.to_string();
        Box::new(move || {
            log.lock().push(format!("create {name}"));
            let log = log.clone();
            Some(Box::new(move || log.lock().push(format!("destroy {name}"))) as Destroy)
        })
    }

    #[test]
    fn equal_deps_skip_the_run() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Effect::mount(logging(&log, "a"), Some(SmallVec::from_vec(vec![json!(1)])));
        assert!(first.needs_run());

        let same = Effect::update(&first, logging(&log, "a"), Some(SmallVec::from_vec(vec![json!(1)])));
        assert!(!same.needs_run());

        let changed = Effect::update(&first, logging(&log, "a"), Some(SmallVec::from_vec(vec![json!(2)])));
        assert!(changed.needs_run());

        let always = Effect::update(&first, logging(&log, "a"), None);
        assert!(always.needs_run());
    }

    #[test]
    fn destroy_of_the_previous_run_is_shared() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::new(Effect::mount(logging(&log, "v1"), None));
        PendingPassiveEffects {
            unmount: vec![],
            update: vec![first.clone()],
        }
        .run();

        let second = Arc::new(Effect::update(&first, logging(&log, "v2"), None));
        PendingPassiveEffects {
            unmount: vec![],
            update: vec![second.clone()],
        }
        .run();

        PendingPassiveEffects {
            unmount: vec![second],
            update: vec![],
        }
        .run();

        assert_eq!(
            *log.lock(),
            vec!["create v1", "destroy v1", "create v2", "destroy v2"]
        );
    }

    #[test]
    fn every_destroy_runs_before_any_create() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::new(Effect::mount(logging(&log, "a"), None));
        let b = Arc::new(Effect::mount(logging(&log, "b"), None));
        PendingPassiveEffects {
            unmount: vec![],
            update: vec![a.clone(), b.clone()],
        }
        .run();
        log.lock().clear();

        let a2 = Arc::new(Effect::update(&a, logging(&log, "a2"), None));
        PendingPassiveEffects {
            unmount: vec![b],
            update: vec![a2],
        }
        .run();

        assert_eq!(*log.lock(), vec!["destroy b", "destroy a", "create a2"]);
    }
}
