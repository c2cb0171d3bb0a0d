//! Integration Tests for the Reconciler
//!
//! These tests mount trees into an in-memory host through a manually driven
//! scheduler and check the host calls each update produces.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use arbor_core::{
    Component, Destroy, Element, HostHandle, HostOp, Lanes, ManualScheduler, MemoryHost,
    ReconcileError, ReconcilerConfig, RenderError, Root, SchedulerPriority, StateSetter,
    Transition, VNode,
};

struct Harness {
    host: MemoryHost,
    container: HostHandle,
    scheduler: Arc<ManualScheduler>,
    root: Root,
}

impl Harness {
    fn new() -> Self {
        let host = MemoryHost::new();
        let container = host.create_container();
        let scheduler = ManualScheduler::new();
        let root = Root::new(container, host.clone(), scheduler.clone());
        Self {
            host,
            container,
            scheduler,
            root,
        }
    }

    /// Render `tree` and drain every queue.
    fn render(&self, tree: impl Into<VNode>) {
        self.root.render(tree);
        self.scheduler.run_until_idle().unwrap();
    }

    fn markup(&self) -> String {
        self.host.markup(self.container)
    }

    /// Host calls that touched the attached tree since the last call.
    fn take_mutations(&self) -> Vec<HostOp> {
        self.host
            .take_ops()
            .into_iter()
            .filter(HostOp::is_mutation)
            .collect()
    }
}

type Slot<T> = Arc<Mutex<Option<T>>>;
type Log = Arc<Mutex<Vec<String>>>;

fn item(key: &str) -> VNode {
    Element::host("li").key(key).child(key).into()
}

fn list(keys: &[&str]) -> VNode {
    Element::host("ul")
        .child(VNode::list(keys.iter().map(|key| item(key))))
        .into()
}

/// A counter that hands its setter to the test.
fn counter(slot: &Slot<StateSetter<i64>>) -> Component {
    let slot = slot.clone();
    Component::new("Counter", move |_props, hooks| {
        let (count, set_count) = hooks.use_state(0_i64)?;
        *slot.lock() = Some(set_count);
        Ok(VNode::text(count))
    })
}

/// A component with one effect keyed on its `dep` attribute.
fn tracked(name: &'static str, log: &Log) -> Component {
    let log = log.clone();
    Component::new(name, move |props, hooks| {
        let dep = props.get("dep").cloned().unwrap_or(Value::Null);
        let log = log.clone();
        hooks.use_effect(
            move || {
                log.lock().push(format!("create {name}"));
                let cleanup = log.clone();
                Some(Box::new(move || cleanup.lock().push(format!("destroy {name}"))) as Destroy)
            },
            Some(vec![dep]),
        )?;
        Ok(VNode::Empty)
    })
}

#[test]
fn mount_builds_the_host_tree() {
    let h = Harness::new();
    h.render(
        Element::host("div")
            .attr("id", "app")
            .child(vec![VNode::text("hello "), Element::host("b").child("world").into()]),
    );

    assert_eq!(h.markup(), r#"<div id="app">hello <b>world</b></div>"#);

    // The subtree is built detached and attached with a single call.
    let mutations = h.take_mutations();
    assert_eq!(mutations.len(), 1);
    assert!(matches!(mutations[0], HostOp::Append { parent, .. } if parent == h.container));
}

/// Reversing a keyed list moves nodes instead of recreating them.
#[test]
fn keyed_reversal_moves_existing_nodes() {
    let h = Harness::new();
    h.render(list(&["a", "b", "c"]));
    let ul = h.host.children(h.container)[0];
    let items = h.host.children(ul);
    let (a, b, c) = (items[0], items[1], items[2]);
    h.host.take_ops();

    h.render(list(&["c", "b", "a"]));

    assert_eq!(h.markup(), "<ul><li>c</li><li>b</li><li>a</li></ul>");
    assert_eq!(h.host.children(ul), vec![c, b, a]);
    // c stays put; b and a are scanned after it and moved behind it.
    assert_eq!(
        h.host.take_ops(),
        vec![
            HostOp::Append { parent: ul, child: b },
            HostOp::Append { parent: ul, child: a },
        ]
    );
}

#[test]
fn keyed_insert_at_front_inserts_before_first_kept_item() {
    let h = Harness::new();
    h.render(list(&["b", "c"]));
    let ul = h.host.children(h.container)[0];
    let b = h.host.children(ul)[0];
    h.host.take_ops();

    h.render(list(&["a", "b", "c"]));

    assert_eq!(h.markup(), "<ul><li>a</li><li>b</li><li>c</li></ul>");
    let mutations = h.take_mutations();
    assert_eq!(mutations.len(), 1);
    assert!(matches!(
        mutations[0],
        HostOp::InsertBefore { parent, before, .. } if parent == ul && before == b
    ));
}

#[test]
fn removed_keys_are_deleted_and_freed() {
    let h = Harness::new();
    h.render(list(&["a", "b", "c"]));
    h.render(list(&["a", "b", "c"]));
    let ul = h.host.children(h.container)[0];
    let items = h.host.children(ul);
    let before = h.root.node_count();
    h.host.take_ops();

    h.render(list(&["b"]));

    assert_eq!(h.markup(), "<ul><li>b</li></ul>");
    assert_eq!(
        h.take_mutations(),
        vec![
            HostOp::Remove { parent: ul, child: items[0] },
            HostOp::Remove { parent: ul, child: items[2] },
        ]
    );
    assert!(h.root.node_count() < before);
}

#[test]
fn duplicate_keys_leave_no_stale_host_nodes() {
    let h = Harness::new();
    let tree = |items: &[(&str, &str)]| -> VNode {
        Element::host("ul")
            .child(VNode::list(
                items.iter().map(|(key, text)| Element::host("li").key(key).child(*text)),
            ))
            .into()
    };
    h.render(tree(&[("a", "1"), ("a", "2")]));
    assert_eq!(h.markup(), "<ul><li>1</li><li>2</li></ul>");

    h.render(tree(&[("b", "3")]));
    assert_eq!(h.markup(), "<ul><li>3</li></ul>");
}

#[test]
fn type_change_replaces_the_node() {
    let h = Harness::new();
    h.render(Element::host("div").key("x").child("content"));
    let div = h.host.children(h.container)[0];
    h.host.take_ops();

    h.render(Element::host("span").key("x").child("content"));

    assert_eq!(h.markup(), "<span>content</span>");
    let span = h.host.children(h.container)[0];
    assert_ne!(span, div);

    let ops = h.host.take_ops();
    assert!(ops.contains(&HostOp::CreateInstance {
        handle: span,
        kind: "span".to_string()
    }));
    let mutations: Vec<_> = ops.into_iter().filter(HostOp::is_mutation).collect();
    assert_eq!(
        mutations,
        vec![
            HostOp::Remove { parent: h.container, child: div },
            HostOp::Append { parent: h.container, child: span },
        ]
    );
}

#[test]
fn attribute_and_text_changes_update_in_place() {
    let h = Harness::new();
    h.render(Element::host("p").attr("class", "a").attr("title", "t").child("one"));
    let p = h.host.children(h.container)[0];
    let text = h.host.children(p)[0];
    h.host.take_ops();

    h.render(Element::host("p").attr("class", "b").child("two"));

    assert_eq!(h.markup(), r#"<p class="b">two</p>"#);
    assert_eq!(h.host.children(h.container), vec![p]);
    assert_eq!(h.host.attribute(p, "title"), None);

    let ops = h.host.take_ops();
    assert_eq!(ops.len(), 2);
    match &ops[0] {
        HostOp::Update { handle, diff } => {
            assert_eq!(*handle, p);
            assert_eq!(diff.set.get("class"), Some(&json!("b")));
            assert_eq!(diff.removed, vec!["title".to_string()]);
        }
        other => panic!("expected an attribute update, got {other:?}"),
    }
    assert_eq!(
        ops[1],
        HostOp::TextUpdate {
            handle: text,
            content: "two".to_string()
        }
    );
}

#[test]
fn unchanged_tree_produces_no_host_calls() {
    let h = Harness::new();
    h.render(list(&["a", "b"]));
    h.host.take_ops();

    h.render(list(&["a", "b"]));

    assert!(h.host.take_ops().is_empty());
}

#[test]
fn fragment_children_are_placed_among_siblings() {
    let h = Harness::new();
    let tree = |keys: &[&str]| -> VNode {
        Element::host("div")
            .child(vec![
                VNode::from(Element::fragment(VNode::list(
                    keys.iter().map(|k| Element::host("span").key(k).child(*k)),
                ))),
                Element::host("p").child("end").into(),
            ])
            .into()
    };
    h.render(tree(&["a", "c"]));
    assert_eq!(h.markup(), "<div><span>a</span><span>c</span><p>end</p></div>");
    let div = h.host.children(h.container)[0];
    let c = h.host.children(div)[1];
    h.host.take_ops();

    h.render(tree(&["a", "b", "c"]));

    assert_eq!(
        h.markup(),
        "<div><span>a</span><span>b</span><span>c</span><p>end</p></div>"
    );
    let mutations = h.take_mutations();
    assert!(matches!(
        mutations.as_slice(),
        [HostOp::InsertBefore { parent, before, .. }] if *parent == div && *before == c
    ));
}

#[test]
fn state_update_rerenders_the_component() {
    let h = Harness::new();
    let slot: Slot<StateSetter<i64>> = Arc::default();
    h.render(counter(&slot).element());
    assert_eq!(h.markup(), "0");

    let set_count = slot.lock().clone().unwrap();
    set_count.update(|n| n + 5);
    h.scheduler.run_until_idle().unwrap();

    assert_eq!(h.markup(), "5");
}

/// Two writes at the same priority share one scheduled callback.
#[test]
fn repeated_updates_schedule_one_callback() {
    let h = Harness::new();
    let slot: Slot<StateSetter<i64>> = Arc::default();
    h.render(counter(&slot).element());
    let set_count = slot.lock().clone().unwrap();
    let before = h.scheduler.stats();

    set_count.set(1);
    set_count.set(2);

    let after = h.scheduler.stats();
    assert_eq!(after.scheduled, before.scheduled + 1);
    assert_eq!(after.cancelled, before.cancelled);
    assert_eq!(h.root.pending_lanes(), Lanes::DEFAULT);

    h.scheduler.run_until_idle().unwrap();
    assert_eq!(h.markup(), "2");
    assert!(!h.root.has_scheduled_callback());
}

#[test]
fn more_urgent_update_replaces_the_callback() {
    let h = Harness::new();
    let slot: Slot<StateSetter<i64>> = Arc::default();
    h.render(counter(&slot).element());
    let set_count = slot.lock().clone().unwrap();
    let before = h.scheduler.stats();

    set_count.update(|n| n + 1);
    h.scheduler
        .run_with_priority(SchedulerPriority::UserBlocking, || set_count.update(|n| n + 10));

    let after = h.scheduler.stats();
    assert_eq!(after.scheduled, before.scheduled + 2);
    assert_eq!(after.cancelled, before.cancelled + 1);
    assert_eq!(h.root.pending_lanes(), Lanes::DEFAULT | Lanes::INPUT_CONTINUOUS);

    h.scheduler.run_until_idle().unwrap();
    assert_eq!(h.markup(), "11");
}

/// Sync updates made within one tick are flushed together on one microtask.
#[test]
fn sync_updates_in_one_tick_render_once() {
    let h = Harness::new();
    let renders = Arc::new(AtomicUsize::new(0));
    let slot: Slot<StateSetter<i64>> = Arc::default();
    let counted = {
        let renders = renders.clone();
        let slot = slot.clone();
        Component::new("Counted", move |_props, hooks| {
            renders.fetch_add(1, Ordering::SeqCst);
            let (count, set_count) = hooks.use_state(0_i64)?;
            *slot.lock() = Some(set_count);
            Ok(VNode::text(count))
        })
    };
    h.render(counted.element());
    let set_count = slot.lock().clone().unwrap();
    let mounted = renders.load(Ordering::SeqCst);
    let scheduled = h.scheduler.stats().scheduled;

    h.scheduler.run_with_priority(SchedulerPriority::Immediate, || {
        for _ in 0..3 {
            set_count.update(|n| n + 1);
        }
    });

    assert_eq!(h.scheduler.pending_microtasks(), 1);
    assert_eq!(h.scheduler.stats().scheduled, scheduled);
    assert_eq!(renders.load(Ordering::SeqCst), mounted);

    h.scheduler.flush_microtasks().unwrap();
    assert_eq!(renders.load(Ordering::SeqCst), mounted + 1);
    assert_eq!(h.markup(), "3");
    assert_eq!(h.root.pending_lanes(), Lanes::NONE);
}

/// Rendering one lane applies only that lane's updates and keeps the rest.
#[test]
fn lane_gated_updates_replay_in_order() {
    let h = Harness::new();
    let slot: Slot<StateSetter<i64>> = Arc::default();
    h.render(counter(&slot).element());
    let set_count = slot.lock().clone().unwrap();

    h.scheduler
        .run_with_priority(SchedulerPriority::Immediate, || set_count.update(|n| n + 1));
    set_count.update(|n| n + 10);
    assert_eq!(h.root.pending_lanes(), Lanes::SYNC | Lanes::DEFAULT);

    h.scheduler.flush_microtasks().unwrap();
    assert_eq!(h.markup(), "1");
    assert_eq!(h.root.pending_lanes(), Lanes::DEFAULT);

    h.scheduler.run_until_idle().unwrap();
    assert_eq!(h.markup(), "11");
    assert!(h.root.pending_lanes().is_empty());
}

fn numbered_list(slot: &Slot<StateSetter<usize>>) -> Component {
    let slot = slot.clone();
    Component::new("List", move |_props, hooks| {
        let (len, set_len) = hooks.use_state(0_usize)?;
        *slot.lock() = Some(set_len);
        Ok(Element::host("ul")
            .child(VNode::list(
                (0..len).map(|i| Element::host("li").key(i).child(i)),
            ))
            .into())
    })
}

/// A yielding render leaves the host untouched until it completes.
#[test]
fn interrupted_render_commits_all_at_once() {
    let h = Harness::new();
    let slot: Slot<StateSetter<usize>> = Arc::default();
    h.render(numbered_list(&slot).element());
    let set_len = slot.lock().clone().unwrap();
    h.host.take_ops();

    h.scheduler.yield_after(2);
    set_len.set(6);

    let mut invocations = 0;
    loop {
        assert!(h.scheduler.run_next_task().unwrap());
        invocations += 1;
        if h.root.pending_lanes().is_empty() {
            break;
        }
        assert!(
            h.host.ops().iter().all(|op| !op.is_mutation()),
            "host mutated before the render completed"
        );
        assert_eq!(h.markup(), "<ul></ul>");
    }
    h.scheduler.never_yield();

    assert!(invocations > 1);
    assert!(h.scheduler.stats().yields > 0);
    assert_eq!(
        h.markup(),
        "<ul><li>0</li><li>1</li><li>2</li><li>3</li><li>4</li><li>5</li></ul>"
    );
}

/// A sync update arriving mid-render restarts work at the sync lane.
#[test]
fn sync_update_interrupts_a_yielded_render() {
    let h = Harness::new();
    let slot: Slot<StateSetter<usize>> = Arc::default();
    h.render(numbered_list(&slot).element());
    let set_len = slot.lock().clone().unwrap();

    h.scheduler.yield_after(1);
    set_len.update(|n| n + 3);
    assert!(h.scheduler.run_next_task().unwrap());
    assert_eq!(h.markup(), "<ul></ul>");

    h.scheduler
        .run_with_priority(SchedulerPriority::Immediate, || set_len.update(|n| n + 1));
    h.scheduler.flush_microtasks().unwrap();

    // Only the sync update is applied; the default one is still pending.
    assert_eq!(h.markup(), "<ul><li>0</li></ul>");
    assert!(h.root.pending_lanes().includes(Lanes::DEFAULT));

    h.scheduler.never_yield();
    h.scheduler.run_until_idle().unwrap();
    assert_eq!(
        h.markup(),
        "<ul><li>0</li><li>1</li><li>2</li><li>3</li></ul>"
    );
}

#[test]
fn dropping_a_binding_fails_the_render() {
    let h = Harness::new();
    let toggled = Component::new("Toggled", |props, hooks| {
        let (value, _) = hooks.use_state(1_i64)?;
        if props.get("extra").is_some() {
            hooks.use_state(2_i64)?;
        }
        Ok(VNode::text(value))
    });
    h.render(Element::component(&toggled).attr("extra", true));
    assert_eq!(h.markup(), "1");

    h.root.render(Element::component(&toggled));
    let ReconcileError::RenderFailed { lane, source } = h.scheduler.flush_microtasks().unwrap_err();

    assert_eq!(lane, Lanes::SYNC);
    assert_eq!(
        source,
        RenderError::HookCountMismatch {
            component: "Toggled".to_string(),
            expected: 2,
            found: 1,
        }
    );
    // The committed tree is untouched and the lane stays pending.
    assert_eq!(h.markup(), "1");
    assert!(h.root.pending_lanes().includes(Lanes::SYNC));
    assert!(!h.root.has_scheduled_callback());
}

#[test]
fn adding_a_binding_fails_the_render() {
    let h = Harness::new();
    let toggled = Component::new("Toggled", |props, hooks| {
        let (value, _) = hooks.use_state(1_i64)?;
        if props.get("extra").is_some() {
            hooks.use_effect(|| None, None)?;
        }
        Ok(VNode::text(value))
    });
    h.render(Element::component(&toggled));

    h.root.render(Element::component(&toggled).attr("extra", true));
    let err = h.scheduler.flush_microtasks().unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::RenderFailed {
            source: RenderError::HookCountMismatch { expected: 1, found: 2, .. },
            ..
        }
    ));
}

#[test]
fn failed_render_is_restarted_once() {
    let h = Harness::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counted = attempts.clone();
    let flaky = Component::new("Flaky", move |_props, _hooks| {
        if counted.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(RenderError::component("Flaky", "first attempt"));
        }
        Ok("ok".into())
    });

    h.render(flaky.element());

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(h.markup(), "ok");
}

#[test]
fn persistent_failure_surfaces_and_root_recovers() {
    let h = Harness::new();
    let attempts = Arc::new(AtomicUsize::new(0));
    let counted = attempts.clone();
    let broken = Component::new("Broken", move |_props, _hooks| {
        counted.fetch_add(1, Ordering::SeqCst);
        Err(RenderError::component("Broken", "always"))
    });

    h.root.render(broken.element());
    let err = h.scheduler.flush_microtasks().unwrap_err();

    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(
        err,
        ReconcileError::RenderFailed {
            lane: Lanes::SYNC,
            source: RenderError::component("Broken", "always"),
        }
    );
    assert_eq!(h.markup(), "");

    // A later update schedules the root again and replaces the broken tree.
    h.render(Element::host("p").child("recovered"));
    assert_eq!(h.markup(), "<p>recovered</p>");
    assert!(h.root.pending_lanes().is_empty());
}

/// Unmount destroys run before stale destroys, which run before creates.
#[test]
fn passive_effects_run_in_phase_order() {
    let h = Harness::new();
    let log: Log = Arc::default();
    let (x, y, z) = (tracked("x", &log), tracked("y", &log), tracked("z", &log));
    let tree = |dep: i64, with_z: bool| {
        let mut children: Vec<VNode> = vec![
            Element::component(&x).key("x").attr("dep", dep).into(),
            Element::component(&y).key("y").attr("dep", dep).into(),
        ];
        if with_z {
            children.push(Element::component(&z).key("z").attr("dep", dep).into());
        }
        VNode::list(children)
    };

    h.render(tree(1, true));
    assert_eq!(*log.lock(), ["create x", "create y", "create z"]);
    log.lock().clear();

    h.render(tree(2, false));
    assert_eq!(
        *log.lock(),
        ["destroy z", "destroy x", "destroy y", "create x", "create y"]
    );
    log.lock().clear();

    // Same dependencies: nothing runs.
    h.render(tree(2, false));
    assert!(log.lock().is_empty());
}

#[test]
fn child_effects_run_before_parent_effects() {
    let h = Harness::new();
    let log: Log = Arc::default();
    let inner = tracked("inner", &log);
    let other = tracked("other", &log);
    let outer = {
        let log = log.clone();
        Component::new("outer", move |props, hooks| {
            let dep = props.get("dep").cloned().unwrap_or(Value::Null);
            let log = log.clone();
            hooks.use_effect(
                move || {
                    log.lock().push("create outer".to_string());
                    let cleanup = log.clone();
                    Some(Box::new(move || cleanup.lock().push("destroy outer".to_string())) as Destroy)
                },
                Some(vec![dep.clone()]),
            )?;
            Ok(Element::host("div")
                .child(Element::component(&inner).attr("dep", dep))
                .into())
        })
    };
    let tree = |dep: i64| {
        VNode::list([
            Element::component(&outer).key("outer").attr("dep", dep),
            Element::component(&other).key("other"),
        ])
    };

    h.render(tree(1));
    assert_eq!(*log.lock(), ["create inner", "create outer", "create other"]);
    log.lock().clear();

    h.render(tree(2));
    assert_eq!(
        *log.lock(),
        ["destroy inner", "destroy outer", "create inner", "create outer"]
    );
}

#[test]
fn effects_flush_after_commit_not_during_it() {
    let h = Harness::new();
    let log: Log = Arc::default();
    let watcher = tracked("w", &log);

    h.root.render(watcher.element());
    h.scheduler.flush_microtasks().unwrap();

    // Committed, with the flush still waiting as its own task.
    assert!(log.lock().is_empty());
    assert_eq!(h.scheduler.pending_tasks(), 1);

    assert!(h.root.flush_passive_effects().unwrap());
    assert_eq!(*log.lock(), ["create w"]);
    assert!(!h.root.flush_passive_effects().unwrap());
}

#[test]
fn effect_can_update_state() {
    let h = Harness::new();
    let loader = Component::new("Loader", |_props, hooks| {
        let (loaded, set_loaded) = hooks.use_state(false)?;
        hooks.use_effect(
            move || {
                set_loaded.set(true);
                None
            },
            Some(vec![]),
        )?;
        Ok(if loaded { "ready" } else { "loading" }.into())
    });

    h.render(loader.element());

    assert_eq!(h.markup(), "ready");
}

#[test]
fn unmount_removes_everything_and_runs_cleanups() {
    let h = Harness::new();
    let log: Log = Arc::default();
    let watcher = tracked("w", &log);
    h.render(
        Element::host("section")
            .child(vec![VNode::from(Element::component(&watcher)), item("a")]),
    );
    h.render(
        Element::host("section")
            .child(vec![VNode::from(Element::component(&watcher)), item("a")]),
    );
    assert_eq!(h.markup(), "<section><li>a</li></section>");

    h.root.unmount();
    h.scheduler.run_until_idle().unwrap();

    assert_eq!(h.markup(), "");
    assert_eq!(*log.lock(), ["create w", "destroy w"]);
    // Only the two generations of the host root remain.
    assert_eq!(h.root.node_count(), 2);
}

#[test]
fn transition_updates_render_after_urgent_ones() {
    let h = Harness::new();
    let slot: Slot<(StateSetter<i64>, Transition)> = Arc::default();
    let handles = slot.clone();
    let search = Component::new("Search", move |_props, hooks| {
        let (value, set_value) = hooks.use_state(0_i64)?;
        let (pending, transition) = hooks.use_transition()?;
        *handles.lock() = Some((set_value, transition));
        let suffix = if pending { " (pending)" } else { "" };
        Ok(VNode::text(format!("{value}{suffix}")))
    });
    h.render(search.element());
    assert_eq!(h.markup(), "0");

    let (set_value, transition) = slot.lock().clone().unwrap();
    transition.start(|| set_value.set(5));
    assert_eq!(h.root.pending_lanes(), Lanes::DEFAULT | Lanes::TRANSITION);

    // The pending flag commits first, in its own pass.
    assert!(h.scheduler.run_next_task().unwrap());
    assert_eq!(h.markup(), "0 (pending)");
    assert_eq!(h.root.pending_lanes(), Lanes::TRANSITION);

    h.scheduler.run_until_idle().unwrap();
    assert_eq!(h.markup(), "5");
}

#[test]
fn config_sets_the_passive_flush_priority() {
    let config =
        ReconcilerConfig::from_json(r#"{"passive_effect_priority": "idle"}"#).unwrap();
    assert_eq!(config.passive_effect_priority, SchedulerPriority::Idle);

    let host = MemoryHost::new();
    let container = host.create_container();
    let scheduler = ManualScheduler::new();
    let root = Root::with_config(container, host.clone(), scheduler.clone(), config);
    assert_eq!(root.config().passive_effect_priority, SchedulerPriority::Idle);

    let log: Log = Arc::default();
    let watcher = tracked("w", &log);
    root.render(watcher.element());
    scheduler.flush_microtasks().unwrap();
    assert_eq!(scheduler.pending_tasks(), 1);
    assert!(log.lock().is_empty());

    scheduler.run_until_idle().unwrap();
    assert_eq!(*log.lock(), ["create w"]);
}

/// A render task first runs effects left over by the previous commit.
#[test]
fn render_task_flushes_leftover_effects_first() {
    let host = MemoryHost::new();
    let container = host.create_container();
    let scheduler = ManualScheduler::new();
    let config = ReconcilerConfig {
        passive_effect_priority: SchedulerPriority::Idle,
        ..ReconcilerConfig::default()
    };
    let root = Root::with_config(container, host.clone(), scheduler.clone(), config);

    let log: Log = Arc::default();
    let watcher = tracked("w", &log);
    let slot: Slot<StateSetter<i64>> = Arc::default();
    root.render(VNode::list([
        Element::component(&watcher),
        counter(&slot).element(),
    ]));
    scheduler.flush_microtasks().unwrap();
    assert!(log.lock().is_empty());

    // The render task outranks the idle flush, so it runs the effects itself.
    slot.lock().clone().unwrap().set(3);
    assert!(scheduler.run_next_task().unwrap());
    assert_eq!(*log.lock(), ["create w"]);
    assert_eq!(host.markup(container), "3");

    scheduler.run_until_idle().unwrap();
    assert_eq!(*log.lock(), ["create w"]);
}
