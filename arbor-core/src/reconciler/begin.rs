//! Begin Phase
//!
//! The top-down step of a unit of work: work out a node's new children and
//! reconcile them against the committed ones. Function components run their
//! body here.

use std::sync::Arc;

use super::child::ChildReconciler;
use super::root::{FiberRoot, RootInner};
use crate::element::{ElementKind, Props, VNode};
use crate::error::RenderError;
use crate::fiber::{Flags, LocalState, NodeId, NodeProps, WorkTag};
use crate::hooks::Hooks;
use crate::scheduler::Lanes;

/// Begin `wip` and return the first child to work on next, if any.
pub(crate) fn begin_work(
    root: &RootInner,
    work: &mut FiberRoot,
    wip: NodeId,
    lanes: Lanes,
) -> Result<Option<NodeId>, RenderError> {
    match work.arena[wip].tag {
        WorkTag::HostRoot => update_host_root(root, work, wip, lanes),
        WorkTag::HostComponent | WorkTag::Fragment => {
            let children = match &work.arena[wip].pending_props {
                NodeProps::Element(props) => props.children().clone(),
                NodeProps::Fragment(children) => children.clone(),
                other => {
                    dev_warn!(root.config.dev_diagnostics, props = ?other, "unsupported props for a container node; skipping");
                    return Ok(None);
                }
            };
            Ok(reconcile_children(root, work, wip, &children))
        }
        WorkTag::HostText => Ok(None),
        WorkTag::FunctionComponent => update_function_component(root, work, wip, lanes),
    }
}

fn update_host_root(
    root: &RootInner,
    work: &mut FiberRoot,
    wip: NodeId,
    lanes: Lanes,
) -> Result<Option<NodeId>, RenderError> {
    let Some(current) = work.arena[wip].alternate else {
        dev_warn!(root.config.dev_diagnostics, "host root has no committed counterpart");
        return Ok(None);
    };
    let LocalState::Root(mut committed) = std::mem::take(&mut work.arena[current].memoized_state) else {
        dev_warn!(root.config.dev_diagnostics, "host root carries no update queue");
        return Ok(None);
    };

    let (next, skipped) = committed.rebase(lanes);
    work.arena[current].memoized_state = LocalState::Root(committed);
    let tree = next.memoized.downcast_ref::<VNode>().cloned();
    work.arena[wip].memoized_state = LocalState::Root(next);
    work.mark_skipped(skipped);

    let Some(tree) = tree else {
        return Err(RenderError::StateTypeMismatch {
            component: "root".to_string(),
            index: 0,
        });
    };
    Ok(reconcile_children(root, work, wip, &tree))
}

fn update_function_component(
    root: &RootInner,
    work: &mut FiberRoot,
    wip: NodeId,
    lanes: Lanes,
) -> Result<Option<NodeId>, RenderError> {
    let Some(ElementKind::Component(component)) = work.arena[wip].element_type.clone() else {
        dev_warn!(root.config.dev_diagnostics, node = wip.index(), "function node without a component; skipping");
        return Ok(None);
    };
    let props = match &work.arena[wip].pending_props {
        NodeProps::Element(props) => props.clone(),
        _ => Arc::new(Props::default()),
    };

    // The committed records are borrowed out of the current node for the
    // duration of the body and put back whatever the outcome.
    let current = work.arena[wip].alternate;
    let mut previous = match current {
        Some(current) => match std::mem::take(&mut work.arena[current].memoized_state) {
            LocalState::Hooks(hooks) => Some(hooks),
            other => {
                work.arena[current].memoized_state = other;
                None
            }
        },
        None => None,
    };

    let result = {
        let mut hooks = Hooks::new(component.name(), previous.as_mut(), lanes, root.update_target());
        match component.render(&props, &mut hooks) {
            Ok(children) => hooks.finish().map(|output| (children, output)),
            Err(err) => Err(err),
        }
    };

    if let (Some(current), Some(previous)) = (current, previous) {
        work.arena[current].memoized_state = LocalState::Hooks(previous);
    }
    let (children, output) = result?;

    let node = &mut work.arena[wip];
    node.memoized_state = LocalState::Hooks(output.hooks);
    if output.has_passive_effect {
        node.flags |= Flags::PASSIVE_EFFECT;
    }
    work.mark_skipped(output.skipped_lanes);
    Ok(reconcile_children(root, work, wip, &children))
}

/// Reconcile `children` into `wip`. A node with no committed counterpart is
/// mounting, so its children are not tagged.
fn reconcile_children(
    root: &RootInner,
    work: &mut FiberRoot,
    wip: NodeId,
    children: &VNode,
) -> Option<NodeId> {
    let current = work.arena[wip].alternate;
    let current_first = current.and_then(|c| work.arena[c].child);
    let first = ChildReconciler::new(&mut work.arena, wip, current.is_some())
        .with_diagnostics(root.config.dev_diagnostics)
        .reconcile(current_first, children);
    work.arena[wip].child = first;
    first
}
