//! Complete Phase
//!
//! The bottom-up step of a unit of work. New host nodes get a detached host
//! object with all their host descendants appended. Existing host nodes get
//! an attribute diff or a text comparison instead. Every node then folds its
//! children's flags into `subtree_flags`.

use std::sync::Arc;

use super::root::{FiberRoot, RootInner};
use crate::element::ElementKind;
use crate::fiber::{Arena, Flags, Node, NodeId, NodeProps, WorkTag};
use crate::host::{HostConfig, HostHandle};

pub(crate) fn complete_work(root: &RootInner, work: &mut FiberRoot, wip: NodeId) {
    match work.arena[wip].tag {
        WorkTag::HostComponent => complete_host_component(root, work, wip),
        WorkTag::HostText => complete_host_text(work, wip),
        WorkTag::HostRoot | WorkTag::FunctionComponent | WorkTag::Fragment => {}
    }
    bubble_properties(&mut work.arena, wip);
}

fn complete_host_component(root: &RootInner, work: &mut FiberRoot, wip: NodeId) {
    let node = &work.arena[wip];
    let NodeProps::Element(props) = &node.pending_props else {
        dev_warn!(root.config.dev_diagnostics, node = wip.index(), "host node without element props; skipping");
        return;
    };
    let props = props.clone();

    if let (Some(current), Some(_)) = (node.alternate, node.state_node) {
        let old = match &work.arena[current].memoized_props {
            Some(NodeProps::Element(old)) => old.clone(),
            _ => return,
        };
        if Arc::ptr_eq(&old, &props) {
            return;
        }
        if let Some(diff) = old.diff(&props) {
            let node = &mut work.arena[wip];
            node.update_payload = Some(diff);
            node.flags |= Flags::UPDATE;
        }
        return;
    }

    let Some(ElementKind::Host(kind)) = &node.element_type else {
        dev_warn!(root.config.dev_diagnostics, node = wip.index(), "host node without a host kind; skipping");
        return;
    };
    let handle = work.host.create_instance(kind, &props);
    append_all_children(&work.arena, work.host.as_mut(), handle, wip);
    work.arena[wip].state_node = Some(handle);
}

fn complete_host_text(work: &mut FiberRoot, wip: NodeId) {
    let node = &work.arena[wip];
    let Some(text) = Node::text(Some(&node.pending_props)) else {
        return;
    };

    if let (Some(current), Some(_)) = (node.alternate, node.state_node) {
        let old = Node::text(work.arena[current].memoized_props.as_ref());
        if old != Some(text) {
            work.arena[wip].flags |= Flags::UPDATE;
        }
        return;
    }

    let handle = work.host.create_text_instance(text);
    work.arena[wip].state_node = Some(handle);
}

/// Append the nearest host descendants of `wip` to its new host object.
fn append_all_children(arena: &Arena, host: &mut dyn HostConfig, parent: HostHandle, wip: NodeId) {
    let mut node = arena[wip].child;
    while let Some(id) = node {
        let current = &arena[id];
        if current.tag.is_host() {
            if let Some(child) = current.state_node {
                host.append_initial_child(parent, child);
            }
        } else if let Some(child) = current.child {
            node = Some(child);
            continue;
        }

        let mut climb = id;
        loop {
            if let Some(sibling) = arena[climb].sibling {
                node = Some(sibling);
                break;
            }
            match arena[climb].parent {
                Some(up) if up != wip => climb = up,
                _ => return,
            }
        }
    }
}

/// Fold the children's flags into `subtree_flags`.
fn bubble_properties(arena: &mut Arena, wip: NodeId) {
    let mut subtree = Flags::NONE;
    let mut child = arena[wip].child;
    while let Some(id) = child {
        let node = &mut arena[id];
        subtree |= node.subtree_flags | node.flags;
        node.parent = Some(wip);
        child = node.sibling;
    }
    arena[wip].subtree_flags = subtree;
}
