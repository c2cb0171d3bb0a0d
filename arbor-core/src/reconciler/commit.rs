//! Commit Engine
//!
//! Applies a finished tree to the host in one sweep. The sweep only
//! descends into subtrees whose `subtree_flags` say something inside needs
//! work. A node's own host mutations are applied before its children are
//! visited, and its passive effects are queued after them, so effects fire
//! children first. The finished tree becomes current only after the sweep.

use std::sync::Arc;

use tracing::debug;

use super::root::{FiberRoot, RootInner};
use crate::fiber::{Flags, Node, NodeId, WorkTag};
use crate::hooks::{Effect, Hook};
use crate::host::HostHandle;
use crate::scheduler::Lanes;

/// Commit the root's finished work, if there is any.
pub(crate) fn commit_root(root: &RootInner, work: &mut FiberRoot) {
    let diagnostics = root.config.dev_diagnostics;
    let Some(finished) = work.finished_work.take() else {
        dev_warn!(diagnostics, "commit phase entered with nothing to commit");
        return;
    };
    let lanes = work.finished_lanes;
    if lanes.is_empty() {
        dev_warn!(diagnostics, "finished lane is unset at commit");
    }

    // Effects of an earlier commit must not interleave with this one.
    if !work.pending_passive.is_empty() {
        std::mem::take(&mut work.pending_passive).run();
    }

    {
        let mut schedule = root.schedule.lock();
        schedule.pending_lanes =
            schedule.pending_lanes.remove(lanes) | work.remaining_lanes | schedule.interleaved_lanes;
        schedule.interleaved_lanes = Lanes::NONE;
        schedule.clear_callback();
    }
    work.finished_lanes = Lanes::NONE;
    work.remaining_lanes = Lanes::NONE;

    let mut sweep = MutationSweep {
        work: &mut *work,
        diagnostics,
        removed: 0,
    };
    sweep.commit_node(finished);
    let removed = sweep.removed;

    work.current = finished;
    work.arena.keep_fresh();
    debug!(lanes = ?lanes, removed, nodes = work.arena.len(), "committed root");

    root.schedule_passive_flush(work);
}

struct MutationSweep<'a> {
    work: &'a mut FiberRoot,
    diagnostics: bool,
    /// Work nodes freed by deletions.
    removed: usize,
}

impl MutationSweep<'_> {
    fn commit_node(&mut self, id: NodeId) {
        let flags = self.work.arena[id].flags;

        if flags.contains(Flags::PLACEMENT) {
            self.commit_placement(id);
            self.work.arena[id].flags.remove(Flags::PLACEMENT);
        }
        if flags.contains(Flags::UPDATE) {
            self.commit_update(id);
        }
        if flags.contains(Flags::CHILD_DELETION) {
            let deletions = std::mem::take(&mut self.work.arena[id].deletions);
            for deleted in deletions {
                self.commit_deletion(id, deleted);
            }
        }

        if self.work.arena[id]
            .subtree_flags
            .intersects(Flags::MUTATION_MASK | Flags::PASSIVE_MASK)
        {
            let mut child = self.work.arena[id].child;
            while let Some(c) = child {
                self.commit_node(c);
                child = self.work.arena[c].sibling;
            }
        }

        // Queued on the way back up, so children's effects run before their parent's.
        if flags.contains(Flags::PASSIVE_EFFECT) {
            let effects: Vec<Arc<Effect>> = effects_of(&self.work.arena[id])
                .filter(|effect| effect.needs_run())
                .collect();
            self.work.pending_passive.update.extend(effects);
        }
    }

    /// Nearest ancestor that owns a host object children can be inserted into.
    fn host_parent(&self, id: NodeId) -> Option<HostHandle> {
        let arena = &self.work.arena;
        let mut parent = arena[id].parent;
        while let Some(p) = parent {
            match arena[p].tag {
                WorkTag::HostRoot => return Some(self.work.container),
                WorkTag::HostComponent => return arena[p].state_node,
                _ => parent = arena[p].parent,
            }
        }
        None
    }

    /// Host object of the first following host node that is already in
    /// place, which is where `id`'s host output goes before.
    fn host_sibling(&self, id: NodeId) -> Option<HostHandle> {
        let arena = &self.work.arena;
        let mut node = id;
        'siblings: loop {
            while arena[node].sibling.is_none() {
                match arena[node].parent {
                    Some(parent) if !arena[parent].tag.is_host_parent() => node = parent,
                    _ => return None,
                }
            }
            node = arena[node].sibling?;

            while !arena[node].tag.is_host() {
                if arena[node].flags.contains(Flags::PLACEMENT) {
                    continue 'siblings;
                }
                match arena[node].child {
                    Some(child) => node = child,
                    None => continue 'siblings,
                }
            }

            if !arena[node].flags.contains(Flags::PLACEMENT) {
                return arena[node].state_node;
            }
        }
    }

    fn commit_placement(&mut self, id: NodeId) {
        let Some(parent) = self.host_parent(id) else {
            dev_warn!(self.diagnostics, node = id.index(), "missing host parent for placement; skipping");
            return;
        };
        let before = self.host_sibling(id);
        self.insert_or_append(id, before, parent);
    }

    fn insert_or_append(&mut self, id: NodeId, before: Option<HostHandle>, parent: HostHandle) {
        let node = &self.work.arena[id];
        if node.tag.is_host() {
            let Some(handle) = node.state_node else {
                dev_warn!(self.diagnostics, node = id.index(), "placed host node has no host object");
                return;
            };
            match before {
                Some(before) => self.work.host.insert_before(parent, handle, before),
                None => self.work.host.append_child(parent, handle),
            }
            return;
        }

        let mut child = node.child;
        while let Some(c) = child {
            self.insert_or_append(c, before, parent);
            child = self.work.arena[c].sibling;
        }
    }

    fn commit_update(&mut self, id: NodeId) {
        let node = &self.work.arena[id];
        let Some(handle) = node.state_node else {
            return;
        };
        let tag = node.tag;
        match tag {
            WorkTag::HostComponent => {
                if let Some(diff) = self.work.arena[id].update_payload.take() {
                    self.work.host.commit_update(handle, &diff);
                }
            }
            WorkTag::HostText => {
                let Some(next) = Node::text(node.memoized_props.as_ref()).map(str::to_string) else {
                    return;
                };
                let previous = node
                    .alternate
                    .and_then(|alt| Node::text(self.work.arena[alt].memoized_props.as_ref()));
                if previous != Some(next.as_str()) {
                    self.work.host.commit_text_update(handle, &next);
                }
            }
            _ => {}
        }
    }

    /// Remove the host output of the deleted subtree under `parent`, queue
    /// its effects for unmount, and free its nodes.
    fn commit_deletion(&mut self, parent: NodeId, deleted: NodeId) {
        let mut hosts = Vec::new();
        let mut nodes = Vec::new();
        self.collect_deleted(deleted, false, &mut hosts, &mut nodes);

        if !hosts.is_empty() {
            let container = if self.work.arena[parent].tag.is_host_parent() {
                match self.work.arena[parent].tag {
                    WorkTag::HostRoot => Some(self.work.container),
                    _ => self.work.arena[parent].state_node,
                }
            } else {
                self.host_parent(parent)
            };
            match container {
                Some(container) => {
                    for handle in hosts {
                        self.work.host.remove_child(container, handle);
                    }
                }
                None => {
                    dev_warn!(self.diagnostics, node = deleted.index(), "missing host parent for deletion; skipping");
                }
            }
        }

        for id in nodes {
            let alternate = self.work.arena[id].alternate;
            self.work.arena.free(id);
            self.removed += 1;
            if let Some(alternate) = alternate {
                self.work.arena.free(alternate);
                self.removed += 1;
            }
        }
    }

    /// Walk a deleted subtree. Only the topmost host objects are removed;
    /// their descendants leave with them.
    fn collect_deleted(
        &mut self,
        id: NodeId,
        inside_host: bool,
        hosts: &mut Vec<HostHandle>,
        nodes: &mut Vec<NodeId>,
    ) {
        nodes.push(id);
        let node = &self.work.arena[id];
        let mut inside = inside_host;
        match node.tag {
            WorkTag::HostComponent | WorkTag::HostText => {
                if !inside_host {
                    if let Some(handle) = node.state_node {
                        hosts.push(handle);
                    }
                }
                inside = true;
            }
            WorkTag::FunctionComponent => {
                let effects: Vec<Arc<Effect>> = effects_of(node).collect();
                self.work.pending_passive.unmount.extend(effects);
            }
            WorkTag::HostRoot | WorkTag::Fragment => {}
        }

        let mut child = self.work.arena[id].child;
        while let Some(c) = child {
            self.collect_deleted(c, inside, hosts, nodes);
            child = self.work.arena[c].sibling;
        }
    }
}

fn effects_of(node: &Node) -> impl Iterator<Item = Arc<Effect>> + '_ {
    node.memoized_state.hooks().iter().filter_map(|hook| match hook {
        Hook::Effect(effect) => Some(effect.clone()),
        _ => None,
    })
}
