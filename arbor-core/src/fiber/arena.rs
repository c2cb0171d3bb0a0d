//! Node Arena
//!
//! All work nodes of a root live in one slot vector. Freed slots are reused,
//! and nodes allocated during a render attempt are journaled so the attempt
//! can be thrown away without leaking slots.

use std::ops::{Index, IndexMut};

use super::{Flags, Node, NodeId, NodeProps};

#[derive(Debug, Default)]
pub struct Arena {
    slots: Vec<Option<Node>>,
    free: Vec<NodeId>,
    /// Nodes allocated by the render attempt in progress.
    fresh: Vec<NodeId>,
}

impl Arena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node outside of any render attempt.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId::from_index(self.slots.len() - 1)
            }
        }
    }

    /// Store a node created by the current render attempt.
    pub fn alloc_fresh(&mut self, node: Node) -> NodeId {
        let id = self.alloc(node);
        self.fresh.push(id);
        id
    }

    /// Release a slot. The counterpart's `alternate` link is cleared so no
    /// live node points at a reusable slot.
    pub fn free(&mut self, id: NodeId) {
        let Some(node) = self.slots.get_mut(id.index()).and_then(Option::take) else {
            return;
        };
        if let Some(alternate) = node.alternate {
            if let Some(other) = self.get_mut(alternate) {
                if other.alternate == Some(id) {
                    other.alternate = None;
                }
            }
        }
        self.free.push(id);
    }

    /// Get a live node, or `None` if the slot was freed.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a live node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Check whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free every node the abandoned render attempt allocated.
    pub fn discard_fresh(&mut self) {
        for id in std::mem::take(&mut self.fresh) {
            self.free(id);
        }
    }

    /// The attempt was committed; its nodes are now part of the tree.
    pub fn keep_fresh(&mut self) {
        self.fresh.clear();
    }

    /// Return the work-in-progress counterpart of `current`, rendering from
    /// `props`.
    ///
    /// The first call for a position allocates the alternate and links both
    /// ways. Later calls reset the existing alternate's effect bookkeeping and
    /// copy the committed fields over, so the children still point at the
    /// current generation until reconciliation replaces them.
    pub fn clone_for_work(&mut self, current: NodeId, props: NodeProps) -> NodeId {
        let source = &self[current];
        let tag = source.tag;
        let key = source.key.clone();
        let element_type = source.element_type.clone();
        let parent = source.parent;
        let child = source.child;
        let sibling = source.sibling;
        let index = source.index;
        let memoized_props = source.memoized_props.clone();
        let memoized_state = source.memoized_state.clone();
        let state_node = source.state_node;
        let alternate = source.alternate;

        let wip = match alternate {
            Some(existing) if self.contains(existing) => {
                let node = &mut self[existing];
                node.pending_props = props;
                node.flags = Flags::NONE;
                node.subtree_flags = Flags::NONE;
                node.deletions.clear();
                node.update_payload = None;
                existing
            }
            _ => {
                let mut node = Node::new(tag, key.clone(), props);
                node.alternate = Some(current);
                let id = self.alloc_fresh(node);
                self[current].alternate = Some(id);
                id
            }
        };

        let node = &mut self[wip];
        node.tag = tag;
        node.key = key;
        node.element_type = element_type;
        node.parent = parent;
        node.child = child;
        node.sibling = sibling;
        node.index = index;
        node.memoized_props = memoized_props;
        node.memoized_state = memoized_state;
        node.state_node = state_node;
        wip
    }
}

impl Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {} was freed", id.index()),
        }
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("node {} was freed", id.index()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::WorkTag;

    fn text(content: &str) -> Node {
        Node::new(WorkTag::HostText, None, NodeProps::Text(content.into()))
    }

    #[test]
    fn clone_for_work_links_alternates_once() {
        let mut arena = Arena::new();
        let current = arena.alloc(text("a"));

        let wip = arena.clone_for_work(current, NodeProps::Text("b".into()));
        assert_eq!(arena[wip].alternate, Some(current));
        assert_eq!(arena[current].alternate, Some(wip));

        arena[wip].flags = Flags::UPDATE;
        let again = arena.clone_for_work(current, NodeProps::Text("c".into()));
        assert_eq!(again, wip);
        assert_eq!(arena[again].flags, Flags::NONE);
        assert_eq!(arena[again].pending_props, NodeProps::Text("c".into()));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn discarding_an_attempt_frees_its_nodes() {
        let mut arena = Arena::new();
        let current = arena.alloc(text("a"));
        let wip = arena.clone_for_work(current, NodeProps::Text("b".into()));
        arena.alloc_fresh(text("c"));

        arena.discard_fresh();
        assert_eq!(arena.len(), 1);
        assert!(!arena.contains(wip));
        assert_eq!(arena[current].alternate, None);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut arena = Arena::new();
        let a = arena.alloc(text("a"));
        arena.free(a);
        arena.free(a);
        let b = arena.alloc(text("b"));
        assert_eq!(a, b);
        assert_eq!(arena.len(), 1);
    }
}
