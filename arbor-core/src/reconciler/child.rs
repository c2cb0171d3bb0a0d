//! Child Reconciliation
//!
//! Given a work-in-progress parent, the first child of its committed
//! counterpart and a fresh description of its children, build the new child
//! list. Committed nodes are reused through `clone_for_work` whenever key and
//! type match; everything else is created fresh or recorded for deletion on
//! the parent.
//!
//! # Keyed lists
//!
//! Lists are matched in a single left-to-right pass. Old children are looked
//! up by key, or by position when unkeyed. `last_placed` is the highest old
//! index reused so far: a reused node whose old index is lower has moved
//! backward and is tagged for placement, anything else stays in place. This
//! can tag more moves than strictly necessary (a reversal moves every node
//! but the first one visited) and that behavior is kept as is.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::element::{Element, ElementKind, VNode};
use crate::fiber::{Arena, Flags, Node, NodeId, NodeProps, WorkTag};

/// Identity of an old child within its sibling run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ChildKey {
    Named(Arc<str>),
    Index(usize),
}

pub(crate) struct ChildReconciler<'a> {
    arena: &'a mut Arena,
    parent: NodeId,
    /// False while mounting a new subtree: nothing is tagged, since the
    /// subtree is inserted as a whole by its topmost placed ancestor.
    track_effects: bool,
    diagnostics: bool,
}

impl<'a> ChildReconciler<'a> {
    pub(crate) fn new(arena: &'a mut Arena, parent: NodeId, track_effects: bool) -> Self {
        Self {
            arena,
            parent,
            track_effects,
            diagnostics: false,
        }
    }

    /// Enable development warnings, such as for duplicate keys.
    pub(crate) fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Reconcile `new_child` against the old run starting at `current_first`
    /// and return the new first child.
    pub(crate) fn reconcile(
        &mut self,
        current_first: Option<NodeId>,
        new_child: &VNode,
    ) -> Option<NodeId> {
        // An unkeyed fragment at the top behaves like its children.
        let unwrapped;
        let new_child = match new_child {
            VNode::Element(element)
                if element.key_ref().is_none() && *element.kind() == ElementKind::Fragment =>
            {
                unwrapped = element.props().children().clone();
                &unwrapped
            }
            other => other,
        };

        match new_child {
            VNode::Element(element) => {
                let node = self.reconcile_single_element(current_first, element);
                Some(self.place_single_child(node))
            }
            VNode::Text(text) => {
                let node = self.reconcile_single_text(current_first, text);
                Some(self.place_single_child(node))
            }
            VNode::List(items) => self.reconcile_children_array(current_first, items),
            VNode::Empty => {
                self.delete_remaining(current_first);
                None
            }
        }
    }

    fn delete_child(&mut self, child: NodeId) {
        if !self.track_effects {
            return;
        }
        let parent = &mut self.arena[self.parent];
        parent.deletions.push(child);
        parent.flags |= Flags::CHILD_DELETION;
    }

    fn delete_remaining(&mut self, mut child: Option<NodeId>) {
        if !self.track_effects {
            return;
        }
        while let Some(id) = child {
            self.delete_child(id);
            child = self.arena[id].sibling;
        }
    }

    /// Reuse `current` for the new pass.
    fn use_node(&mut self, current: NodeId, props: NodeProps) -> NodeId {
        let id = self.arena.clone_for_work(current, props);
        let node = &mut self.arena[id];
        node.index = 0;
        node.sibling = None;
        node.parent = Some(self.parent);
        id
    }

    fn create_node(&mut self, mut node: Node) -> NodeId {
        node.parent = Some(self.parent);
        self.arena.alloc_fresh(node)
    }

    fn create_from_element(&mut self, element: &Element) -> NodeId {
        let tag = match element.kind() {
            ElementKind::Host(_) => WorkTag::HostComponent,
            ElementKind::Component(_) => WorkTag::FunctionComponent,
            ElementKind::Fragment => WorkTag::Fragment,
        };
        let mut node = Node::new(tag, element.key_ref().cloned(), props_for(element));
        if tag != WorkTag::Fragment {
            node.element_type = Some(element.kind().clone());
        }
        self.create_node(node)
    }

    fn create_text(&mut self, text: &Arc<str>) -> NodeId {
        self.create_node(Node::new(WorkTag::HostText, None, NodeProps::Text(text.clone())))
    }

    fn create_fragment(&mut self, children: VNode) -> NodeId {
        self.create_node(Node::new(WorkTag::Fragment, None, NodeProps::Fragment(children)))
    }

    fn place_single_child(&mut self, node: NodeId) -> NodeId {
        if self.track_effects && self.arena[node].alternate.is_none() {
            self.arena[node].flags |= Flags::PLACEMENT;
        }
        node
    }

    /// Record the new position of `node` and decide whether it moves.
    fn place_child(&mut self, node: NodeId, last_placed: usize, new_index: usize) -> usize {
        self.arena[node].index = new_index;
        if !self.track_effects {
            return last_placed;
        }
        match self.arena[node].alternate {
            Some(current) => {
                let old_index = self.arena[current].index;
                if old_index < last_placed {
                    self.arena[node].flags |= Flags::PLACEMENT;
                    last_placed
                } else {
                    old_index
                }
            }
            None => {
                self.arena[node].flags |= Flags::PLACEMENT;
                last_placed
            }
        }
    }

    fn reconcile_single_element(&mut self, current_first: Option<NodeId>, element: &Element) -> NodeId {
        let key = element.key_ref().map(|k| &**k);
        let mut child = current_first;
        while let Some(id) = child {
            if self.arena[id].key.as_deref() == key {
                if self.arena[id].has_type(element.kind()) {
                    let rest = self.arena[id].sibling;
                    self.delete_remaining(rest);
                    return self.use_node(id, props_for(element));
                }
                // Same key but a different type: nothing after it can match.
                self.delete_remaining(Some(id));
                break;
            }
            self.delete_child(id);
            child = self.arena[id].sibling;
        }
        self.create_from_element(element)
    }

    fn reconcile_single_text(&mut self, current_first: Option<NodeId>, text: &Arc<str>) -> NodeId {
        if let Some(id) = current_first {
            if self.arena[id].tag == WorkTag::HostText {
                let rest = self.arena[id].sibling;
                self.delete_remaining(rest);
                return self.use_node(id, NodeProps::Text(text.clone()));
            }
        }
        self.delete_remaining(current_first);
        self.create_text(text)
    }

    fn reconcile_children_array(&mut self, current_first: Option<NodeId>, items: &[VNode]) -> Option<NodeId> {
        let mut existing: IndexMap<ChildKey, NodeId> = IndexMap::new();
        let mut old = current_first;
        while let Some(id) = old {
            let node = &self.arena[id];
            let key = match &node.key {
                Some(key) => ChildKey::Named(key.clone()),
                None => ChildKey::Index(node.index),
            };
            let sibling = node.sibling;
            if let Some(displaced) = existing.insert(key, id) {
                dev_warn!(
                    self.diagnostics,
                    parent = self.parent.index(),
                    key = ?self.arena[id].key,
                    "duplicate key among siblings; the earlier child is deleted"
                );
                self.delete_child(displaced);
            }
            old = sibling;
        }

        let mut first = None;
        let mut previous: Option<NodeId> = None;
        let mut last_placed = 0;

        for (index, item) in items.iter().enumerate() {
            let Some(node) = self.update_from_map(&mut existing, index, item) else {
                continue;
            };
            last_placed = self.place_child(node, last_placed, index);
            match previous {
                Some(prev) => self.arena[prev].sibling = Some(node),
                None => first = Some(node),
            }
            previous = Some(node);
        }

        for (_, leftover) in existing {
            self.delete_child(leftover);
        }
        trace!(parent = self.parent.index(), items = items.len(), "reconciled child list");
        first
    }

    /// Build the node for list slot `index`, reusing a matching old child.
    fn update_from_map(
        &mut self,
        existing: &mut IndexMap<ChildKey, NodeId>,
        index: usize,
        item: &VNode,
    ) -> Option<NodeId> {
        let key = match item {
            VNode::Empty => return None,
            VNode::Element(element) => match element.key_ref() {
                Some(key) => ChildKey::Named(key.clone()),
                None => ChildKey::Index(index),
            },
            VNode::Text(_) | VNode::List(_) => ChildKey::Index(index),
        };
        let matched = existing.get(&key).copied();

        let node = match item {
            VNode::Element(element) => match matched {
                Some(old) if self.arena[old].has_type(element.kind()) => {
                    self.use_node(old, props_for(element))
                }
                _ => self.create_from_element(element),
            },
            VNode::Text(text) => match matched {
                Some(old) if self.arena[old].tag == WorkTag::HostText => {
                    self.use_node(old, NodeProps::Text(text.clone()))
                }
                _ => self.create_text(text),
            },
            VNode::List(children) => {
                let children = VNode::List(children.clone());
                match matched {
                    Some(old) if self.arena[old].tag == WorkTag::Fragment => {
                        self.use_node(old, NodeProps::Fragment(children))
                    }
                    _ => self.create_fragment(children),
                }
            }
            VNode::Empty => return None,
        };

        if matched.is_some() && self.arena[node].alternate == matched {
            existing.shift_remove(&key);
        }
        Some(node)
    }
}

/// What a node created or reused for `element` renders from.
fn props_for(element: &Element) -> NodeProps {
    match element.kind() {
        ElementKind::Fragment => NodeProps::Fragment(element.props().children().clone()),
        _ => NodeProps::Element(element.props().clone()),
    }
}
