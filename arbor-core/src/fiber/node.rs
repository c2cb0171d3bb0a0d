//! Work Nodes
//!
//! This module defines the node that represents one tree position for one
//! render pass. Nodes live in an [`Arena`](super::Arena) and refer to each
//! other by [`NodeId`].

use std::sync::Arc;

use smallvec::SmallVec;

use super::Flags;
use crate::element::{ElementKind, Props, VNode};
use crate::hooks::{Hook, StateHook};
use crate::host::{HostHandle, PropDiff};

/// Index of a node slot in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Get the slot index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// What kind of tree position a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkTag {
    /// The top of a mounted tree. Its host parent is the root container.
    HostRoot,
    /// A host element such as `"div"`.
    HostComponent,
    /// A host text object.
    HostText,
    FunctionComponent,
    /// Groups children without a host object of its own.
    Fragment,
}

impl WorkTag {
    /// Whether nodes of this kind own a host object.
    pub fn is_host(self) -> bool {
        matches!(self, WorkTag::HostComponent | WorkTag::HostText)
    }

    /// Whether nodes of this kind can be the host parent of others.
    pub fn is_host_parent(self) -> bool {
        matches!(self, WorkTag::HostComponent | WorkTag::HostRoot)
    }
}

/// Inputs a node renders from.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeProps {
    /// The host root reads its tree from its update queue instead.
    Root,
    /// Host element or component props.
    Element(Arc<Props>),
    Text(Arc<str>),
    /// The children of a fragment or nested list.
    Fragment(VNode),
}

/// Persistent local state carried by a node between renders.
#[derive(Clone, Default)]
pub enum LocalState {
    #[default]
    None,
    /// The host root's queued trees.
    Root(StateHook),
    /// A function component's binding records, in call order.
    Hooks(Vec<Hook>),
}

impl LocalState {
    /// Binding records of a function component, or an empty slice.
    pub fn hooks(&self) -> &[Hook] {
        match self {
            LocalState::Hooks(hooks) => hooks,
            _ => &[],
        }
    }
}

/// One tree position in one generation.
pub struct Node {
    /// What kind of position this is.
    pub tag: WorkTag,
    /// Identity among siblings when set by the element.
    pub key: Option<Arc<str>>,
    /// Host kind or component; `None` for roots, text, and fragments.
    pub element_type: Option<ElementKind>,

    /// Enclosing node; `None` for the host root.
    pub parent: Option<NodeId>,
    /// First child.
    pub child: Option<NodeId>,
    /// Next node in the parent's child list.
    pub sibling: Option<NodeId>,
    /// Position among siblings in the child list that produced this node.
    pub index: usize,

    /// Input for the pass in progress.
    pub pending_props: NodeProps,
    /// Input the node last finished with.
    pub memoized_props: Option<NodeProps>,
    /// Hook records or the root update queue.
    pub memoized_state: LocalState,
    /// Attribute diff computed during completion, applied at commit.
    pub update_payload: Option<PropDiff>,

    /// The same position in the other generation.
    pub alternate: Option<NodeId>,

    /// Work the commit must do for this node.
    pub flags: Flags,
    /// Union of `flags` over all descendants.
    pub subtree_flags: Flags,
    /// Children removed from this node's child list in this pass.
    pub deletions: SmallVec<[NodeId; 2]>,

    /// Host object owned by host elements and text.
    pub state_node: Option<HostHandle>,
}

impl Node {
    pub fn new(tag: WorkTag, key: Option<Arc<str>>, pending_props: NodeProps) -> Self {
        Self {
            tag,
            key,
            element_type: None,
            parent: None,
            child: None,
            sibling: None,
            index: 0,
            pending_props,
            memoized_props: None,
            memoized_state: LocalState::None,
            update_payload: None,
            alternate: None,
            flags: Flags::NONE,
            subtree_flags: Flags::NONE,
            deletions: SmallVec::new(),
            state_node: None,
        }
    }

    /// Whether this node was created from an element of `kind`.
    pub fn has_type(&self, kind: &ElementKind) -> bool {
        match (self.tag, kind) {
            (WorkTag::Fragment, ElementKind::Fragment) => true,
            (WorkTag::HostComponent, ElementKind::Host(_))
            | (WorkTag::FunctionComponent, ElementKind::Component(_)) => {
                self.element_type.as_ref() == Some(kind)
            }
            _ => false,
        }
    }

    /// Text content, for text nodes.
    pub fn text(props: Option<&NodeProps>) -> Option<&str> {
        match props {
            Some(NodeProps::Text(text)) => Some(text),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("tag", &self.tag)
            .field("key", &self.key)
            .field("parent", &self.parent)
            .field("child", &self.child)
            .field("sibling", &self.sibling)
            .field("index", &self.index)
            .field("alternate", &self.alternate)
            .field("flags", &self.flags)
            .field("subtree_flags", &self.subtree_flags)
            .field("state_node", &self.state_node)
            .finish_non_exhaustive()
    }
}
