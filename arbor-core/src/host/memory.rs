//! In-Memory Host
//!
//! A [`HostConfig`] that keeps its tree in plain maps and records every call
//! it receives. Handles are numbered in creation order. Re-appending or
//! inserting an attached child moves it, the way a document tree does.
//!
//! `MemoryHost` is a cheap handle over shared state: clone it before handing
//! it to a root to keep inspecting the tree from the outside.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tracing::error;

use super::{HostConfig, HostHandle, PropDiff};
use crate::element::Props;

/// One recorded host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateInstance { handle: HostHandle, kind: String },
    CreateText { handle: HostHandle, content: String },
    AppendInitial { parent: HostHandle, child: HostHandle },
    Append { parent: HostHandle, child: HostHandle },
    InsertBefore { parent: HostHandle, child: HostHandle, before: HostHandle },
    Remove { parent: HostHandle, child: HostHandle },
    Update { handle: HostHandle, diff: PropDiff },
    TextUpdate { handle: HostHandle, content: String },
}

impl HostOp {
    /// Whether this call changed the attached tree rather than a detached
    /// subtree under construction.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            HostOp::CreateInstance { .. } | HostOp::CreateText { .. } | HostOp::AppendInitial { .. }
        )
    }
}

#[derive(Debug)]
enum Instance {
    Container {
        children: Vec<HostHandle>,
    },
    Element {
        kind: String,
        attributes: IndexMap<String, Value>,
        children: Vec<HostHandle>,
        parent: Option<HostHandle>,
    },
    Text {
        content: String,
        parent: Option<HostHandle>,
    },
}

#[derive(Debug, Default)]
struct MemoryTree {
    next_id: u64,
    instances: HashMap<HostHandle, Instance>,
    ops: Vec<HostOp>,
}

impl MemoryTree {
    fn insert(&mut self, instance: Instance) -> HostHandle {
        let handle = HostHandle::new(self.next_id);
        self.next_id += 1;
        self.instances.insert(handle, instance);
        handle
    }

    fn children_mut(&mut self, handle: HostHandle) -> Option<&mut Vec<HostHandle>> {
        match self.instances.get_mut(&handle)? {
            Instance::Container { children } | Instance::Element { children, .. } => Some(children),
            Instance::Text { .. } => None,
        }
    }

    fn parent_of(&self, handle: HostHandle) -> Option<HostHandle> {
        match self.instances.get(&handle)? {
            Instance::Element { parent, .. } | Instance::Text { parent, .. } => *parent,
            Instance::Container { .. } => None,
        }
    }

    fn set_parent(&mut self, handle: HostHandle, new_parent: Option<HostHandle>) {
        if let Some(Instance::Element { parent, .. } | Instance::Text { parent, .. }) =
            self.instances.get_mut(&handle)
        {
            *parent = new_parent;
        }
    }

    /// Unlink `child` from whatever parent currently holds it.
    fn detach(&mut self, child: HostHandle) {
        if let Some(parent) = self.parent_of(child) {
            if let Some(children) = self.children_mut(parent) {
                children.retain(|c| *c != child);
            }
            self.set_parent(child, None);
        }
    }

    fn append(&mut self, parent: HostHandle, child: HostHandle) {
        self.detach(child);
        match self.children_mut(parent) {
            Some(children) => children.push(child),
            None => {
                error!(parent = parent.raw(), "append target cannot hold children");
                return;
            }
        }
        self.set_parent(child, Some(parent));
    }

    fn write_markup(&self, handle: HostHandle, out: &mut String) {
        match self.instances.get(&handle) {
            Some(Instance::Container { children }) => {
                for child in children {
                    self.write_markup(*child, out);
                }
            }
            Some(Instance::Element {
                kind,
                attributes,
                children,
                ..
            }) => {
                out.push('<');
                out.push_str(kind);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    match value {
                        Value::String(s) => out.push_str(s),
                        other => out.push_str(&other.to_string()),
                    }
                    out.push('"');
                }
                out.push('>');
                for child in children {
                    self.write_markup(*child, out);
                }
                out.push_str("</");
                out.push_str(kind);
                out.push('>');
            }
            Some(Instance::Text { content, .. }) => out.push_str(content),
            None => {}
        }
    }

    fn snapshot(&self, handle: HostHandle) -> Value {
        match self.instances.get(&handle) {
            Some(Instance::Container { children }) => {
                Value::Array(children.iter().map(|c| self.snapshot(*c)).collect())
            }
            Some(Instance::Element {
                kind,
                attributes,
                children,
                ..
            }) => {
                let props: Map<String, Value> = attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                json!({
                    "type": kind,
                    "props": props,
                    "children": children.iter().map(|c| self.snapshot(*c)).collect::<Vec<_>>(),
                })
            }
            Some(Instance::Text { content, .. }) => Value::String(content.clone()),
            None => Value::Null,
        }
    }
}

/// Shared in-memory host tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    tree: Arc<Mutex<MemoryTree>>,
}

impl MemoryHost {
    /// Create a new empty host with no containers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty container to mount a root into.
    pub fn create_container(&self) -> HostHandle {
        self.tree
            .lock()
            .insert(Instance::Container { children: Vec::new() })
    }

    /// Every call recorded so far, oldest first.
    pub fn ops(&self) -> Vec<HostOp> {
        self.tree.lock().ops.clone()
    }

    /// Return and clear the recorded calls.
    pub fn take_ops(&self) -> Vec<HostOp> {
        std::mem::take(&mut self.tree.lock().ops)
    }

    /// Handles of the children attached under `parent`, in order.
    pub fn children(&self, parent: HostHandle) -> Vec<HostHandle> {
        self.tree
            .lock()
            .children_mut(parent)
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Current value of an element attribute.
    pub fn attribute(&self, handle: HostHandle, name: &str) -> Option<Value> {
        match self.tree.lock().instances.get(&handle)? {
            Instance::Element { attributes, .. } => attributes.get(name).cloned(),
            _ => None,
        }
    }

    /// Content of a text object.
    pub fn text(&self, handle: HostHandle) -> Option<String> {
        match self.tree.lock().instances.get(&handle)? {
            Instance::Text { content, .. } => Some(content.clone()),
            _ => None,
        }
    }

    /// Serialize the subtree under `handle` as markup. For a container only
    /// its children are written.
    pub fn markup(&self, handle: HostHandle) -> String {
        let mut out = String::new();
        self.tree.lock().write_markup(handle, &mut out);
        out
    }

    /// JSON view of the subtree under `handle`.
    pub fn snapshot(&self, handle: HostHandle) -> Value {
        self.tree.lock().snapshot(handle)
    }
}

impl HostConfig for MemoryHost {
    fn create_instance(&mut self, kind: &str, props: &Props) -> HostHandle {
        let mut tree = self.tree.lock();
        let handle = tree.insert(Instance::Element {
            kind: kind.to_string(),
            attributes: props.attributes().clone(),
            children: Vec::new(),
            parent: None,
        });
        tree.ops.push(HostOp::CreateInstance {
            handle,
            kind: kind.to_string(),
        });
        handle
    }

    fn create_text_instance(&mut self, content: &str) -> HostHandle {
        let mut tree = self.tree.lock();
        let handle = tree.insert(Instance::Text {
            content: content.to_string(),
            parent: None,
        });
        tree.ops.push(HostOp::CreateText {
            handle,
            content: content.to_string(),
        });
        handle
    }

    fn append_initial_child(&mut self, parent: HostHandle, child: HostHandle) {
        let mut tree = self.tree.lock();
        if let Some(previous) = tree.parent_of(child) {
            if previous != parent {
                error!(child = child.raw(), "child is already mounted under another parent");
                return;
            }
        }
        tree.append(parent, child);
        tree.ops.push(HostOp::AppendInitial { parent, child });
    }

    fn append_child(&mut self, container: HostHandle, child: HostHandle) {
        let mut tree = self.tree.lock();
        tree.append(container, child);
        tree.ops.push(HostOp::Append {
            parent: container,
            child,
        });
    }

    fn insert_before(&mut self, container: HostHandle, child: HostHandle, before: HostHandle) {
        let mut tree = self.tree.lock();
        tree.detach(child);
        let Some(children) = tree.children_mut(container) else {
            error!(container = container.raw(), "insert target cannot hold children");
            return;
        };
        let Some(index) = children.iter().position(|c| *c == before) else {
            error!(before = before.raw(), "insertion point is not a child of the container");
            return;
        };
        children.insert(index, child);
        tree.set_parent(child, Some(container));
        tree.ops.push(HostOp::InsertBefore {
            parent: container,
            child,
            before,
        });
    }

    fn remove_child(&mut self, container: HostHandle, child: HostHandle) {
        let mut tree = self.tree.lock();
        let Some(children) = tree.children_mut(container) else {
            error!(container = container.raw(), "remove target cannot hold children");
            return;
        };
        let Some(index) = children.iter().position(|c| *c == child) else {
            error!(child = child.raw(), "removed child is not attached to the container");
            return;
        };
        children.remove(index);
        tree.set_parent(child, None);
        tree.ops.push(HostOp::Remove {
            parent: container,
            child,
        });
    }

    fn commit_update(&mut self, instance: HostHandle, diff: &PropDiff) {
        let mut tree = self.tree.lock();
        if let Some(Instance::Element { attributes, .. }) = tree.instances.get_mut(&instance) {
            for (name, value) in &diff.set {
                attributes.insert(name.clone(), value.clone());
            }
            for name in &diff.removed {
                attributes.shift_remove(name);
            }
        }
        tree.ops.push(HostOp::Update {
            handle: instance,
            diff: diff.clone(),
        });
    }

    fn commit_text_update(&mut self, instance: HostHandle, content: &str) {
        let mut tree = self.tree.lock();
        if let Some(Instance::Text { content: current, .. }) = tree.instances.get_mut(&instance) {
            *current = content.to_string();
        }
        tree.ops.push(HostOp::TextUpdate {
            handle: instance,
            content: content.to_string(),
        });
    }
}
