//! Host Tree Boundary
//!
//! The reconciler never touches platform objects itself. It asks a
//! [`HostConfig`] to create instances while rendering and to attach, move,
//! update, and remove them while committing. Instances are referred to by
//! opaque [`HostHandle`]s chosen by the host.
//!
//! `create_*` and `append_initial_child` only build detached subtrees during
//! the render phase. Every other method mutates the attached tree and is
//! called from the commit phase only.

mod memory;

pub use memory::{HostOp, MemoryHost};

use indexmap::IndexMap;
use serde_json::Value;

use crate::element::Props;

/// Opaque reference to a host object (element, text, or container).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHandle(u64);

impl HostHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Attribute changes to apply to an existing host element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropDiff {
    /// Attributes that were added or changed, with their new values.
    pub set: IndexMap<String, Value>,
    /// Attributes that are no longer present.
    pub removed: Vec<String>,
}

impl PropDiff {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.removed.is_empty()
    }
}

/// Primitives a host tree adapter provides to the reconciler.
pub trait HostConfig: Send {
    /// Create a detached host element.
    fn create_instance(&mut self, kind: &str, props: &Props) -> HostHandle;

    /// Create a detached text object.
    fn create_text_instance(&mut self, content: &str) -> HostHandle;

    /// Append `child` to a parent that is still being built.
    fn append_initial_child(&mut self, parent: HostHandle, child: HostHandle);

    /// Append `child` as the last child of `container`, moving it if attached.
    fn append_child(&mut self, container: HostHandle, child: HostHandle);

    /// Insert `child` before `before` in `container`, moving it if attached.
    fn insert_before(&mut self, container: HostHandle, child: HostHandle, before: HostHandle);

    fn remove_child(&mut self, container: HostHandle, child: HostHandle);

    /// Apply an attribute diff to a host element.
    fn commit_update(&mut self, instance: HostHandle, diff: &PropDiff);

    /// Replace the content of a text object.
    fn commit_text_update(&mut self, instance: HostHandle, content: &str);
}
