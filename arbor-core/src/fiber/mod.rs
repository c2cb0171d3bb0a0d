//! Node Model
//!
//! Every tree position is represented by up to two [`Node`]s: the one in the
//! committed `current` tree and its work-in-progress counterpart, linked
//! through `alternate`. Rendering only ever writes the work-in-progress side.
//! Commit makes the finished tree current, and the old current nodes become
//! the buffers the next render reuses.

mod arena;
mod flags;
mod node;

pub use arena::Arena;
pub use flags::Flags;
pub use node::{LocalState, Node, NodeId, NodeProps, WorkTag};
