//! Arbor Core
//!
//! This crate provides the reconciliation engine for the Arbor UI framework.
//! It implements:
//!
//! - Double-buffered work nodes kept in a slot arena
//! - Keyed child reconciliation that reuses nodes across reorders
//! - Local state and passive effects for function components
//! - Priority lanes and an interruptible, resumable work loop
//! - An atomic commit phase driving a pluggable host tree
//!
//! The engine owns no event loop and no host tree of its own. Embedders
//! supply a [`TaskScheduler`] that decides when work runs and a
//! [`HostConfig`] that applies mutations.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `element`: The virtual tree description components return
//! - `fiber`: Work nodes, mutation flags and the node arena
//! - `hooks`: Update queues, state bindings, effects and transitions
//! - `scheduler`: Lanes and the external scheduler boundary
//! - `reconciler`: Begin/complete steps, work loop, commit and roots
//! - `host`: The host boundary and an in-memory host
//!
//! # Example
//!
//! ```rust,ignore
//! use arbor_core::{Component, Element, ManualScheduler, MemoryHost, Root, VNode};
//!
//! let host = MemoryHost::new();
//! let container = host.create_container();
//! let scheduler = ManualScheduler::new();
//! let root = Root::new(container, host.clone(), scheduler.clone());
//!
//! let counter = Component::new("Counter", |_props, hooks| {
//!     let (count, _set_count) = hooks.use_state(0_i64)?;
//!     Ok(Element::host("span").child(VNode::text(count)).into())
//! });
//!
//! root.render(counter.element());
//! scheduler.run_until_idle()?;
//! assert_eq!(host.markup(container), "<span>0</span>");
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod reconciler;
pub mod scheduler;

pub use config::ReconcilerConfig;
pub use element::{Component, Element, ElementKind, Props, VNode};
pub use error::{ReconcileError, RenderError};
pub use hooks::{Destroy, Hooks, StateSetter, Transition};
pub use host::{HostConfig, HostHandle, HostOp, MemoryHost, PropDiff};
pub use reconciler::Root;
pub use scheduler::{Lanes, ManualScheduler, SchedulerPriority, TaskScheduler};
