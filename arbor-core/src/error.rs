//! Error Types
//!
//! Render-phase failures are reported as [`RenderError`]. They never escape
//! the work loop directly: the loop discards the in-flight tree, restarts the
//! pass once, and only then surfaces a [`ReconcileError`] to whoever drove the
//! work (a scheduler task, a microtask, or a direct flush call).

use thiserror::Error;

use crate::scheduler::Lanes;

/// A failure raised while rendering a single component or node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The component called fewer or more bindings than on its previous render.
    #[error("component `{component}` rendered {found} bindings but its previous render had {expected}")]
    HookCountMismatch {
        component: String,
        expected: usize,
        found: usize,
    },

    /// The binding at `index` is a different kind than on the previous render.
    #[error("component `{component}` called a {found} binding at position {index} where a {expected} binding was recorded")]
    HookKindMismatch {
        component: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// The stored state could not be read back as the requested type.
    #[error("component `{component}` read state at position {index} as a different type than it was created with")]
    StateTypeMismatch { component: String, index: usize },

    /// The component body itself reported a failure.
    #[error("component `{component}` failed: {message}")]
    Component { component: String, message: String },
}

impl RenderError {
    /// Convenience constructor for failures raised from a component body.
    pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// A failure surfaced to the caller that drove a render or flush.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Rendering failed, was restarted from the root, and failed again.
    #[error("render at lane {lane:?} failed after restarting from the root: {source}")]
    RenderFailed {
        lane: Lanes,
        #[source]
        source: RenderError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_error_messages_name_the_component() {
        let err = RenderError::HookCountMismatch {
            component: "Counter".into(),
            expected: 2,
            found: 1,
        };
        assert!(err.to_string().contains("Counter"));
        assert!(err.to_string().contains("previous render had 2"));
    }

    #[test]
    fn reconcile_error_keeps_its_source() {
        use std::error::Error as _;

        let err = ReconcileError::RenderFailed {
            lane: Lanes::DEFAULT,
            source: RenderError::component("App", "boom"),
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("component `App` failed: boom"));
    }
}
