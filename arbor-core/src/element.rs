//! Virtual Tree Description
//!
//! These types describe the tree a caller wants. The reconciler compares a
//! fresh description against the committed node tree and derives the host
//! mutations needed to make the host look like the description.
//!
//! A [`VNode`] is one child slot: nothing, a text leaf, an element, or an
//! ordered sequence of further slots. Elements are host elements (`"div"`),
//! function components, or fragments that group children without producing
//! a host object.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::RenderError;
use crate::hooks::Hooks;
use crate::host::PropDiff;

/// Signature of a function component body.
pub type RenderFn = dyn Fn(&Props, &mut Hooks<'_>) -> Result<VNode, RenderError> + Send + Sync;

/// A function component. Two components are the same type only if they share
/// the same render function allocation.
#[derive(Clone)]
pub struct Component {
    name: Arc<str>,
    render: Arc<RenderFn>,
}

impl Component {
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props, &mut Hooks<'_>) -> Result<VNode, RenderError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            render: Arc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn render(&self, props: &Props, hooks: &mut Hooks<'_>) -> Result<VNode, RenderError> {
        (self.render)(props, hooks)
    }

    /// Create an element of this component with empty props.
    pub fn element(&self) -> Element {
        Element::component(self)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// What an element instantiates.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    /// A host element such as `"div"`.
    Host(Arc<str>),
    /// A function component.
    Component(Component),
    /// A grouping of children with no host object of its own.
    Fragment,
}

/// Attributes plus children handed to an element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    attributes: IndexMap<String, Value>,
    children: VNode,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// The children passed to this element.
    pub fn children(&self) -> &VNode {
        &self.children
    }

    /// Set an attribute, replacing any previous value. Insertion order is kept.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn set_children(&mut self, children: impl Into<VNode>) {
        self.children = children.into();
    }

    /// Attribute changes needed to turn `self` into `next`, or `None` when
    /// nothing differs. Children are not part of the diff.
    pub fn diff(&self, next: &Props) -> Option<PropDiff> {
        let mut diff = PropDiff::default();
        for (name, value) in &next.attributes {
            if self.attributes.get(name) != Some(value) {
                diff.set.insert(name.clone(), value.clone());
            }
        }
        for name in self.attributes.keys() {
            if !next.attributes.contains_key(name) {
                diff.removed.push(name.clone());
            }
        }
        (!diff.is_empty()).then_some(diff)
    }
}

/// A keyed, typed element description.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    key: Option<Arc<str>>,
    props: Arc<Props>,
}

impl Element {
    /// A host element of the given kind, e.g. `Element::host("div")`.
    pub fn host(kind: &str) -> Self {
        Self::new(ElementKind::Host(Arc::from(kind)))
    }

    pub fn component(component: &Component) -> Self {
        Self::new(ElementKind::Component(component.clone()))
    }

    /// A fragment grouping `children`.
    pub fn fragment(children: impl Into<VNode>) -> Self {
        Self::new(ElementKind::Fragment).child(children)
    }

    fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            key: None,
            props: Arc::new(Props::default()),
        }
    }

    pub fn key(mut self, key: impl fmt::Display) -> Self {
        self.key = Some(Arc::from(key.to_string()));
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.props).set(name, value);
        self
    }

    /// Replace the element's children.
    pub fn child(mut self, children: impl Into<VNode>) -> Self {
        Arc::make_mut(&mut self.props).set_children(children);
        self
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn key_ref(&self) -> Option<&Arc<str>> {
        self.key.as_ref()
    }

    pub fn props(&self) -> &Arc<Props> {
        &self.props
    }
}

/// One child slot of the virtual tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum VNode {
    /// Renders nothing.
    #[default]
    Empty,
    /// A text leaf. Numbers are converted to text on construction.
    Text(Arc<str>),
    Element(Element),
    /// An ordered sequence of children.
    List(Vec<VNode>),
}

impl VNode {
    pub fn text(content: impl fmt::Display) -> Self {
        VNode::Text(Arc::from(content.to_string()))
    }

    pub fn list<I>(children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VNode>,
    {
        VNode::List(children.into_iter().map(Into::into).collect())
    }
}

impl From<Element> for VNode {
    fn from(element: Element) -> Self {
        VNode::Element(element)
    }
}

impl From<&str> for VNode {
    fn from(text: &str) -> Self {
        VNode::Text(Arc::from(text))
    }
}

impl From<String> for VNode {
    fn from(text: String) -> Self {
        VNode::Text(Arc::from(text))
    }
}

impl From<i64> for VNode {
    fn from(value: i64) -> Self {
        VNode::text(value)
    }
}

impl From<i32> for VNode {
    fn from(value: i32) -> Self {
        VNode::text(value)
    }
}

impl From<usize> for VNode {
    fn from(value: usize) -> Self {
        VNode::text(value)
    }
}

impl From<f64> for VNode {
    fn from(value: f64) -> Self {
        VNode::text(value)
    }
}

impl From<Vec<VNode>> for VNode {
    fn from(children: Vec<VNode>) -> Self {
        VNode::List(children)
    }
}

impl<T: Into<VNode>> From<Option<T>> for VNode {
    fn from(child: Option<T>) -> Self {
        child.map_or(VNode::Empty, Into::into)
    }
}
