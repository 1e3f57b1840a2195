//! Model property macro hook

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{macro_outcome, VisitAction, VisitContext, Visitor};
use crate::error::Result;
use crate::node::{Node, NodeKind, NodePath, PathSegment};

/// What a model property macro is told about the property it runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyContext {
    /// Position of the property schema
    pub path: NodePath,

    /// Property name
    pub name: String,
}

type PropertyFn =
    dyn Fn(&Node, &PropertyContext) -> std::result::Result<Option<Node>, String> + Send + Sync;

/// A user hook run on every schema property.
#[derive(Clone)]
pub struct ModelPropertyMacro(Arc<PropertyFn>);

impl ModelPropertyMacro {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Node, &PropertyContext) -> std::result::Result<Option<Node>, String>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the hook.
    pub fn call(
        &self,
        property: &Node,
        cx: &PropertyContext,
    ) -> std::result::Result<Option<Node>, String> {
        (self.0)(property, cx)
    }
}

impl fmt::Debug for ModelPropertyMacro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelPropertyMacro(<fn>)")
    }
}

/// Runs a [`ModelPropertyMacro`] on each member of a schema's
/// `properties` once it was dereferenced.
#[derive(Debug)]
pub struct ModelPropertyMacroVisitor {
    hook: ModelPropertyMacro,
    abort_on_error: bool,
}

impl ModelPropertyMacroVisitor {
    /// Create a visitor for `hook`.
    pub fn new(hook: ModelPropertyMacro) -> Self {
        Self {
            hook,
            abort_on_error: false,
        }
    }

    /// Abort the run on the first hook error.
    pub fn with_abort_on_error(mut self, abort: bool) -> Self {
        self.abort_on_error = abort;
        self
    }
}

/// The property name when `path` is `…/properties/{name}`.
fn property_name(path: &NodePath) -> Option<&str> {
    match (path.nth_from_end(1), path.last()) {
        (Some(PathSegment::Key(parent)), Some(PathSegment::Key(name))) if parent == "properties" => {
            Some(name.as_str())
        }
        _ => None,
    }
}

#[async_trait]
impl Visitor for ModelPropertyMacroVisitor {
    fn name(&self) -> &'static str {
        "model-property-macro"
    }

    async fn enter(
        &mut self,
        _kind: NodeKind,
        _node: &Node,
        _cx: &mut VisitContext<'_>,
    ) -> Result<VisitAction> {
        Ok(VisitAction::Continue)
    }

    async fn leave(
        &mut self,
        kind: NodeKind,
        node: &Node,
        cx: &mut VisitContext<'_>,
    ) -> Result<VisitAction> {
        if kind != NodeKind::Schema {
            return Ok(VisitAction::Continue);
        }
        let Some(name) = property_name(&cx.path) else {
            return Ok(VisitAction::Continue);
        };
        let context = PropertyContext {
            path: cx.path.clone(),
            name: name.to_string(),
        };
        tracing::trace!(path = %cx.path, property = %context.name, "model property macro");
        let outcome = self.hook.call(node, &context);
        macro_outcome(outcome, "model property macro", self.abort_on_error, cx)
    }
}
