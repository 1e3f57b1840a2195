//! Parameter macro hook

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{macro_outcome, VisitAction, VisitContext, Visitor};
use crate::error::Result;
use crate::node::{Node, NodeKind, NodePath};

/// What a parameter macro is told about the parameter it runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterContext {
    /// Position of the parameter
    pub path: NodePath,

    /// The enclosing operation as it was before its children were
    /// dereferenced (`None` for path-item and component parameters)
    pub operation: Option<Node>,
}

type ParameterFn =
    dyn Fn(&Node, &ParameterContext) -> std::result::Result<Option<Node>, String> + Send + Sync;

/// A user hook run on every operation parameter.
///
/// Returning `Ok(None)` keeps the parameter, `Ok(Some(v))` replaces it.
///
/// # Example
///
/// ```
/// use refwalk::visitor::ParameterMacro;
/// use refwalk::Node;
///
/// // Default every parameter to required
/// let hook = ParameterMacro::new(|param, _cx| {
///     let mut param = param.clone();
///     if let Some(members) = param.as_object_mut() {
///         members.entry("required".to_string()).or_insert(Node::from(true));
///     }
///     Ok(Some(param))
/// });
/// # let _ = hook;
/// ```
#[derive(Clone)]
pub struct ParameterMacro(Arc<ParameterFn>);

impl ParameterMacro {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Node, &ParameterContext) -> std::result::Result<Option<Node>, String>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the hook.
    pub fn call(
        &self,
        parameter: &Node,
        cx: &ParameterContext,
    ) -> std::result::Result<Option<Node>, String> {
        (self.0)(parameter, cx)
    }
}

impl fmt::Debug for ParameterMacro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParameterMacro(<fn>)")
    }
}

/// Runs a [`ParameterMacro`] on each parameter after its subtree was
/// dereferenced.
#[derive(Debug)]
pub struct ParameterMacroVisitor {
    hook: ParameterMacro,
    abort_on_error: bool,

    /// Operations being walked, with their snapshot from enter
    operations: Vec<(NodePath, Node)>,
}

impl ParameterMacroVisitor {
    /// Create a visitor for `hook`.
    pub fn new(hook: ParameterMacro) -> Self {
        Self {
            hook,
            abort_on_error: false,
            operations: Vec::new(),
        }
    }

    /// Abort the run on the first hook error.
    pub fn with_abort_on_error(mut self, abort: bool) -> Self {
        self.abort_on_error = abort;
        self
    }

    fn enclosing_operation(&self, path: &NodePath) -> Option<Node> {
        self.operations
            .last()
            .filter(|(owner, _)| path.starts_with(owner))
            .map(|(_, snapshot)| snapshot.clone())
    }
}

#[async_trait]
impl Visitor for ParameterMacroVisitor {
    fn name(&self) -> &'static str {
        "parameter-macro"
    }

    async fn enter(
        &mut self,
        kind: NodeKind,
        node: &Node,
        cx: &mut VisitContext<'_>,
    ) -> Result<VisitAction> {
        if kind == NodeKind::Operation {
            self.operations.push((cx.path.clone(), node.clone()));
        }
        Ok(VisitAction::Continue)
    }

    async fn leave(
        &mut self,
        kind: NodeKind,
        node: &Node,
        cx: &mut VisitContext<'_>,
    ) -> Result<VisitAction> {
        match kind {
            NodeKind::Operation => {
                if matches!(self.operations.last(), Some((owner, _)) if *owner == cx.path) {
                    self.operations.pop();
                }
                Ok(VisitAction::Continue)
            }
            NodeKind::Parameter => {
                let context = ParameterContext {
                    path: cx.path.clone(),
                    operation: self.enclosing_operation(&cx.path),
                };
                tracing::trace!(path = %cx.path, "parameter macro");
                let outcome = self.hook.call(node, &context);
                macro_outcome(outcome, "parameter macro", self.abort_on_error, cx)
            }
            _ => Ok(VisitAction::Continue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DereferenceContext;
    use crate::error::{DereferenceErrorKind, RefwalkError};
    use crate::reference::ReferenceSet;
    use crate::visitor::{traverse, OpenApiClassifier};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Mutex;

    async fn run(
        document: serde_json::Value,
        visitor: ParameterMacroVisitor,
    ) -> Result<(Node, Vec<crate::error::DereferenceError>)> {
        let mut refs = ReferenceSet::new();
        let runtime = DereferenceContext::new();
        let mut visitors: Vec<Box<dyn Visitor>> = vec![Box::new(visitor)];
        let mut cx = VisitContext::new(&mut refs, &runtime, 100);
        let root = traverse(Node::from(document), &mut visitors, &OpenApiClassifier, &mut cx).await?;
        Ok((root, cx.into_errors()))
    }

    fn api() -> serde_json::Value {
        json!({
            "paths": {
                "/pets": {
                    "parameters": [{"name": "trace", "in": "header"}],
                    "get": {
                        "operationId": "listPets",
                        "parameters": [{"name": "limit", "in": "query"}]
                    }
                }
            },
            "components": {"parameters": {"page": {"name": "page", "in": "query"}}}
        })
    }

    #[tokio::test]
    async fn test_macro_replaces_parameters() {
        let hook = ParameterMacro::new(|param, _| {
            let mut param = param.clone();
            if let Some(members) = param.as_object_mut() {
                members.insert("x-seen".to_string(), Node::from(true));
            }
            Ok(Some(param))
        });
        let (root, errors) = run(api(), ParameterMacroVisitor::new(hook)).await.unwrap();

        assert!(errors.is_empty());
        let to_json = root.to_json();
        assert_eq!(to_json["paths"]["/pets"]["get"]["parameters"][0]["x-seen"], json!(true));
        assert_eq!(to_json["paths"]["/pets"]["parameters"][0]["x-seen"], json!(true));
        assert_eq!(to_json["components"]["parameters"]["page"]["x-seen"], json!(true));
    }

    #[tokio::test]
    async fn test_context_carries_operation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let hook = ParameterMacro::new(move |param, cx| {
            let name = param.get("name").and_then(Node::as_str).unwrap_or("").to_string();
            let operation = cx
                .operation
                .as_ref()
                .and_then(|op| op.get("operationId"))
                .and_then(Node::as_str)
                .map(str::to_string);
            log.lock().unwrap().push((name, operation));
            Ok(None)
        });
        run(api(), ParameterMacroVisitor::new(hook)).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("trace".to_string(), None),
                ("limit".to_string(), Some("listPets".to_string())),
                ("page".to_string(), None),
            ]
        );
    }

    #[tokio::test]
    async fn test_macro_error_recorded() {
        let hook = ParameterMacro::new(|_, _| Err("bad parameter".to_string()));
        let (root, errors) = run(api(), ParameterMacroVisitor::new(hook)).await.unwrap();

        assert_eq!(root, Node::from(api()));
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].kind, DereferenceErrorKind::MacroFailure);
        assert_eq!(errors[0].path, "/paths/~1pets/parameters/0");
    }

    #[tokio::test]
    async fn test_macro_error_aborts() {
        let hook = ParameterMacro::new(|_, _| Err("bad parameter".to_string()));
        let visitor = ParameterMacroVisitor::new(hook).with_abort_on_error(true);
        let result = run(api(), visitor).await;
        assert!(matches!(result, Err(RefwalkError::MacroAborted { .. })));
    }
}
