//! `allOf` flattening

use async_trait::async_trait;
use indexmap::IndexMap;

use super::{VisitAction, VisitContext, Visitor};
use crate::error::Result;
use crate::node::{Node, NodeKind, META_REF_KEY};

const ALL_OF_KEY: &str = "allOf";

/// Flatten an object's `allOf` into the object itself.
///
/// Branches are deep-merged in order, then the object's own members
/// (without `allOf`) on top, so later values win. A `$$ref` left on a
/// branch by a meta patch names that branch, not the result, and is kept
/// only when the object itself carries one. Returns `None` when the node
/// has no `allOf` array or one of its branches is not an object.
///
/// # Example
///
/// ```
/// use refwalk::visitor::merge_all_of;
/// use refwalk::Node;
/// use serde_json::json;
///
/// let schema = Node::from(json!({
///     "allOf": [
///         {"type": "object", "required": ["id"]},
///         {"required": ["name"], "description": "base"}
///     ],
///     "description": "pet"
/// }));
///
/// let merged = merge_all_of(&schema).unwrap();
/// assert_eq!(merged, Node::from(json!({
///     "type": "object",
///     "required": ["id", "name"],
///     "description": "pet"
/// })));
/// ```
pub fn merge_all_of(node: &Node) -> Option<Node> {
    let members = node.as_object()?;
    let branches = members.get(ALL_OF_KEY)?.as_array()?;

    let mut merged = IndexMap::new();
    for branch in branches {
        merge_into(&mut merged, branch.as_object()?);
    }
    let own: IndexMap<String, Node> = members
        .iter()
        .filter(|(key, _)| key.as_str() != ALL_OF_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    merge_into(&mut merged, &own);
    if !members.contains_key(META_REF_KEY) {
        merged.shift_remove(META_REF_KEY);
    }

    Some(Node::Object(merged))
}

/// Deep-merge `source` into `target`; `source` wins on conflicts.
fn merge_into(target: &mut IndexMap<String, Node>, source: &IndexMap<String, Node>) {
    for (key, value) in source {
        match (target.get_mut(key), value) {
            (Some(Node::Object(existing)), Node::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            (Some(Node::Array(existing)), Node::Array(incoming)) => {
                for item in incoming {
                    if !existing.contains(item) {
                        existing.push(item.clone());
                    }
                }
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Replaces schemas carrying an `allOf` with their flattened form.
///
/// Runs on leave, after the branches were dereferenced and flattened
/// themselves. Only nodes classified as [`NodeKind::Schema`] are touched,
/// so an `allOf` member inside `example` or `default` data is left as
/// written. [`StructuralClassifier`](super::StructuralClassifier) never
/// yields schemas and so disables flattening.
#[derive(Debug, Default)]
pub struct AllOfVisitor;

impl AllOfVisitor {
    /// Create a new visitor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Visitor for AllOfVisitor {
    fn name(&self) -> &'static str {
        "all-of"
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
        match merge_all_of(node) {
            Some(merged) => {
                tracing::trace!(path = %cx.path, "flattened allOf");
                Ok(VisitAction::Replace(merged))
            }
            None => Ok(VisitAction::Continue),
        }
    }
}
