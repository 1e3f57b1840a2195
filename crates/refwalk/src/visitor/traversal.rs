//! Depth-first traversal over a node tree

use futures::future::BoxFuture;
use indexmap::IndexMap;

use super::{NodeClassifier, VisitAction, VisitContext, Visitor};
use crate::error::{RefwalkError, Result};
use crate::node::{Node, PathSegment};

/// Run one traversal pass over `root` with an ordered visitor composition.
///
/// Object members are visited in key order and array items in index
/// order; reference nodes have no children. The result is the transformed
/// tree. Per-node problems accumulate in `cx`.
///
/// # Errors
///
/// - `Interrupted` if the context's interrupt flag is raised
/// - `DepthLimitExceeded` if a path grows past `cx.max_depth`
/// - any error a visitor returns
pub async fn traverse(
    root: Node,
    visitors: &mut [Box<dyn Visitor>],
    classifier: &dyn NodeClassifier,
    cx: &mut VisitContext<'_>,
) -> Result<Node> {
    walk(root, visitors, classifier, cx).await
}

fn walk<'a, 'b: 'a>(
    node: Node,
    visitors: &'a mut [Box<dyn Visitor>],
    classifier: &'a dyn NodeClassifier,
    cx: &'a mut VisitContext<'b>,
) -> BoxFuture<'a, Result<Node>> {
    Box::pin(async move {
        if cx.runtime.is_interrupted() {
            return Err(RefwalkError::Interrupted);
        }
        if cx.path.len() > cx.max_depth {
            return Err(RefwalkError::DepthLimitExceeded {
                depth: cx.path.len(),
                max: cx.max_depth,
            });
        }

        let mut node = node;
        let mut kind = classifier.classify(&cx.path, &node);
        let mut skip = false;

        // Enter: pipeline order, replacements visible downstream
        for visitor in visitors.iter_mut() {
            if cx.runtime.trace {
                tracing::trace!(visitor = visitor.name(), path = %cx.path, %kind, "enter");
            }
            match visitor.enter(kind, &node, cx).await? {
                VisitAction::Continue => {}
                VisitAction::Skip => skip = true,
                VisitAction::Replace(replacement) => {
                    node = replacement;
                    kind = classifier.classify(&cx.path, &node);
                }
                VisitAction::ReplaceAndSkip(replacement) => {
                    node = replacement;
                    kind = classifier.classify(&cx.path, &node);
                    skip = true;
                }
            }
        }

        if !skip {
            node = descend(node, &mut *visitors, classifier, &mut *cx).await?;
        }

        // Leave: same order, Skip has nothing left to skip
        for visitor in visitors.iter_mut() {
            match visitor.leave(kind, &node, cx).await? {
                VisitAction::Continue | VisitAction::Skip => {}
                VisitAction::Replace(replacement) | VisitAction::ReplaceAndSkip(replacement) => {
                    node = replacement;
                    kind = classifier.classify(&cx.path, &node);
                }
            }
        }

        Ok(node)
    })
}

async fn descend(
    node: Node,
    visitors: &mut [Box<dyn Visitor>],
    classifier: &dyn NodeClassifier,
    cx: &mut VisitContext<'_>,
) -> Result<Node> {
    match node {
        Node::Object(members) => {
            let mut out = IndexMap::with_capacity(members.len());
            for (key, child) in members {
                cx.path.push(PathSegment::Key(key.clone()));
                let child = walk(child, &mut *visitors, classifier, &mut *cx).await;
                cx.path.pop();
                out.insert(key, child?);
            }
            Ok(Node::Object(out))
        }
        Node::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, child) in items.into_iter().enumerate() {
                cx.path.push(PathSegment::Index(index));
                let child = walk(child, &mut *visitors, classifier, &mut *cx).await;
                cx.path.pop();
                out.push(child?);
            }
            Ok(Node::Array(out))
        }
        leaf @ (Node::Scalar(_) | Node::Reference(_)) => Ok(leaf),
    }
}
