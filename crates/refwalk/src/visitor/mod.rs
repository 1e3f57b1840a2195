//! Visitors and the traversal engine that runs them
//!
//! A traversal walks one tree depth-first and calls every visitor of an
//! ordered composition on each node:
//!
//! ```text
//! classify → enter(v1 … vn) → children → leave(v1 … vn)
//! ```
//!
//! Visitors run as a pipeline: when one replaces the node, the visitors
//! after it (and the descent) see the replacement. This is what lets the
//! dereference visitor splice a referenced subtree and the allOf visitor
//! flatten it within the same pass.

mod all_of;
mod ancestors;
mod classify;
mod dereference;
mod parameters;
mod properties;
mod traversal;

pub use all_of::{merge_all_of, AllOfVisitor};
pub use ancestors::Ancestors;
pub use classify::{NodeClassifier, OpenApiClassifier, StructuralClassifier};
pub use dereference::DereferenceVisitor;
pub use parameters::{ParameterContext, ParameterMacro, ParameterMacroVisitor};
pub use properties::{ModelPropertyMacro, ModelPropertyMacroVisitor, PropertyContext};
pub use traversal::traverse;

use async_trait::async_trait;

use crate::context::DereferenceContext;
use crate::error::{DereferenceError, DereferenceErrorKind, RefwalkError, Result};
use crate::node::{Node, NodeKind, NodePath};
use crate::reference::ReferenceSet;

/// What a visitor wants done with the node it was called on.
#[derive(Debug, Clone, PartialEq)]
pub enum VisitAction {
    /// Keep the node
    Continue,

    /// Keep the node, do not descend into it (ignored on leave)
    Skip,

    /// Swap the node for another one
    Replace(Node),

    /// Swap the node and do not descend into the replacement
    ReplaceAndSkip(Node),
}

/// State a traversal lends to its visitors.
///
/// Visitors borrow the reference set read/write for the duration of one
/// traversal and report per-node problems here instead of failing.
pub struct VisitContext<'a> {
    /// Position of the node being visited
    pub path: NodePath,

    /// Cache of resolved documents for this run
    pub refs: &'a mut ReferenceSet,

    /// Caller-controlled runtime switches
    pub runtime: &'a DereferenceContext,

    /// Maximum depth before the traversal aborts
    pub max_depth: usize,

    errors: Vec<DereferenceError>,
}

impl<'a> VisitContext<'a> {
    /// Create a context positioned at the root.
    pub fn new(refs: &'a mut ReferenceSet, runtime: &'a DereferenceContext, max_depth: usize) -> Self {
        Self {
            path: NodePath::root(),
            refs,
            runtime,
            max_depth,
            errors: Vec::new(),
        }
    }

    /// Record a per-node problem.
    pub fn report(&mut self, error: DereferenceError) {
        tracing::debug!(kind = %error.kind, path = %error.path, target = %error.target, "{}", error.message);
        self.errors.push(error);
    }

    /// Problems recorded so far.
    pub fn errors(&self) -> &[DereferenceError] {
        &self.errors
    }

    /// Finish the traversal and hand over the collected problems.
    pub fn into_errors(self) -> Vec<DereferenceError> {
        self.errors
    }
}

/// A unit of per-node behaviour in a traversal.
///
/// Callbacks are async so a visitor can suspend on I/O; synchronous
/// visitors simply never await. Returning `Err` aborts the whole run and
/// is reserved for engine failures; per-node problems go through
/// [`VisitContext::report`].
#[async_trait]
pub trait Visitor: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Called before the node's children are visited.
    async fn enter(
        &mut self,
        kind: NodeKind,
        node: &Node,
        cx: &mut VisitContext<'_>,
    ) -> Result<VisitAction>;

    /// Called after the node's children were visited.
    async fn leave(
        &mut self,
        _kind: NodeKind,
        _node: &Node,
        _cx: &mut VisitContext<'_>,
    ) -> Result<VisitAction> {
        Ok(VisitAction::Continue)
    }
}

/// Turn a macro hook's outcome into a visit action.
///
/// `Ok(None)` keeps the node, `Ok(Some(v))` replaces it; an error is
/// recorded as `MacroFailure`, or aborts the run when `abort` is set.
pub(crate) fn macro_outcome(
    outcome: std::result::Result<Option<Node>, String>,
    hook: &str,
    abort: bool,
    cx: &mut VisitContext<'_>,
) -> Result<VisitAction> {
    match outcome {
        Ok(None) => Ok(VisitAction::Continue),
        Ok(Some(replacement)) => Ok(VisitAction::Replace(replacement)),
        Err(message) if abort => Err(RefwalkError::MacroAborted {
            path: cx.path.to_pointer(),
            message,
        }),
        Err(message) => {
            let error = DereferenceError::new(
                DereferenceErrorKind::MacroFailure,
                cx.path.to_pointer(),
                "",
                format!("{}: {}", hook, message),
            );
            cx.report(error);
            Ok(VisitAction::Continue)
        }
    }
}
