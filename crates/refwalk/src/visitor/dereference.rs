//! Reference resolution and splicing

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;

use super::{Ancestors, VisitAction, VisitContext, Visitor};
use crate::config::Mode;
use crate::error::{DereferenceError, DereferenceErrorKind, Result};
use crate::node::{uri, JsonPointer, Node, NodeKind, META_REF_KEY};
use crate::reference::Reference;
use crate::source::{content_type_for, Parser, Resolver};

/// One resolved link of a reference chain.
struct Link {
    /// Absolute `uri#pointer` of the target
    key: String,

    /// Sibling members written next to the `$ref`
    siblings: IndexMap<String, Node>,
}

/// How a reference chain ended.
enum Resolution {
    /// The chain reached a value
    Value(Node),

    /// The chain closed a loop; carries the loop's identity
    Cycle(Vec<String>),

    /// The chain hit a problem that was already reported
    Failed,
}

/// Replaces reference nodes with clones of the values they point to.
///
/// Documents are loaded through the reference set, so each URI is fetched
/// and parsed at most once per run. Nested references inside spliced
/// content are resolved in the same pass, with the spliced document as
/// the base for relative targets.
pub struct DereferenceVisitor {
    root_uri: String,
    resolver: Arc<dyn Resolver>,
    parser: Arc<dyn Parser>,
    mode: Mode,
    allow_meta_patches: bool,
    ancestors: Ancestors,

    /// Documents that failed to load, with the failure message
    failures: HashMap<String, String>,

    /// Identities of cycles already reported
    cycles: HashSet<Vec<String>>,
}

impl DereferenceVisitor {
    /// Create a visitor for a run starting at `root_uri`.
    pub fn new(
        root_uri: impl Into<String>,
        resolver: Arc<dyn Resolver>,
        parser: Arc<dyn Parser>,
        mode: Mode,
        allow_meta_patches: bool,
    ) -> Self {
        Self {
            root_uri: root_uri.into(),
            resolver,
            parser,
            mode,
            allow_meta_patches,
            ancestors: Ancestors::new(),
            failures: HashMap::new(),
            cycles: HashSet::new(),
        }
    }

    /// Start from a pre-populated ancestors stack.
    pub fn with_ancestors(mut self, ancestors: Ancestors) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// The current expansion stack.
    pub fn ancestors(&self) -> &Ancestors {
        &self.ancestors
    }

    /// Base URI for references found at the current position.
    fn base_uri(&self) -> String {
        match self.ancestors.current_document() {
            Some(document) if self.ancestors.depth() > 0 => document.to_string(),
            _ => self.root_uri.clone(),
        }
    }

    /// Make sure `document` is in the reference set.
    ///
    /// Returns the failure message when it cannot be loaded. A failed URI
    /// is remembered so it is fetched only once per run.
    async fn load(
        &mut self,
        document: &str,
        cx: &mut VisitContext<'_>,
    ) -> Result<std::result::Result<(), String>> {
        if cx.refs.has(document) {
            tracing::trace!(uri = document, "reference set hit");
            return Ok(Ok(()));
        }
        if let Some(message) = self.failures.get(document) {
            return Ok(Err(message.clone()));
        }

        tracing::debug!(uri = document, "fetching document");
        let parsed = match self.resolver.resolve(document).await {
            Ok(raw) => self
                .parser
                .parse(&raw, content_type_for(document))
                .map_err(|e| format!("failed to parse {}: {}", document, e)),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(value) => {
                cx.refs.add(Reference::new(document, value))?;
                Ok(Ok(()))
            }
            Err(message) => {
                tracing::debug!(uri = document, %message, "document unavailable");
                self.failures.insert(document.to_string(), message.clone());
                Ok(Err(message))
            }
        }
    }

    /// Follow a reference chain to its final value.
    ///
    /// Every link is pushed onto the ancestors stack; on failure or cycle
    /// the stack is restored to `boundary` by the caller.
    async fn resolve_chain(
        &mut self,
        first: &Node,
        links: &mut Vec<Link>,
        cx: &mut VisitContext<'_>,
    ) -> Result<Resolution> {
        let path = cx.path.to_pointer();
        let mut base = self.base_uri();
        let mut current = first.clone();

        loop {
            let reference = match current {
                Node::Reference(reference) => reference,
                value => return Ok(Resolution::Value(value)),
            };

            let document = uri::resolve(&base, &reference.target);
            let (_, fragment) = uri::split(&reference.target);
            let key = uri::target_key(&document, fragment);

            if let Some(cycle) = self.ancestors.cycle_keys(&key) {
                return Ok(Resolution::Cycle(cycle));
            }

            if let Err(message) = self.load(&document, cx).await? {
                cx.report(DereferenceError::unresolvable(&path, &reference.target, message));
                return Ok(Resolution::Failed);
            }

            let pointer = match JsonPointer::parse(fragment) {
                Ok(pointer) => pointer,
                Err(e) => {
                    cx.report(DereferenceError::invalid_pointer(&path, &reference.target, &e));
                    return Ok(Resolution::Failed);
                }
            };

            let found = match cx.refs.find(&document) {
                Some(loaded) => pointer.evaluate(&loaded.value).map(Node::clone),
                None => {
                    cx.report(DereferenceError::unresolvable(
                        &path,
                        &reference.target,
                        format!("{} is not in the reference set", document),
                    ));
                    return Ok(Resolution::Failed);
                }
            };
            let value = match found {
                Ok(value) => value,
                Err(e) => {
                    cx.report(DereferenceError::invalid_pointer(&path, &reference.target, &e));
                    return Ok(Resolution::Failed);
                }
            };

            self.ancestors.push(key.clone(), document.clone());
            links.push(Link {
                key,
                siblings: reference.siblings,
            });
            base = document;
            current = value;
        }
    }

    /// Merge chain siblings into the resolved value.
    fn patch(&self, value: Node, links: &[Link]) -> Node {
        if !self.allow_meta_patches {
            return value;
        }
        let mut value = value;
        if let Some(members) = value.as_object_mut() {
            // Innermost first so the outermost reference wins
            for link in links.iter().rev() {
                for (key, sibling) in &link.siblings {
                    members.insert(key.clone(), sibling.clone());
                }
            }
            if let Some(outermost) = links.first() {
                members
                    .entry(META_REF_KEY.to_string())
                    .or_insert_with(|| Node::string(outermost.key.clone()));
            }
        }
        value
    }

    fn on_cycle(&mut self, identity: Vec<String>, node: &Node, cx: &mut VisitContext<'_>) -> VisitAction {
        let target = match node {
            Node::Reference(reference) => reference.target.clone(),
            _ => String::new(),
        };
        tracing::debug!(path = %cx.path, %target, "circular reference");
        let message = format!("cycle through {}", identity.join(" -> "));
        if self.cycles.insert(identity) {
            cx.report(DereferenceError::new(
                DereferenceErrorKind::CircularReference,
                cx.path.to_pointer(),
                target,
                message,
            ));
        }
        match self.mode {
            Mode::Strict => VisitAction::Skip,
            Mode::NonStrict => VisitAction::ReplaceAndSkip(Node::object()),
        }
    }
}

impl std::fmt::Debug for DereferenceVisitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DereferenceVisitor")
            .field("root_uri", &self.root_uri)
            .field("mode", &self.mode)
            .field("allow_meta_patches", &self.allow_meta_patches)
            .field("ancestors", &self.ancestors)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Visitor for DereferenceVisitor {
    fn name(&self) -> &'static str {
        "dereference"
    }

    async fn enter(
        &mut self,
        kind: NodeKind,
        node: &Node,
        cx: &mut VisitContext<'_>,
    ) -> Result<VisitAction> {
        if kind != NodeKind::Reference {
            return Ok(VisitAction::Continue);
        }

        let boundary = self.ancestors.len();
        let mut links = Vec::new();
        let resolution = self.resolve_chain(node, &mut links, cx).await;

        match resolution? {
            Resolution::Value(value) => {
                tracing::trace!(path = %cx.path, links = links.len(), "splicing reference");
                self.ancestors.mark_frame(cx.path.clone(), boundary);
                Ok(VisitAction::Replace(self.patch(value, &links)))
            }
            Resolution::Cycle(identity) => {
                self.ancestors.truncate(boundary);
                Ok(self.on_cycle(identity, node, cx))
            }
            Resolution::Failed => {
                self.ancestors.truncate(boundary);
                Ok(VisitAction::Skip)
            }
        }
    }

    async fn leave(
        &mut self,
        _kind: NodeKind,
        _node: &Node,
        cx: &mut VisitContext<'_>,
    ) -> Result<VisitAction> {
        self.ancestors.pop_frame_at(&cx.path);
        Ok(VisitAction::Continue)
    }
}
