//! The dereference strategy: one entry point per run
//!
//! ```text
//! Document ─┐
//!           ├─► ReferenceSet (owned or caller's; working copy if immutable)
//!           │
//!           └─► traverse [Dereference, ParameterMacro?, ModelPropertyMacro?, AllOf?]
//!                   │
//!                   └─► Dereferenced { root, errors }
//! ```

use std::sync::Arc;

use crate::config::DereferenceOptions;
use crate::context::DereferenceContext;
use crate::error::{DereferenceError, DereferenceErrorKind, ParseError, Result};
use crate::node::Node;
use crate::reference::{RefSetGuard, Reference, ReferenceSet};
use crate::source::{content_type_for, DefaultParser, Parser, Resolver, SchemeResolver};
use crate::visitor::{
    traverse, AllOfVisitor, Ancestors, DereferenceVisitor, ModelPropertyMacroVisitor,
    NodeClassifier, OpenApiClassifier, ParameterMacroVisitor, VisitContext, Visitor,
};

/// An entry document: its URI and parsed tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Base URI for relative references in the document
    pub uri: String,

    /// Parsed tree
    pub root: Node,
}

impl Document {
    /// Create a document from an already parsed tree.
    pub fn new(uri: impl Into<String>, root: Node) -> Self {
        Self {
            uri: uri.into(),
            root,
        }
    }

    /// Parse raw text into a document, using the URI's extension as the
    /// content type hint.
    pub fn parse(
        uri: impl Into<String>,
        raw: &str,
        parser: &dyn Parser,
    ) -> std::result::Result<Self, ParseError> {
        let uri = uri.into();
        let root = parser.parse(raw, content_type_for(&uri))?;
        Ok(Self { uri, root })
    }
}

/// Outcome of a run: the best-effort tree and every problem found.
#[derive(Debug, Clone, PartialEq)]
pub struct Dereferenced {
    /// The transformed tree
    pub root: Node,

    /// Per-node problems, in traversal order
    pub errors: Vec<DereferenceError>,
}

impl Dereferenced {
    /// Check if the run found no problem at all.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if any problem is more than a warning.
    pub fn has_failures(&self) -> bool {
        self.errors.iter().any(|error| !error.is_warning())
    }

    /// Problems of one kind.
    pub fn errors_of(&self, kind: DereferenceErrorKind) -> impl Iterator<Item = &DereferenceError> {
        self.errors.iter().filter(move |error| error.kind == kind)
    }
}

/// Runs dereference passes with a fixed set of options and collaborators.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use refwalk::{DereferenceOptions, DereferenceStrategy, Document, MemoryResolver, Node};
/// use serde_json::json;
///
/// # #[tokio::main]
/// # async fn main() {
/// let resolver = Arc::new(MemoryResolver::new().with_document("other.json", r#"{"y": {"z": 2}}"#));
/// let strategy = DereferenceStrategy::new(DereferenceOptions::default()).with_resolver(resolver);
///
/// let document = Document::new("root.json", Node::from(json!({"x": {"$ref": "other.json#/y"}})));
/// let result = strategy.dereference(document).await.unwrap();
///
/// assert_eq!(result.root, Node::from(json!({"x": {"z": 2}})));
/// assert!(result.is_clean());
/// # }
/// ```
pub struct DereferenceStrategy {
    options: DereferenceOptions,
    resolver: Arc<dyn Resolver>,
    parser: Arc<dyn Parser>,
    classifier: Arc<dyn NodeClassifier>,
    context: DereferenceContext,

    /// `uri#pointer` keys treated as already being expanded
    ancestors: Vec<String>,
}

impl DereferenceStrategy {
    /// Create a strategy with the default collaborators.
    ///
    /// Documents are fetched from disk (and over HTTP with the `http`
    /// feature), parsed as JSON or YAML and classified as OpenAPI.
    pub fn new(options: DereferenceOptions) -> Self {
        Self {
            options,
            resolver: Arc::new(SchemeResolver::with_defaults()),
            parser: Arc::new(DefaultParser),
            classifier: Arc::new(OpenApiClassifier),
            context: DereferenceContext::new(),
            ancestors: Vec::new(),
        }
    }

    /// Set the resolver (builder pattern)
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the parser (builder pattern)
    pub fn with_parser(mut self, parser: Arc<dyn Parser>) -> Self {
        self.parser = parser;
        self
    }

    /// Set the node classifier (builder pattern)
    pub fn with_classifier(mut self, classifier: Arc<dyn NodeClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the runtime context (builder pattern)
    pub fn with_context(mut self, context: DereferenceContext) -> Self {
        self.context = context;
        self
    }

    /// Treat these `uri#pointer` keys as already being expanded, so any
    /// reference to them is reported as a cycle.
    pub fn with_ancestors<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.ancestors = keys.into_iter().map(Into::into).collect();
        self
    }

    /// The options runs use.
    pub fn options(&self) -> &DereferenceOptions {
        &self.options
    }

    /// The runtime context; clone it to interrupt a run from elsewhere.
    pub fn context(&self) -> &DereferenceContext {
        &self.context
    }

    /// Fetch and parse an entry document through the resolver.
    pub async fn load(&self, uri: &str) -> Result<Document> {
        let raw = self.resolver.resolve(uri).await?;
        Ok(Document::parse(uri, &raw, self.parser.as_ref())?)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Runs
    // ═══════════════════════════════════════════════════════════════════

    /// Dereference a document with a reference set owned by this run.
    ///
    /// The set is cleaned when the run ends, however it ends.
    pub async fn dereference(&self, document: Document) -> Result<Dereferenced> {
        let mut owned = ReferenceSet::new();
        let mut refs = RefSetGuard::new(&mut owned);
        refs.add(Reference::new(document.uri.clone(), document.root.clone()))?;
        self.run(document, &mut refs).await
    }

    /// Dereference a document sharing the caller's reference set.
    ///
    /// The document is registered as the set's root if absent. When the
    /// set already holds the document's URI, the stored value is walked
    /// and `document.root` is ignored, so the tree and its local pointers
    /// come from the same source. In immutable mode the run works on a copy of the set and afterwards
    /// only adds the documents it fetched that the caller's set lacks; the
    /// caller's own references are never modified. Otherwise the set is
    /// used in place. The caller's set is never cleaned.
    pub async fn dereference_with(
        &self,
        document: Document,
        refs: &mut ReferenceSet,
    ) -> Result<Dereferenced> {
        let stored = refs.find(&document.uri).map(|reference| reference.value.clone());
        let document = match stored {
            Some(root) => {
                tracing::debug!(uri = %document.uri, "walking the stored root document");
                Document::new(document.uri, root)
            }
            None => {
                refs.add(Reference::new(document.uri.clone(), document.root.clone()))?;
                document
            }
        };
        refs.set_root(document.uri.clone());

        if !self.options.immutable {
            return self.run(document, refs).await;
        }

        let mut working = refs.working_copy();
        let mut guard = RefSetGuard::new(&mut working);
        let result = self.run(document, &mut guard).await?;
        let added = guard.replay_into(refs)?;
        tracing::debug!(added, "replayed fetched documents into caller's set");
        Ok(result)
    }

    /// Fetch, parse and dereference the document at `uri`.
    pub async fn dereference_uri(&self, uri: &str) -> Result<Dereferenced> {
        let document = self.load(uri).await?;
        self.dereference(document).await
    }

    async fn run(&self, document: Document, refs: &mut ReferenceSet) -> Result<Dereferenced> {
        let Document { uri, root } = document;
        tracing::debug!(
            uri = %uri,
            mode = %self.options.mode,
            immutable = self.options.immutable,
            "dereference started"
        );

        let mut visitors = self.visitors(&uri);
        let mut cx = VisitContext::new(refs, &self.context, self.options.max_depth);
        let root = traverse(root, &mut visitors, self.classifier.as_ref(), &mut cx).await?;
        let errors = cx.into_errors();

        if let Some(reference) = refs.find_mut(&uri) {
            reference.value = root.clone();
            reference.dirty = true;
        }

        tracing::debug!(uri = %uri, errors = errors.len(), documents = refs.len(), "dereference finished");
        Ok(Dereferenced { root, errors })
    }

    /// The visitor composition for one run, in pipeline order.
    fn visitors(&self, root_uri: &str) -> Vec<Box<dyn Visitor>> {
        let options = &self.options;
        let dereference = DereferenceVisitor::new(
            root_uri,
            self.resolver.clone(),
            self.parser.clone(),
            options.mode,
            options.allow_meta_patches,
        )
        .with_ancestors(Ancestors::with_seed(self.ancestors.iter().cloned()));

        let mut visitors: Vec<Box<dyn Visitor>> = vec![Box::new(dereference)];
        if let Some(hook) = &options.parameter_macro {
            visitors.push(Box::new(
                ParameterMacroVisitor::new(hook.clone())
                    .with_abort_on_error(options.abort_on_macro_error),
            ));
        }
        if let Some(hook) = &options.model_property_macro {
            visitors.push(Box::new(
                ModelPropertyMacroVisitor::new(hook.clone())
                    .with_abort_on_error(options.abort_on_macro_error),
            ));
        }
        if !options.mode.is_strict() {
            visitors.push(Box::new(AllOfVisitor::new()));
        }
        visitors
    }
}

impl Default for DereferenceStrategy {
    fn default() -> Self {
        Self::new(DereferenceOptions::default())
    }
}

impl std::fmt::Debug for DereferenceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DereferenceStrategy")
            .field("options", &self.options)
            .field("context", &self.context)
            .field("ancestors", &self.ancestors)
            .finish_non_exhaustive()
    }
}
