//! # Refwalk
//!
//! A reference-resolving tree walker for OpenAPI-style documents.
//!
//! Refwalk takes a parsed document graph and replaces every `{"$ref": ...}`
//! node with a clone of the value it points to, whether that value lives
//! in the same document, another local file or a remote URL. Cycles are
//! detected and broken, auxiliary documents are fetched once per run, and
//! user hooks can rewrite parameters and schema properties on the way.
//!
//! ## Architecture
//!
//! - **Node model**: `Node` trees with JSON Pointer addressing
//! - **Reference set**: per-run cache of parsed documents
//! - **Visitor engine**: async depth-first traversal running an ordered
//!   pipeline of visitors
//! - **Strategy**: builds the pipeline and owns the reference set lifecycle
//!
//! ## Example
//!
//! ```
//! use refwalk::{DereferenceOptions, DereferenceStrategy, Document, Node};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let document = Document::new(
//!     "openapi.json",
//!     Node::from(json!({"a": {"$ref": "#/b"}, "b": {"x": 1}})),
//! );
//!
//! let result = DereferenceStrategy::new(DereferenceOptions::default())
//!     .dereference(document)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result.root, Node::from(json!({"a": {"x": 1}, "b": {"x": 1}})));
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod error;
pub mod node;
pub mod reference;
pub mod source;
pub mod strategy;
pub mod visitor;

// Re-export main types
pub use config::{DereferenceOptions, Mode};
pub use context::DereferenceContext;
pub use error::{
    DereferenceError, DereferenceErrorKind, ParseError, RefSetError, RefwalkError, ResolveError,
    Result,
};
pub use node::{JsonPointer, Node, NodeKind, NodePath, PathSegment, PointerError, ReferenceNode, Scalar};
pub use reference::{DedupPolicy, RefSetGuard, Reference, ReferenceSet};
#[cfg(feature = "http")]
pub use source::HttpResolver;
pub use source::{
    DefaultParser, FileResolver, JsonParser, MemoryResolver, Parser, Resolver, SchemeResolver,
    YamlParser,
};
pub use strategy::{DereferenceStrategy, Dereferenced, Document};
pub use visitor::{
    traverse, AllOfVisitor, DereferenceVisitor, ModelPropertyMacro, NodeClassifier,
    OpenApiClassifier, ParameterMacro, StructuralClassifier, VisitAction, VisitContext, Visitor,
};

/// Refwalk version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
