//! Collaborators that turn URIs into document trees
//!
//! The engine never reads files or sockets itself. It asks a [`Resolver`]
//! for the raw text behind a URI and a [`Parser`] for the tree:
//!
//! ```text
//! URI → [Resolver] → raw text → [Parser] → Node → [Reference Set]
//! ```
//!
//! Resolvers may perform I/O and are async; parsers are pure.

mod parser;
mod resolver;

pub use parser::{content_type_for, DefaultParser, JsonParser, YamlParser};
#[cfg(feature = "http")]
pub use resolver::HttpResolver;
pub use resolver::{FileResolver, MemoryResolver, SchemeResolver};

use async_trait::async_trait;

use crate::error::{ParseError, ResolveError};
use crate::node::Node;

/// Turns raw document text into a tree.
///
/// Implementations must be deterministic and free of side effects.
pub trait Parser: Send + Sync {
    /// Parse `raw`; `content_type` is a hint such as `application/json`.
    fn parse(&self, raw: &str, content_type: Option<&str>) -> Result<Node, ParseError>;
}

/// Fetches the raw text of a document.
///
/// Timeouts and retries are the resolver's business, not the engine's.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Fetch the document at `uri` (no fragment).
    async fn resolve(&self, uri: &str) -> Result<String, ResolveError>;
}
