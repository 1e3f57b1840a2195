//! Error types for dereferencing runs
//!
//! Two families live here:
//!
//! - [`RefwalkError`]: engine failures that abort a run.
//! - [`DereferenceError`]: per-node problems collected while the run keeps
//!   going, returned next to the best-effort tree.

use std::fmt;

use thiserror::Error;

use crate::node::PointerError;

/// Fatal error for a dereference run.
#[derive(Error, Debug)]
pub enum RefwalkError {
    /// A reference set was misused (e.g. written after `clean()`)
    #[error("Reference set error: {0}")]
    RefSet(#[from] RefSetError),

    /// The entry document could not be fetched
    #[error("Cannot load entry document: {0}")]
    Resolve(#[from] ResolveError),

    /// The entry document could not be parsed
    #[error("Cannot parse entry document: {0}")]
    Parse(#[from] ParseError),

    /// The run was interrupted through its context
    #[error("Dereference interrupted")]
    Interrupted,

    /// The tree is deeper than the configured limit
    #[error("Depth limit exceeded: depth {depth} > max {max}")]
    DepthLimitExceeded {
        /// Depth that was reached
        depth: usize,
        /// Maximum allowed depth
        max: usize,
    },

    /// A macro hook failed and the run was configured to stop on it
    #[error("Macro failed at {path}: {message}")]
    MacroAborted {
        /// JSON Pointer of the node the macro ran on
        path: String,
        /// Message returned by the macro
        message: String,
    },
}

/// Errors raised by [`ReferenceSet`](crate::ReferenceSet) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefSetError {
    /// The set was cleaned and can no longer be written to
    #[error("reference set has been cleaned")]
    Cleaned,

    /// A reference with the same URI exists and the policy rejects duplicates
    #[error("reference already present: {uri}")]
    Duplicate {
        /// URI of the rejected reference
        uri: String,
    },
}

/// Errors raised by a [`Resolver`](crate::Resolver).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Nothing exists at the URI
    #[error("document not found: {uri}")]
    NotFound {
        /// Requested URI
        uri: String,
    },

    /// The document exists but could not be read
    #[error("document unreachable: {uri}: {message}")]
    Unreachable {
        /// Requested URI
        uri: String,
        /// Underlying failure
        message: String,
    },

    /// No resolver handles the URI's scheme
    #[error("unsupported URI scheme: {uri}")]
    UnsupportedScheme {
        /// Requested URI
        uri: String,
    },
}

/// Error raised by a [`Parser`](crate::Parser).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,

    /// Line of the failure (1-indexed), when the parser reports one
    pub line: Option<usize>,

    /// Column of the failure (1-indexed), when the parser reports one
    pub column: Option<usize>,
}

impl ParseError {
    /// Create a new parse error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Add location information to the error.
    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error: {}", self.message)?;
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, " at {}:{}", line, column)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Kind of a per-node dereference problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DereferenceErrorKind {
    /// The target document could not be fetched or parsed
    UnresolvableReference,

    /// The reference closes a cycle; the cycle was broken
    CircularReference,

    /// A macro hook returned an error
    MacroFailure,

    /// The fragment does not point at anything in the target document
    InvalidPointer,
}

impl fmt::Display for DereferenceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DereferenceErrorKind::UnresolvableReference => "unresolvable reference",
            DereferenceErrorKind::CircularReference => "circular reference",
            DereferenceErrorKind::MacroFailure => "macro failure",
            DereferenceErrorKind::InvalidPointer => "invalid pointer",
        };
        f.write_str(name)
    }
}

/// A problem found at one node, collected while the run continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {path} ({target}): {message}")]
pub struct DereferenceError {
    /// What went wrong
    pub kind: DereferenceErrorKind,

    /// JSON Pointer of the node in the output tree
    pub path: String,

    /// Reference target involved (empty for macro failures)
    pub target: String,

    /// Details
    pub message: String,
}

impl DereferenceError {
    /// Create a new collected error.
    pub fn new(
        kind: DereferenceErrorKind,
        path: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Cycles are reported but already handled by the engine.
    pub fn is_warning(&self) -> bool {
        self.kind == DereferenceErrorKind::CircularReference
    }

    pub(crate) fn unresolvable(path: &str, target: &str, cause: impl fmt::Display) -> Self {
        Self::new(
            DereferenceErrorKind::UnresolvableReference,
            path,
            target,
            cause.to_string(),
        )
    }

    pub(crate) fn invalid_pointer(path: &str, target: &str, cause: &PointerError) -> Self {
        Self::new(
            DereferenceErrorKind::InvalidPointer,
            path,
            target,
            cause.to_string(),
        )
    }
}

/// Result type alias for refwalk operations
pub type Result<T> = std::result::Result<T, RefwalkError>;
