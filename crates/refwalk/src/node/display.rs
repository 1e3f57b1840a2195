//! Display implementations for nodes

use std::fmt;

use super::{Node, NodeKind};

impl fmt::Display for Node {
    /// Compact JSON; the alternate flag (`{:#}`) pretty-prints.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.to_json();
        let rendered = if f.alternate() {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        match rendered {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Reference => "reference",
            NodeKind::Operation => "operation",
            NodeKind::Parameter => "parameter",
            NodeKind::Schema => "schema",
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Scalar => "scalar",
        };
        f.write_str(name)
    }
}
