//! Node classification for visitor dispatch

use crate::node::{Node, NodeKind, NodePath, PathSegment};

/// Assigns a [`NodeKind`] to a node from its shape and position.
pub trait NodeClassifier: Send + Sync {
    /// Classify `node` found at `path`.
    fn classify(&self, path: &NodePath, node: &Node) -> NodeKind;
}

/// Classifies by shape only.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralClassifier;

impl NodeClassifier for StructuralClassifier {
    fn classify(&self, _path: &NodePath, node: &Node) -> NodeKind {
        node.structural_kind()
    }
}

/// HTTP methods that name operations inside a path item.
const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Members whose value is a single subschema.
const SUBSCHEMA_KEYS: &[&str] = &[
    "schema",
    "items",
    "not",
    "additionalProperties",
    "additionalItems",
    "contains",
    "if",
    "then",
    "else",
    "propertyNames",
    "unevaluatedItems",
    "unevaluatedProperties",
    "contentSchema",
];

/// Members whose value maps names to subschemas.
const SCHEMA_MAP_KEYS: &[&str] = &[
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

/// Members whose value lists subschemas.
const SCHEMA_LIST_KEYS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Classifies OpenAPI 3.x (and Swagger 2.0) documents by position.
///
/// Objects are recognised as operations (`/paths/{path}/{method}`),
/// parameters (`…/parameters/{i}` under a path item or operation, and
/// `/components/parameters/{name}`) or schemas (component schemas,
/// `schema` members and JSON Schema subschema positions). A reference
/// node is always `Reference`, wherever it sits.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApiClassifier;

impl OpenApiClassifier {
    fn is_operation(keys: &[Option<&str>]) -> bool {
        matches!(
            keys,
            [Some("paths" | "webhooks"), Some(_), Some(method)] if HTTP_METHODS.contains(method)
        )
    }

    fn is_parameter(path: &NodePath, keys: &[Option<&str>]) -> bool {
        if matches!(keys, [Some("components"), Some("parameters"), Some(_)]) {
            return true;
        }
        if !matches!(path.last(), Some(PathSegment::Index(_))) {
            return false;
        }
        match keys {
            // path-item level
            [Some("paths" | "webhooks"), Some(_), Some("parameters"), None] => true,
            // operation level
            [Some("paths" | "webhooks"), Some(_), Some(method), Some("parameters"), None] => {
                HTTP_METHODS.contains(method)
            }
            _ => false,
        }
    }

    fn is_schema(path: &NodePath, keys: &[Option<&str>]) -> bool {
        if matches!(keys, [Some("components"), Some("schemas"), Some(_)])
            || matches!(keys, [Some("definitions"), Some(_)])
        {
            return true;
        }
        let parent = path.nth_from_end(1).and_then(PathSegment::as_key);
        match path.last() {
            Some(PathSegment::Index(_)) => {
                matches!(parent, Some(key) if SCHEMA_LIST_KEYS.contains(&key))
            }
            Some(PathSegment::Key(key)) => {
                if matches!(parent, Some(p) if SCHEMA_MAP_KEYS.contains(&p)) {
                    return true;
                }
                // A subschema keyword, unless it is itself a property name
                SUBSCHEMA_KEYS.contains(&key.as_str())
            }
            None => false,
        }
    }
}

impl NodeClassifier for OpenApiClassifier {
    fn classify(&self, path: &NodePath, node: &Node) -> NodeKind {
        if !node.is_object() {
            return node.structural_kind();
        }
        let keys: Vec<Option<&str>> = path.segments().iter().map(PathSegment::as_key).collect();
        if Self::is_operation(&keys) {
            NodeKind::Operation
        } else if Self::is_parameter(path, &keys) {
            NodeKind::Parameter
        } else if Self::is_schema(path, &keys) {
            NodeKind::Schema
        } else {
            NodeKind::Object
        }
    }
}
