//! Tree representation of a parsed API description document

mod convert;
mod display;
mod pointer;
pub mod uri;

pub use pointer::{JsonPointer, NodePath, PathSegment, PointerError};

use indexmap::IndexMap;

/// The member name that turns an object into a reference node.
pub const REF_KEY: &str = "$ref";

/// Member added to a resolved object when meta patches are enabled.
pub const META_REF_KEY: &str = "$$ref";

/// One element of a parsed document tree.
///
/// Objects keep member insertion order so output is deterministic.
/// Equality compares objects as maps (member order is ignored).
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Keyed members
    Object(IndexMap<String, Node>),

    /// Ordered items
    Array(Vec<Node>),

    /// Leaf value
    Scalar(Scalar),

    /// Pointer to content located elsewhere
    Reference(ReferenceNode),
}

/// Leaf values.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Any JSON number
    Number(serde_json::Number),
    /// String
    String(String),
}

/// A `{"$ref": ...}` object.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceNode {
    /// The `$ref` value: URI, fragment, or both
    pub target: String,

    /// Every other member of the object, in source order
    pub siblings: IndexMap<String, Node>,
}

impl ReferenceNode {
    /// Create a reference without siblings.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            siblings: IndexMap::new(),
        }
    }

    /// Add a sibling member (builder pattern)
    pub fn with_sibling(mut self, key: impl Into<String>, value: Node) -> Self {
        self.siblings.insert(key.into(), value);
        self
    }
}

/// Closed classification of nodes used for visitor dispatch.
///
/// The structural kinds (`Object`, `Array`, `Scalar`, `Reference`) come
/// from the node itself; `Operation`, `Parameter` and `Schema` are assigned
/// by a [`NodeClassifier`](crate::NodeClassifier) from the node's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Unresolved `$ref` object
    Reference,
    /// HTTP operation under a path item
    Operation,
    /// Operation, path-item or component parameter
    Parameter,
    /// Schema object
    Schema,
    /// Any other object
    Object,
    /// Array
    Array,
    /// Leaf value
    Scalar,
}

impl NodeKind {
    /// Whether nodes of this kind have object members.
    pub fn is_object_like(&self) -> bool {
        matches!(
            self,
            NodeKind::Operation | NodeKind::Parameter | NodeKind::Schema | NodeKind::Object
        )
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::Scalar(Scalar::Null)
    }
}

impl Node {
    /// Create an empty object
    pub fn object() -> Self {
        Node::Object(IndexMap::new())
    }

    /// Create an object from key/value pairs
    pub fn object_from<K: Into<String>>(members: impl IntoIterator<Item = (K, Node)>) -> Self {
        Node::Object(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Create an array
    pub fn array(items: Vec<Node>) -> Self {
        Node::Array(items)
    }

    /// Create a string scalar
    pub fn string(s: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(s.into()))
    }

    /// Create a `null` scalar
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    /// Create a reference node
    pub fn reference(target: impl Into<String>) -> Self {
        Node::Reference(ReferenceNode::new(target))
    }

    /// The structural kind of this node.
    pub fn structural_kind(&self) -> NodeKind {
        match self {
            Node::Object(_) => NodeKind::Object,
            Node::Array(_) => NodeKind::Array,
            Node::Scalar(_) => NodeKind::Scalar,
            Node::Reference(_) => NodeKind::Reference,
        }
    }

    /// Short name of the node's shape, for messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Object(_) => "object",
            Node::Array(_) => "array",
            Node::Scalar(Scalar::Null) => "null",
            Node::Scalar(Scalar::Bool(_)) => "boolean",
            Node::Scalar(Scalar::Number(_)) => "number",
            Node::Scalar(Scalar::String(_)) => "string",
            Node::Reference(_) => "reference",
        }
    }

    /// Check if this is an object
    pub fn is_object(&self) -> bool {
        matches!(self, Node::Object(_))
    }

    /// Check if this is a reference
    pub fn is_reference(&self) -> bool {
        matches!(self, Node::Reference(_))
    }

    /// Object members, if this is an object
    pub fn as_object(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Node::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Mutable object members, if this is an object
    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, Node>> {
        match self {
            Node::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Array items, if this is an array
    pub fn as_array(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Array(items) => Some(items),
            _ => None,
        }
    }

    /// String value, if this is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Member lookup on objects (and on a reference's siblings).
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Object(members) => members.get(key),
            Node::Reference(reference) => reference.siblings.get(key),
            _ => None,
        }
    }

    /// Step one path segment down.
    pub fn child(&self, segment: &PathSegment) -> Option<&Node> {
        match (self, segment) {
            (Node::Array(items), PathSegment::Index(i)) => items.get(*i),
            (_, PathSegment::Key(key)) => self.get(key),
            _ => None,
        }
    }

    /// Count every node in the tree, this one included.
    pub fn count_nodes(&self) -> usize {
        1 + match self {
            Node::Object(members) => members.values().map(Node::count_nodes).sum(),
            Node::Array(items) => items.iter().map(Node::count_nodes).sum(),
            Node::Reference(reference) => reference.siblings.values().map(Node::count_nodes).sum(),
            Node::Scalar(_) => 0,
        }
    }

    /// Whether any reference node remains in the tree.
    pub fn contains_reference(&self) -> bool {
        match self {
            Node::Reference(_) => true,
            Node::Object(members) => members.values().any(Node::contains_reference),
            Node::Array(items) => items.iter().any(Node::contains_reference),
            Node::Scalar(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_kind() {
        assert_eq!(Node::object().structural_kind(), NodeKind::Object);
        assert_eq!(Node::array(vec![]).structural_kind(), NodeKind::Array);
        assert_eq!(Node::null().structural_kind(), NodeKind::Scalar);
        assert_eq!(Node::reference("#/a").structural_kind(), NodeKind::Reference);
    }

    #[test]
    fn test_get_reads_reference_siblings() {
        let node = Node::Reference(
            ReferenceNode::new("#/a").with_sibling("description", Node::string("d")),
        );
        assert_eq!(node.get("description"), Some(&Node::string("d")));
        assert_eq!(node.get("$ref"), None);
    }

    #[test]
    fn test_child_by_segment() {
        let node = Node::object_from([("items", Node::array(vec![Node::string("x")]))]);
        let items = node.child(&PathSegment::Key("items".into())).unwrap();
        assert_eq!(items.child(&PathSegment::Index(0)), Some(&Node::string("x")));
        assert_eq!(items.child(&PathSegment::Index(1)), None);
        assert_eq!(node.child(&PathSegment::Index(0)), None);
    }

    #[test]
    fn test_contains_reference() {
        let clean = Node::object_from([("a", Node::array(vec![Node::null()]))]);
        let dirty = Node::object_from([("a", Node::array(vec![Node::reference("#/b")]))]);
        assert!(!clean.contains_reference());
        assert!(dirty.contains_reference());
    }

    #[test]
    fn test_object_equality_ignores_member_order() {
        let a = Node::object_from([("x", Node::null()), ("y", Node::string("1"))]);
        let b = Node::object_from([("y", Node::string("1")), ("x", Node::null())]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_count_nodes() {
        let node = Node::object_from([("a", Node::array(vec![Node::null(), Node::null()]))]);
        assert_eq!(node.count_nodes(), 4);
    }
}
