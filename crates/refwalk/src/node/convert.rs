//! Conversions between [`Node`] and `serde_json::Value`

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{Node, ReferenceNode, Scalar, REF_KEY};

impl From<Value> for Node {
    /// Objects with a string `$ref` member become reference nodes.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(Scalar::Number(n)),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => from_object(map),
        }
    }
}

fn from_object(map: Map<String, Value>) -> Node {
    let target = match map.get(REF_KEY) {
        Some(Value::String(target)) => Some(target.clone()),
        _ => None,
    };
    let members: IndexMap<String, Node> = map
        .into_iter()
        .filter(|(key, _)| target.is_none() || key != REF_KEY)
        .map(|(key, value)| (key, Node::from(value)))
        .collect();
    match target {
        Some(target) => Node::Reference(ReferenceNode {
            target,
            siblings: members,
        }),
        None => Node::Object(members),
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        match node {
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Node::Scalar(Scalar::Number(n)) => Value::Number(n.clone()),
            Node::Scalar(Scalar::String(s)) => Value::String(s.clone()),
            Node::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            Node::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
            Node::Reference(reference) => {
                let mut map = Map::new();
                map.insert(REF_KEY.to_string(), Value::String(reference.target.clone()));
                for (k, v) in &reference.siblings {
                    map.insert(k.clone(), Value::from(v));
                }
                Value::Object(map)
            }
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::from(&node)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::string(s)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::string(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Scalar(Scalar::Number(n.into()))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(items)
    }
}

impl Node {
    /// Convert a JSON value, classifying `$ref` objects.
    pub fn from_json(value: Value) -> Self {
        Node::from(value)
    }

    /// Render back to a JSON value.
    pub fn to_json(&self) -> Value {
        Value::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_ref_object_becomes_reference() {
        let node = Node::from(json!({"$ref": "#/a", "description": "d"}));
        match node {
            Node::Reference(reference) => {
                assert_eq!(reference.target, "#/a");
                assert_eq!(reference.siblings.len(), 1);
                assert_eq!(reference.siblings["description"], Node::string("d"));
            }
            other => panic!("Expected reference, got {:?}", other),
        }
    }

    #[test]
    fn test_non_string_ref_stays_object() {
        // A schema property literally named "$ref"
        let node = Node::from(json!({"$ref": {"type": "string"}}));
        assert!(node.is_object());
        assert!(node.get("$ref").is_some());
    }

    #[test]
    fn test_to_json_restores_ref_member() {
        let value = json!({"a": [{"$ref": "other.json#/x", "summary": "s"}, 1, true, null]});
        assert_eq!(Node::from(value.clone()).to_json(), value);
    }

    #[test]
    fn test_member_order_is_preserved() {
        let node = Node::from(json!({"z": 1, "a": 2, "m": 3}));
        let keys: Vec<&str> = node
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
