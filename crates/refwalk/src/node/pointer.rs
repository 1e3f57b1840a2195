//! JSON Pointers and traversal positions

use std::fmt;

use thiserror::Error;

use super::Node;

/// Errors raised while parsing or evaluating a JSON Pointer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    /// The fragment is not a valid JSON Pointer
    #[error("invalid JSON pointer '{pointer}'")]
    Syntax {
        /// The rejected fragment
        pointer: String,
    },

    /// A token has no matching member or item
    #[error("JSON pointer '{pointer}' has no target at '{token}'")]
    NotFound {
        /// The whole pointer
        pointer: String,
        /// The first token that failed
        token: String,
    },
}

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array item
    Index(usize),
}

impl PathSegment {
    /// The member name, if this is a key segment.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(&escape(key)),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Position of a node in the tree being traversed.
///
/// Displays as a JSON Pointer (`""` for the root).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// The root position.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from member names (convenience for tests and hooks).
    pub fn from_keys<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            segments: keys.into_iter().map(|k| PathSegment::Key(k.into())).collect(),
        }
    }

    /// Descend into a child.
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Return to the parent.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root position.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Last segment.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The segment `n` steps above the last one (`0` is the last).
    pub fn nth_from_end(&self, n: usize) -> Option<&PathSegment> {
        self.segments.len().checked_sub(n + 1).map(|i| &self.segments[i])
    }

    /// Check whether `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &NodePath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Render as a JSON Pointer string.
    pub fn to_pointer(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// A parsed RFC 6901 JSON Pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    /// Pointer to the whole document.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a URI fragment (without the leading `#`).
    ///
    /// Percent-escapes are decoded before `~1` / `~0` unescaping.
    pub fn parse(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode(fragment).ok_or_else(|| PointerError::Syntax {
            pointer: fragment.to_string(),
        })?;
        if decoded.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = decoded.strip_prefix('/') else {
            return Err(PointerError::Syntax {
                pointer: fragment.to_string(),
            });
        };
        let tokens = rest.split('/').map(unescape).collect();
        Ok(Self { tokens })
    }

    /// Unescaped reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Check if this points at the whole document.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Find the node this pointer designates inside `document`.
    ///
    /// Reference nodes met on the way are only entered through their
    /// sibling members; the pointer never follows a `$ref`.
    pub fn evaluate<'a>(&self, document: &'a Node) -> Result<&'a Node, PointerError> {
        let mut current = document;
        for token in &self.tokens {
            let next = match current {
                Node::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
                other => other.get(token),
            };
            current = next.ok_or_else(|| PointerError::NotFound {
                pointer: self.to_string(),
                token: token.clone(),
            })?;
        }
        Ok(current)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn percent_decode(input: &str) -> Option<String> {
    if !input.contains('%') {
        return Some(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Node {
        Node::object_from([
            (
                "a",
                Node::object_from([("b/c", Node::string("slash")), ("m~n", Node::string("tilde"))]),
            ),
            ("list", Node::array(vec![Node::string("zero"), Node::string("one")])),
        ])
    }

    #[test]
    fn test_parse_root() {
        assert!(JsonPointer::parse("").unwrap().is_root());
    }

    #[test]
    fn test_parse_rejects_missing_slash() {
        assert!(matches!(
            JsonPointer::parse("a/b"),
            Err(PointerError::Syntax { .. })
        ));
    }

    #[test]
    fn test_evaluate_escaped_tokens() {
        let doc = doc();
        let slash = JsonPointer::parse("/a/b~1c").unwrap();
        let tilde = JsonPointer::parse("/a/m~0n").unwrap();
        assert_eq!(slash.evaluate(&doc).unwrap(), &Node::string("slash"));
        assert_eq!(tilde.evaluate(&doc).unwrap(), &Node::string("tilde"));
    }

    #[test]
    fn test_evaluate_percent_encoded() {
        let doc = doc();
        let pointer = JsonPointer::parse("/a/b~1c").unwrap();
        let encoded = JsonPointer::parse("/a/b%7E1c").unwrap();
        assert_eq!(pointer, encoded);
        assert!(encoded.evaluate(&doc).is_ok());
    }

    #[test]
    fn test_evaluate_array_index() {
        let doc = doc();
        let pointer = JsonPointer::parse("/list/1").unwrap();
        assert_eq!(pointer.evaluate(&doc).unwrap(), &Node::string("one"));
    }

    #[test]
    fn test_evaluate_missing() {
        let doc = doc();
        let err = JsonPointer::parse("/a/zzz").unwrap().evaluate(&doc).unwrap_err();
        assert_eq!(
            err,
            PointerError::NotFound {
                pointer: "/a/zzz".to_string(),
                token: "zzz".to_string(),
            }
        );
    }

    #[test]
    fn test_pointer_display_round_trips_escapes() {
        let pointer = JsonPointer::parse("/paths/~1pets~1{id}").unwrap();
        assert_eq!(pointer.tokens(), &["paths".to_string(), "/pets/{id}".to_string()]);
        assert_eq!(pointer.to_string(), "/paths/~1pets~1{id}");
    }

    #[test]
    fn test_node_path_display() {
        let mut path = NodePath::from_keys(["paths", "/pets"]);
        path.push(PathSegment::Index(2));
        assert_eq!(path.to_pointer(), "/paths/~1pets/2");
        assert_eq!(NodePath::root().to_pointer(), "");
    }

    #[test]
    fn test_node_path_nth_from_end() {
        let path = NodePath::from_keys(["a", "b", "c"]);
        assert_eq!(path.nth_from_end(0), Some(&PathSegment::Key("c".into())));
        assert_eq!(path.nth_from_end(2), Some(&PathSegment::Key("a".into())));
        assert_eq!(path.nth_from_end(3), None);
    }
}
