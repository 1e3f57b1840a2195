//! Stack of references currently being expanded

use crate::node::{uri, NodePath};

/// One reference on the expansion stack.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    /// `uri#pointer` of the target
    key: String,

    /// Document the target lives in, base for nested relative references
    document: String,
}

/// The references whose content is currently being walked.
///
/// Uses a flat stack with frame boundaries: one reference node may push
/// several entries (a chain of references), and all of them are dropped
/// together when the traversal leaves that node's position.
///
/// # Example
///
/// ```
/// use refwalk::visitor::Ancestors;
/// use refwalk::NodePath;
///
/// let mut ancestors = Ancestors::new();
/// let at = NodePath::from_keys(["a"]);
///
/// let boundary = ancestors.len();
/// ancestors.push("root.json#/b", "root.json");
/// ancestors.push("other.json#/c", "other.json");
/// ancestors.mark_frame(at.clone(), boundary);
///
/// assert!(ancestors.contains("root.json#/b"));
/// assert_eq!(ancestors.current_document(), Some("other.json"));
///
/// ancestors.pop_frame_at(&at);
/// assert!(ancestors.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Ancestors {
    entries: Vec<Entry>,

    /// Position that owns each frame, and where its entries begin
    frames: Vec<(NodePath, usize)>,
}

impl Ancestors {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stack pre-populated with keys that count as already
    /// being expanded.
    ///
    /// Seeded keys never pop; a reference to any of them is a cycle.
    pub fn with_seed<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        let entries = keys
            .into_iter()
            .map(|key| {
                let key = key.into();
                let document = uri::strip_fragment(&key).to_string();
                Entry { key, document }
            })
            .collect();
        Self {
            entries,
            frames: Vec::new(),
        }
    }

    /// Push a reference key.
    pub fn push(&mut self, key: impl Into<String>, document: impl Into<String>) {
        self.entries.push(Entry {
            key: key.into(),
            document: document.into(),
        });
    }

    /// Check if a key is on the stack.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries down to `len`.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Keys on the stack, outermost first.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Frames
    // ═══════════════════════════════════════════════════════════════════

    /// Tie the entries pushed since `boundary` to the node at `path`.
    pub fn mark_frame(&mut self, path: NodePath, boundary: usize) {
        self.frames.push((path, boundary));
    }

    /// Pop the innermost frame if it belongs to `path`.
    ///
    /// Returns whether a frame was popped.
    pub fn pop_frame_at(&mut self, path: &NodePath) -> bool {
        match self.frames.last() {
            Some((owner, _)) if owner == path => {
                if let Some((_, boundary)) = self.frames.pop() {
                    self.entries.truncate(boundary);
                }
                true
            }
            _ => false,
        }
    }

    /// Get the number of open frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Document of the innermost entry.
    pub fn current_document(&self) -> Option<&str> {
        self.entries.last().map(|entry| entry.document.as_str())
    }

    /// The keys forming the loop that `key` would close.
    ///
    /// Returns the keys from the first occurrence of `key` to the top of
    /// the stack, sorted so the same loop entered at a different point
    /// yields the same identity.
    pub fn cycle_keys(&self, key: &str) -> Option<Vec<String>> {
        let start = self.entries.iter().position(|entry| entry.key == key)?;
        let mut keys: Vec<String> = self.entries[start..]
            .iter()
            .map(|entry| entry.key.clone())
            .collect();
        keys.sort();
        keys.dedup();
        Some(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frames_pop_only_at_owner() {
        let mut ancestors = Ancestors::new();
        let outer = NodePath::from_keys(["a"]);
        let inner = NodePath::from_keys(["a", "b"]);

        ancestors.push("r#/x", "r");
        ancestors.mark_frame(outer.clone(), 0);
        ancestors.push("r#/y", "r");
        ancestors.push("s#/z", "s");
        ancestors.mark_frame(inner.clone(), 1);
        assert_eq!(ancestors.len(), 3);
        assert_eq!(ancestors.depth(), 2);

        assert!(!ancestors.pop_frame_at(&outer));
        assert_eq!(ancestors.len(), 3);

        assert!(ancestors.pop_frame_at(&inner));
        assert_eq!(ancestors.keys().collect::<Vec<_>>(), vec!["r#/x"]);

        assert!(ancestors.pop_frame_at(&outer));
        assert!(ancestors.is_empty());
    }

    #[test]
    fn test_current_document() {
        let mut ancestors = Ancestors::new();
        assert_eq!(ancestors.current_document(), None);
        ancestors.push("specs/root.yaml#/a", "specs/root.yaml");
        ancestors.push("specs/common.yaml#/b", "specs/common.yaml");
        assert_eq!(ancestors.current_document(), Some("specs/common.yaml"));
    }

    #[test]
    fn test_cycle_keys_identity() {
        let mut first = Ancestors::new();
        first.push("r#/outer", "r");
        first.push("r#/a", "r");
        first.push("r#/b", "r");

        let mut second = Ancestors::new();
        second.push("r#/b", "r");
        second.push("r#/a", "r");

        let expected = vec!["r#/a".to_string(), "r#/b".to_string()];
        assert_eq!(first.cycle_keys("r#/a"), Some(expected.clone()));
        assert_eq!(second.cycle_keys("r#/b"), Some(expected));
        assert_eq!(first.cycle_keys("r#/missing"), None);
    }

    #[test]
    fn test_seed_is_permanent() {
        let mut ancestors = Ancestors::with_seed(["root.json#/components/schemas/Pet"]);
        assert!(ancestors.contains("root.json#/components/schemas/Pet"));
        assert_eq!(ancestors.current_document(), Some("root.json"));

        assert!(!ancestors.pop_frame_at(&NodePath::root()));
        assert_eq!(ancestors.len(), 1);
    }
}
