//! References and the reference set that caches them

mod guard;

pub use guard::RefSetGuard;

use indexmap::IndexMap;

use crate::error::RefSetError;
use crate::node::Node;

/// Scheme prefix of references held by a copy-on-resolve working set.
pub const IMMUTABLE_SCHEME: &str = "immutable://";

/// One resolved document instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Identifier of the document (synthetic in a working set)
    pub uri: String,

    /// Parsed tree of the document
    pub value: Node,

    /// Whether a run already replaced `value` with dereferenced content
    pub dirty: bool,
}

impl Reference {
    /// Create a clean reference.
    pub fn new(uri: impl Into<String>, value: Node) -> Self {
        Self {
            uri: uri.into(),
            value,
            dirty: false,
        }
    }

    /// The URI with any `immutable://` wrapper removed.
    pub fn canonical_uri(&self) -> &str {
        self.uri
            .strip_prefix(IMMUTABLE_SCHEME)
            .unwrap_or(self.uri.as_str())
    }

    /// Whether this reference lives under a synthetic URI.
    pub fn is_synthetic(&self) -> bool {
        self.uri.starts_with(IMMUTABLE_SCHEME)
    }
}

/// What `add` does when the URI is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupPolicy {
    /// Replace the stored reference
    #[default]
    Replace,

    /// Keep the stored reference and fail with [`RefSetError::Duplicate`]
    Reject,
}

/// A cache of resolved documents keyed by URI.
///
/// Lookups are hash-based; iteration follows insertion order so replays
/// and diagnostics are deterministic.
///
/// # Example
///
/// ```
/// use refwalk::{Node, Reference, ReferenceSet};
///
/// let mut refs = ReferenceSet::new();
/// refs.add(Reference::new("root.json", Node::object())).unwrap();
///
/// assert!(refs.has("root.json"));
/// assert_eq!(refs.root().map(|r| r.uri.as_str()), Some("root.json"));
///
/// refs.clean();
/// assert!(refs.find("root.json").is_none());
/// assert!(refs.add(Reference::new("other.json", Node::object())).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    refs: IndexMap<String, Reference>,

    /// URI of the document a run starts from
    root_uri: Option<String>,

    policy: DedupPolicy,

    /// Working sets store every reference under `immutable://`
    synthetic: bool,

    cleaned: bool,
}

impl ReferenceSet {
    /// Create an empty set with the `Replace` policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with an explicit dedup policy.
    pub fn with_policy(policy: DedupPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The dedup policy.
    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Deep-clone every reference into a copy-on-resolve working set.
    ///
    /// Each clone is stored under `immutable://<uri>`; lookups on the
    /// working set keep using canonical URIs.
    pub fn working_copy(&self) -> Self {
        let refs = self
            .refs
            .values()
            .map(|reference| {
                let uri = synthetic_uri(reference.canonical_uri());
                let copy = Reference {
                    uri: uri.clone(),
                    value: reference.value.clone(),
                    dirty: reference.dirty,
                };
                (uri, copy)
            })
            .collect();
        Self {
            refs,
            root_uri: self.root_uri.clone(),
            policy: DedupPolicy::Replace,
            synthetic: true,
            cleaned: self.cleaned,
        }
    }

    /// Whether this is a copy-on-resolve working set.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// The key a canonical URI is stored under in this set.
    pub fn storage_uri(&self, uri: &str) -> String {
        if self.synthetic && !uri.starts_with(IMMUTABLE_SCHEME) {
            synthetic_uri(uri)
        } else {
            uri.to_string()
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Membership
    // ═══════════════════════════════════════════════════════════════════

    /// Add a reference.
    ///
    /// In a working set the reference is re-keyed under `immutable://`.
    /// The first reference added becomes the root unless one was set.
    ///
    /// # Errors
    ///
    /// - `Cleaned` if the set was cleaned
    /// - `Duplicate` if the URI is present and the policy is `Reject`
    pub fn add(&mut self, mut reference: Reference) -> Result<(), RefSetError> {
        if self.cleaned {
            return Err(RefSetError::Cleaned);
        }
        reference.uri = self.storage_uri(&reference.uri);
        if self.refs.contains_key(&reference.uri) && self.policy == DedupPolicy::Reject {
            return Err(RefSetError::Duplicate { uri: reference.uri });
        }
        if self.root_uri.is_none() {
            self.root_uri = Some(reference.canonical_uri().to_string());
        }
        self.refs.insert(reference.uri.clone(), reference);
        Ok(())
    }

    /// Check if a reference exists for the URI.
    pub fn has(&self, uri: &str) -> bool {
        !self.cleaned && self.refs.contains_key(&self.storage_uri(uri))
    }

    /// Look up a reference by URI.
    pub fn find(&self, uri: &str) -> Option<&Reference> {
        if self.cleaned {
            return None;
        }
        self.refs.get(&self.storage_uri(uri))
    }

    /// Look up a mutable reference by URI.
    pub fn find_mut(&mut self, uri: &str) -> Option<&mut Reference> {
        if self.cleaned {
            return None;
        }
        let key = self.storage_uri(uri);
        self.refs.get_mut(&key)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Root
    // ═══════════════════════════════════════════════════════════════════

    /// Mark the reference a run starts from.
    pub fn set_root(&mut self, uri: impl Into<String>) {
        self.root_uri = Some(uri.into());
    }

    /// The root reference, if one is registered.
    pub fn root(&self) -> Option<&Reference> {
        self.root_uri.as_deref().and_then(|uri| self.find(uri))
    }

    /// Canonical URI of the root reference.
    pub fn root_uri(&self) -> Option<&str> {
        self.root_uri.as_deref()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Iteration and Lifecycle
    // ═══════════════════════════════════════════════════════════════════

    /// Iterate over references in insertion order.
    pub fn refs(&self) -> impl Iterator<Item = &Reference> {
        self.refs.values()
    }

    /// Canonical URIs of every reference.
    pub fn uris(&self) -> Vec<&str> {
        self.refs.values().map(Reference::canonical_uri).collect()
    }

    /// Get the number of references.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Check if `clean()` was called.
    pub fn is_cleaned(&self) -> bool {
        self.cleaned
    }

    /// Release every held value and refuse further writes.
    pub fn clean(&mut self) {
        self.refs = IndexMap::new();
        self.root_uri = None;
        self.cleaned = true;
    }

    /// Copy synthetic references back into `target` under their canonical
    /// URIs, skipping URIs `target` already holds.
    ///
    /// Only documents fetched during a copy-on-resolve run are new to the
    /// caller's set, so the caller's own references are never overwritten.
    /// Returns the number of references added.
    pub fn replay_into(&self, target: &mut ReferenceSet) -> Result<usize, RefSetError> {
        let mut added = 0;
        for reference in self.refs.values().filter(|r| r.is_synthetic()) {
            let uri = reference.canonical_uri();
            if target.has(uri) {
                continue;
            }
            target.add(Reference {
                uri: uri.to_string(),
                value: reference.value.clone(),
                dirty: reference.dirty,
            })?;
            added += 1;
        }
        Ok(added)
    }
}

fn synthetic_uri(uri: &str) -> String {
    format!("{}{}", IMMUTABLE_SCHEME, uri)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> Node {
        Node::object_from([("name", Node::string(name))])
    }

    #[test]
    fn test_add_find_has() {
        let mut refs = ReferenceSet::new();
        refs.add(Reference::new("a.json", doc("a"))).unwrap();

        assert!(refs.has("a.json"));
        assert!(!refs.has("b.json"));
        assert_eq!(refs.find("a.json").unwrap().value, doc("a"));
        assert!(refs.find("b.json").is_none());
    }

    #[test]
    fn test_first_reference_becomes_root() {
        let mut refs = ReferenceSet::new();
        refs.add(Reference::new("a.json", doc("a"))).unwrap();
        refs.add(Reference::new("b.json", doc("b"))).unwrap();
        assert_eq!(refs.root_uri(), Some("a.json"));

        refs.set_root("b.json");
        assert_eq!(refs.root().unwrap().value, doc("b"));
    }

    #[test]
    fn test_duplicate_replaces_by_default() {
        let mut refs = ReferenceSet::new();
        refs.add(Reference::new("a.json", doc("old"))).unwrap();
        refs.add(Reference::new("a.json", doc("new"))).unwrap();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs.find("a.json").unwrap().value, doc("new"));
    }

    #[test]
    fn test_duplicate_rejected_by_policy() {
        let mut refs = ReferenceSet::with_policy(DedupPolicy::Reject);
        refs.add(Reference::new("a.json", doc("old"))).unwrap();
        let err = refs.add(Reference::new("a.json", doc("new"))).unwrap_err();

        assert_eq!(
            err,
            RefSetError::Duplicate {
                uri: "a.json".to_string()
            }
        );
        assert_eq!(refs.find("a.json").unwrap().value, doc("old"));
    }

    #[test]
    fn test_find_on_empty_set() {
        let refs = ReferenceSet::new();
        assert!(refs.find("a.json").is_none());
        assert!(refs.root().is_none());
    }

    #[test]
    fn test_clean_releases_and_locks() {
        let mut refs = ReferenceSet::new();
        refs.add(Reference::new("a.json", doc("a"))).unwrap();
        refs.clean();

        assert!(refs.is_cleaned());
        assert!(refs.is_empty());
        assert!(!refs.has("a.json"));
        assert!(refs.find_mut("a.json").is_none());
        assert_eq!(
            refs.add(Reference::new("a.json", doc("a"))),
            Err(RefSetError::Cleaned)
        );
    }

    #[test]
    fn test_working_copy_uses_synthetic_uris() {
        let mut refs = ReferenceSet::new();
        refs.add(Reference::new("a.json", doc("a"))).unwrap();
        let working = refs.working_copy();

        assert!(working.is_synthetic());
        assert!(working.has("a.json"));
        let copy = working.find("a.json").unwrap();
        assert_eq!(copy.uri, "immutable://a.json");
        assert_eq!(copy.canonical_uri(), "a.json");
        assert_eq!(working.root_uri(), Some("a.json"));
    }

    #[test]
    fn test_working_copy_is_deep() {
        let mut refs = ReferenceSet::new();
        refs.add(Reference::new("a.json", doc("a"))).unwrap();
        let mut working = refs.working_copy();

        working.find_mut("a.json").unwrap().value = doc("changed");
        assert_eq!(refs.find("a.json").unwrap().value, doc("a"));
    }

    #[test]
    fn test_replay_adds_only_missing() {
        let mut caller = ReferenceSet::new();
        caller.add(Reference::new("a.json", doc("a"))).unwrap();

        let mut working = caller.working_copy();
        working.find_mut("a.json").unwrap().value = doc("mutated");
        working.add(Reference::new("b.json", doc("b"))).unwrap();

        let added = working.replay_into(&mut caller).unwrap();
        assert_eq!(added, 1);
        assert_eq!(caller.find("a.json").unwrap().value, doc("a"));
        assert_eq!(caller.find("b.json").unwrap().uri, "b.json");
    }

    #[test]
    fn test_uris_are_canonical() {
        let mut refs = ReferenceSet::new();
        refs.add(Reference::new("a.json", doc("a"))).unwrap();
        refs.add(Reference::new("b.json", doc("b"))).unwrap();
        assert_eq!(refs.working_copy().uris(), vec!["a.json", "b.json"]);
    }
}
