//! RAII guard for reference set cleanup

use super::ReferenceSet;

/// Guard that cleans the wrapped set when dropped.
///
/// Runs hold the sets they own behind a guard so cached documents are
/// released on every exit path: success, error, or a dropped future.
///
/// # Example
///
/// ```
/// use refwalk::{Node, Reference, ReferenceSet, RefSetGuard};
///
/// let mut refs = ReferenceSet::new();
/// {
///     let mut guard = RefSetGuard::new(&mut refs);
///     guard.add(Reference::new("a.json", Node::object())).unwrap();
///     assert!(guard.has("a.json"));
/// }
/// // guard dropped, set cleaned
/// assert!(refs.is_cleaned());
/// ```
pub struct RefSetGuard<'a> {
    refs: &'a mut ReferenceSet,
}

impl<'a> RefSetGuard<'a> {
    /// Wrap a set; it is cleaned when the guard drops.
    pub fn new(refs: &'a mut ReferenceSet) -> Self {
        Self { refs }
    }
}

impl<'a> Drop for RefSetGuard<'a> {
    fn drop(&mut self) {
        self.refs.clean();
    }
}

impl<'a> std::ops::Deref for RefSetGuard<'a> {
    type Target = ReferenceSet;

    fn deref(&self) -> &Self::Target {
        self.refs
    }
}

impl<'a> std::ops::DerefMut for RefSetGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.refs
    }
}
