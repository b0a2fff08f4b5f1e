//! Qualifier identities and primary annotation sets.

use smallvec::SmallVec;
use tqual_common::limits::ANNOTATION_INLINE_CAPACITY;

/// A qualifier in a [`QualifierHierarchy`](crate::hierarchy::QualifierHierarchy).
///
/// Ids are dense indices assigned by the hierarchy that created them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifierId(pub u32);

impl QualifierId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Sorted, duplicate-free set of qualifiers.
///
/// The set itself does not know about sub-hierarchies; the factory keeps
/// at most one qualifier per sub-hierarchy on every type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AnnotationSet(SmallVec<[QualifierId; ANNOTATION_INLINE_CAPACITY]>);

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, q: QualifierId) -> bool {
        self.0.binary_search(&q).is_ok()
    }

    /// Returns `false` if `q` was already present.
    pub fn insert(&mut self, q: QualifierId) -> bool {
        match self.0.binary_search(&q) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, q);
                true
            }
        }
    }

    pub fn remove(&mut self, q: QualifierId) -> bool {
        match self.0.binary_search(&q) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn retain(&mut self, f: impl FnMut(&mut QualifierId) -> bool) {
        self.0.retain(f);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = QualifierId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[QualifierId] {
        &self.0
    }
}

impl FromIterator<QualifierId> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = QualifierId>>(iter: I) -> Self {
        let mut set = AnnotationSet::new();
        for q in iter {
            set.insert(q);
        }
        set
    }
}

impl<'a> IntoIterator for &'a AnnotationSet {
    type Item = QualifierId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, QualifierId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_set_sorted_and_unique() {
        let mut set = AnnotationSet::new();
        assert!(set.insert(QualifierId(3)));
        assert!(set.insert(QualifierId(1)));
        assert!(!set.insert(QualifierId(3)));
        assert_eq!(set.as_slice(), &[QualifierId(1), QualifierId(3)]);
    }

    #[test]
    fn remove_and_contains() {
        let mut set: AnnotationSet = [QualifierId(2), QualifierId(0)].into_iter().collect();
        assert!(set.contains(QualifierId(0)));
        assert!(set.remove(QualifierId(0)));
        assert!(!set.remove(QualifierId(0)));
        assert_eq!(set.len(), 1);
        set.clear();
        assert!(set.is_empty());
    }
}
