//! Identity-keyed memo of comparisons already made.
//!
//! Recursive bounds make the subtype and equality walks revisit the same
//! pair of nodes. Recording a pair before descending, and answering a
//! revisit from the record, is what makes those walks terminate.

use crate::annotations::QualifierId;
use crate::atm::AtmId;
use indexmap::IndexMap;
use std::fmt;

/// Key: `(left, right, sub-hierarchy)`, compared by node identity.
type VisitKey = (AtmId, AtmId, Option<QualifierId>);

#[derive(Clone, Debug, Default)]
pub struct VisitHistory {
    visited: IndexMap<VisitKey, bool>,
}

impl VisitHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, left: AtmId, right: AtmId, top: Option<QualifierId>, result: bool) {
        self.visited.insert((left, right, top), result);
    }

    /// The recorded result, if this pair was visited.
    pub fn result(&self, left: AtmId, right: AtmId, top: Option<QualifierId>) -> Option<bool> {
        self.visited.get(&(left, right, top)).copied()
    }

    pub fn contains(&self, left: AtmId, right: AtmId, top: Option<QualifierId>) -> bool {
        self.visited.contains_key(&(left, right, top))
    }

    pub fn remove(&mut self, left: AtmId, right: AtmId, top: Option<QualifierId>) {
        self.visited.shift_remove(&(left, right, top));
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    pub fn clear(&mut self) {
        self.visited.clear();
    }
}

impl fmt::Display for VisitHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, ((left, right, _), result)) in self.visited.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "#{} => #{}: {}", left.0, right.0, result)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_by_identity_and_hierarchy() {
        let mut history = VisitHistory::new();
        history.add(AtmId(1), AtmId(2), Some(QualifierId(0)), true);

        assert_eq!(history.result(AtmId(1), AtmId(2), Some(QualifierId(0))), Some(true));
        assert_eq!(history.result(AtmId(2), AtmId(1), Some(QualifierId(0))), None);
        assert!(!history.contains(AtmId(1), AtmId(2), Some(QualifierId(1))));

        history.add(AtmId(1), AtmId(2), Some(QualifierId(0)), false);
        assert_eq!(history.len(), 1);
        assert_eq!(history.to_string(), "[#1 => #2: false]");

        history.remove(AtmId(1), AtmId(2), Some(QualifierId(0)));
        assert!(history.is_empty());
    }
}
