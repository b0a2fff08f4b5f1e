//! Qualifier hierarchies.
//!
//! A hierarchy is a set of qualifiers partitioned into sub-hierarchies, each
//! with exactly one top and one bottom. The solver never hardcodes qualifier
//! names or lattice shape; it asks a [`QualifierHierarchy`].
//!
//! Two families of operations exist:
//!
//! - the plain family, where every argument is a qualifier, plus collection
//!   forms taking one qualifier per sub-hierarchy on each side;
//! - the type-variable family, where `None` stands for "no qualifier in this
//!   sub-hierarchy", which type variables and wildcards legitimately have.

mod graph;

pub use graph::{GraphQualifierHierarchy, QualifierHierarchyBuilder};

use crate::annotations::{AnnotationSet, QualifierId};
use crate::error::{FrameworkError, TypeResult};

pub trait QualifierHierarchy {
    /// Number of qualifiers; ids are `0..qualifier_count()`.
    fn qualifier_count(&self) -> usize;

    fn qualifier_by_name(&self, name: &str) -> Option<QualifierId>;

    fn name(&self, q: QualifierId) -> &str;

    fn is_polymorphic(&self, q: QualifierId) -> bool;

    /// One top per sub-hierarchy.
    fn top_annotations(&self) -> &[QualifierId];

    /// One bottom per sub-hierarchy, in the order of [`top_annotations`](Self::top_annotations).
    fn bottom_annotations(&self) -> &[QualifierId];

    /// Top of the sub-hierarchy containing `q`.
    fn top_of(&self, q: QualifierId) -> QualifierId;

    /// Bottom of the sub-hierarchy containing `start`.
    fn bottom_annotation(&self, start: QualifierId) -> QualifierId;

    /// Reflexive, transitive subtyping. Qualifiers from different
    /// sub-hierarchies are unrelated.
    fn is_subtype(&self, sub: QualifierId, sup: QualifierId) -> bool;

    fn least_upper_bound(&self, a: QualifierId, b: QualifierId) -> TypeResult<QualifierId>;

    fn greatest_lower_bound(&self, a: QualifierId, b: QualifierId) -> TypeResult<QualifierId>;

    fn is_supported(&self, q: QualifierId) -> bool {
        q.index() < self.qualifier_count()
    }

    fn same_hierarchy(&self, a: QualifierId, b: QualifierId) -> bool {
        self.top_of(a) == self.top_of(b)
    }

    /// The member of `set` that belongs to the sub-hierarchy of `top`.
    fn find_in_hierarchy(&self, set: &AnnotationSet, top: QualifierId) -> Option<QualifierId> {
        let top = self.top_of(top);
        set.iter().find(|q| self.top_of(*q) == top)
    }

    // -------------------------------------------------------------------
    // Collection forms
    // -------------------------------------------------------------------

    /// Every qualifier of `subs` is below the qualifier of `sups` in the same
    /// sub-hierarchy.
    fn is_subtype_all(&self, subs: &AnnotationSet, sups: &AnnotationSet) -> TypeResult<bool> {
        check_collection_sizes(subs, sups)?;
        for sub in subs {
            let sup = self.find_in_hierarchy(sups, sub).ok_or_else(|| {
                FrameworkError::DifferentHierarchies {
                    left: self.name(sub).to_owned(),
                    right: format_set(self, sups),
                }
            })?;
            if !self.is_subtype(sub, sup) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn least_upper_bounds(
        &self,
        a: &AnnotationSet,
        b: &AnnotationSet,
    ) -> TypeResult<AnnotationSet> {
        check_collection_sizes(a, b)?;
        let mut out = AnnotationSet::new();
        for qa in a {
            let qb = self.find_in_hierarchy(b, qa).ok_or_else(|| {
                FrameworkError::DifferentHierarchies {
                    left: self.name(qa).to_owned(),
                    right: format_set(self, b),
                }
            })?;
            out.insert(self.least_upper_bound(qa, qb)?);
        }
        Ok(out)
    }

    fn greatest_lower_bounds(
        &self,
        a: &AnnotationSet,
        b: &AnnotationSet,
    ) -> TypeResult<AnnotationSet> {
        check_collection_sizes(a, b)?;
        let mut out = AnnotationSet::new();
        for qa in a {
            let qb = self.find_in_hierarchy(b, qa).ok_or_else(|| {
                FrameworkError::DifferentHierarchies {
                    left: self.name(qa).to_owned(),
                    right: format_set(self, b),
                }
            })?;
            out.insert(self.greatest_lower_bound(qa, qb)?);
        }
        Ok(out)
    }

    // -------------------------------------------------------------------
    // Type-variable family
    // -------------------------------------------------------------------

    /// A missing supertype qualifier accepts everything; a missing subtype
    /// qualifier is below nothing.
    fn is_subtype_type_variable(&self, sub: Option<QualifierId>, sup: Option<QualifierId>) -> bool {
        match (sub, sup) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(sub), Some(sup)) => self.is_subtype(sub, sup),
        }
    }

    /// `None` if either side is missing.
    fn least_upper_bound_type_variable(
        &self,
        a: Option<QualifierId>,
        b: Option<QualifierId>,
    ) -> TypeResult<Option<QualifierId>> {
        match (a, b) {
            (Some(a), Some(b)) => self.least_upper_bound(a, b).map(Some),
            _ => Ok(None),
        }
    }

    /// The present side if only one is missing.
    fn greatest_lower_bound_type_variable(
        &self,
        a: Option<QualifierId>,
        b: Option<QualifierId>,
    ) -> TypeResult<Option<QualifierId>> {
        match (a, b) {
            (Some(a), Some(b)) => self.greatest_lower_bound(a, b).map(Some),
            (Some(q), None) | (None, Some(q)) => Ok(Some(q)),
            (None, None) => Ok(None),
        }
    }

    /// Per sub-hierarchy [`is_subtype_type_variable`](Self::is_subtype_type_variable).
    fn is_subtype_type_variable_all(&self, subs: &AnnotationSet, sups: &AnnotationSet) -> bool {
        self.top_annotations().iter().all(|top| {
            self.is_subtype_type_variable(
                self.find_in_hierarchy(subs, *top),
                self.find_in_hierarchy(sups, *top),
            )
        })
    }
}

fn check_collection_sizes(a: &AnnotationSet, b: &AnnotationSet) -> TypeResult<()> {
    if a.is_empty() || b.is_empty() {
        return Err(FrameworkError::EmptyQualifierCollection);
    }
    if a.len() != b.len() {
        return Err(FrameworkError::QualifierCollectionSize {
            expected: a.len(),
            found: b.len(),
        });
    }
    Ok(())
}

/// `@A @B` rendering of a set.
pub fn format_set<H: QualifierHierarchy + ?Sized>(hierarchy: &H, set: &AnnotationSet) -> String {
    let mut out = String::new();
    for (i, q) in set.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push('@');
        out.push_str(hierarchy.name(q));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/hierarchy_tests.rs"]
mod tests;
