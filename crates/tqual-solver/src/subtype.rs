//! Qualified subtyping.
//!
//! [`SubtypeChecker`] decides `sub <: sup` one sub-hierarchy at a time: a
//! pair of types is a subtype iff it is one under every top of the
//! qualifier hierarchy. Within a sub-hierarchy the checker dispatches on the
//! pair of kinds; the rules live in [`crate::subtype_rules`].
//!
//! Checking one sub-hierarchy at a time matters for type variables: two
//! unannotated uses of the same parameter are trivially related in one
//! sub-hierarchy while another sub-hierarchy may require descending into
//! their bounds.

use crate::annotations::QualifierId;
use crate::atm::{AtmId, AtmKind};
use crate::error::{FrameworkError, TypeResult};
use crate::factory::AnnotatedTypeFactory;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::visit_history::VisitHistory;
use tracing::{debug, debug_span, trace};

pub struct SubtypeChecker<'f, 'env> {
    pub(crate) factory: &'f mut AnnotatedTypeFactory<'env>,
    pub(crate) current_top: QualifierId,
    /// Results of `check_and_subtype` and declared-type comparisons.
    pub(crate) visit_history: VisitHistory,
    /// Type-argument containment checks in progress or done; shared with
    /// the equality comparer.
    pub(crate) typearg_history: VisitHistory,
    depth: DepthCounter,
}

impl<'env> AnnotatedTypeFactory<'env> {
    /// Is `sub` a subtype of `sup` in every sub-hierarchy?
    pub fn is_subtype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        SubtypeChecker::new(self).is_subtype(sub, sup)
    }

    /// Is `sub` a subtype of `sup` in the sub-hierarchy of `top`?
    pub fn is_subtype_in_hierarchy(
        &mut self,
        sub: AtmId,
        sup: AtmId,
        top: QualifierId,
    ) -> TypeResult<bool> {
        let top = self.hierarchy().top_of(top);
        SubtypeChecker::new(self).is_subtype_in_hierarchy(sub, sup, top)
    }
}

impl<'f, 'env> SubtypeChecker<'f, 'env> {
    pub fn new(factory: &'f mut AnnotatedTypeFactory<'env>) -> Self {
        let current_top = factory
            .hierarchy()
            .top_annotations()
            .first()
            .copied()
            .unwrap_or(QualifierId(0));
        Self {
            factory,
            current_top,
            visit_history: VisitHistory::new(),
            typearg_history: VisitHistory::new(),
            depth: DepthCounter::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    pub fn is_subtype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let _span = debug_span!("is_subtype").entered();
        let tops = self.factory.hierarchy().top_annotations().to_vec();
        for top in tops {
            if !self.is_subtype_in_hierarchy(sub, sup, top)? {
                debug!(
                    sub = %self.factory.format(sub),
                    sup = %self.factory.format(sup),
                    top = %self.factory.hierarchy().name(top),
                    "not a subtype"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn is_subtype_in_hierarchy(
        &mut self,
        sub: AtmId,
        sup: AtmId,
        top: QualifierId,
    ) -> TypeResult<bool> {
        self.current_top = top;
        self.visit(sub, sup)
    }

    /// One kind-pair dispatch in the current sub-hierarchy.
    pub(crate) fn visit(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        self.depth.enter_or_fail(RecursionProfile::SubtypeCheck)?;
        let result = self.visit_pair(sub, sup);
        self.depth.leave();
        trace!(sub = sub.0, sup = sup.0, result = ?result.as_ref().ok(), "visit");
        result
    }

    fn visit_pair(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        use AtmKind::*;
        let sup_kind = self.factory.kind(sup);
        match self.factory.kind(sub) {
            Array => match sup_kind {
                Array => self.visit_array_array(sub, sup),
                Declared | Null => self.is_primary_subtype(sub, sup),
                Intersection => self.visit_intersection_supertype(sub, sup),
                TypeVariable => self.visit_typevar_supertype(sub, sup),
                Wildcard => self.visit_wildcard_supertype(sub, sup),
                Executable | Primitive | NoType | Union => self.incomparable(sub, sup),
            },
            Declared => match sup_kind {
                Array | Null => self.is_primary_subtype(sub, sup),
                Declared => self.visit_declared_declared(sub, sup),
                Intersection => self.visit_intersection_supertype(sub, sup),
                Primitive => self.visit_declared_primitive(sub, sup),
                TypeVariable => self.visit_typevar_supertype(sub, sup),
                Union => self.visit_declared_union(sub, sup),
                Wildcard => self.visit_wildcard_supertype(sub, sup),
                Executable | NoType => self.incomparable(sub, sup),
            },
            Intersection => match sup_kind {
                Declared => self.visit_intersection_declared(sub, sup),
                Intersection => self.visit_intersection_intersection(sub, sup),
                Null => self.visit_intersection_null(sub, sup),
                Primitive => self.visit_intersection_primitive(sub, sup),
                TypeVariable => self.visit_intersection_typevar(sub, sup),
                Wildcard => self.visit_wildcard_supertype(sub, sup),
                Array | Executable | NoType | Union => self.incomparable(sub, sup),
            },
            Null => match sup_kind {
                Array | Declared | Intersection | Null | Primitive => {
                    self.is_primary_subtype(sub, sup)
                }
                TypeVariable => self.visit_typevar_supertype(sub, sup),
                Union => self.visit_null_union(sub, sup),
                Wildcard => self.visit_wildcard_supertype(sub, sup),
                Executable | NoType => self.incomparable(sub, sup),
            },
            Primitive => match sup_kind {
                Declared => self.visit_primitive_declared(sub, sup),
                Intersection => self.visit_intersection_supertype(sub, sup),
                Primitive => self.is_primary_subtype(sub, sup),
                TypeVariable => {
                    let upper = self.factory.upper_bound(sup)?;
                    self.visit(sub, upper)
                }
                Wildcard => self.visit_primitive_wildcard(sub, sup),
                Array | Executable | Null | NoType | Union => self.incomparable(sub, sup),
            },
            Union => match sup_kind {
                Declared | Intersection | Union => self.visit_union_subtype(sub, sup),
                Wildcard => self.visit_wildcard_supertype(sub, sup),
                Array | Executable | Null | NoType | Primitive | TypeVariable => {
                    self.incomparable(sub, sup)
                }
            },
            TypeVariable => match sup_kind {
                Array | Declared | Null | Primitive => self.visit_typevar_subtype(sub, sup),
                Intersection => self.visit_intersection_supertype(sub, sup),
                TypeVariable => self.visit_typevar_typevar(sub, sup),
                Wildcard => self.visit_wildcard_supertype(sub, sup),
                Executable | NoType | Union => self.incomparable(sub, sup),
            },
            Wildcard => match sup_kind {
                Array | Intersection | TypeVariable | Wildcard => {
                    self.visit_wildcard_subtype(sub, sup)
                }
                Declared => self.visit_wildcard_declared(sub, sup),
                Primitive => self.visit_wildcard_primitive(sub, sup),
                Executable | Null | NoType | Union => self.incomparable(sub, sup),
            },
            Executable | NoType => self.incomparable(sub, sup),
        }
    }

    fn incomparable(&self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        Err(FrameworkError::IncomparableTypes {
            sub: self.factory.format(sub),
            sup: self.factory.format(sup),
            history: self.visit_history.to_string(),
        })
    }

    // -------------------------------------------------------------------------
    // Shared helpers
    // -------------------------------------------------------------------------

    /// Primary qualifiers of `sub` and `sup` in the current sub-hierarchy.
    pub(crate) fn is_primary_subtype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        self.is_primary_subtype_with(sub, sup, false)
    }

    /// With `annos_can_be_empty`, two missing qualifiers compare as equal.
    /// Any other missing qualifier is a malformed type.
    pub(crate) fn is_primary_subtype_with(
        &mut self,
        sub: AtmId,
        sup: AtmId,
        annos_can_be_empty: bool,
    ) -> TypeResult<bool> {
        let top = self.current_top;
        let sub_anno = self.factory.annotation_in_hierarchy(sub, top);
        let sup_anno = self.factory.annotation_in_hierarchy(sup, top);
        self.is_anno_subtype((sub, sub_anno), (sup, sup_anno), annos_can_be_empty)
    }

    /// Qualifier comparison; the handles only name the types in errors.
    pub(crate) fn is_anno_subtype(
        &self,
        (sub, sub_anno): (AtmId, Option<QualifierId>),
        (sup, sup_anno): (AtmId, Option<QualifierId>),
        annos_can_be_empty: bool,
    ) -> TypeResult<bool> {
        match (sub_anno, sup_anno) {
            (None, None) if annos_can_be_empty => Ok(true),
            (Some(a), Some(b)) => Ok(self.factory.hierarchy().is_subtype(a, b)),
            (None, _) => Err(self.factory.missing_annotation(sub, self.current_top)),
            (_, None) => Err(self.factory.missing_annotation(sup, self.current_top)),
        }
    }

    /// [`visit`](Self::visit) memoized in the visit history. The pair is
    /// assumed related while its own check is in progress.
    pub(crate) fn check_and_subtype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let top = Some(self.current_top);
        if let Some(known) = self.visit_history.result(sub, sup, top) {
            return Ok(known);
        }
        self.visit_history.add(sub, sup, top, true);
        let result = self.visit(sub, sup)?;
        self.visit_history.add(sub, sup, top, result);
        Ok(result)
    }

    pub(crate) fn is_subtype_of_all(&mut self, sub: AtmId, sups: &[AtmId]) -> TypeResult<bool> {
        for sup in sups {
            if !self.visit(sub, *sup)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) fn are_all_subtypes(&mut self, subs: &[AtmId], sup: AtmId) -> TypeResult<bool> {
        for sub in subs {
            if !self.visit(*sub, sup)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Structural equality in the current sub-hierarchy, sharing the
    /// type-argument history. Arguments of different kinds are unequal.
    pub(crate) fn are_equal_in_hierarchy(&mut self, a: AtmId, b: AtmId) -> TypeResult<bool> {
        let mut comparer = crate::equality::StructuralEqualityComparer::new(
            &mut *self.factory,
            Some(self.current_top),
        )
        .mismatched_kinds_unequal();
        comparer.are_equal(a, b, &mut self.typearg_history)
    }

    /// An uninferred wildcard while the factory ignores them.
    pub(crate) fn ignores_uninferred(&self, id: AtmId) -> bool {
        self.factory.config().ignore_uninferred_type_arguments
            && self.factory.kind(id) == AtmKind::Wildcard
            && self.factory.is_uninferred(id)
    }
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod tests;
