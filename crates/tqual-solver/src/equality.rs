//! Structural equality of annotated types.
//!
//! Equality compares primary annotations (in one sub-hierarchy, or the whole
//! set when no sub-hierarchy is fixed) and recurses into type arguments,
//! array components and bounds. Pairs of type variables, wildcards and
//! declared types are recorded in a [`VisitHistory`] before descending; a
//! revisited pair is assumed equal, which is what makes recursive bounds
//! comparable.

use crate::annotations::QualifierId;
use crate::atm::{AtmId, AtmKind};
use crate::error::{FrameworkError, TypeResult};
use crate::factory::AnnotatedTypeFactory;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::visit_history::VisitHistory;
use tqual_host::{is_subtype, unboxed_primitive};
use tracing::trace;

pub struct StructuralEqualityComparer<'f, 'env> {
    factory: &'f mut AnnotatedTypeFactory<'env>,
    current_top: Option<QualifierId>,
    mismatch_is_unequal: bool,
    depth: DepthCounter,
}

impl<'env> AnnotatedTypeFactory<'env> {
    /// Are `a` and `b` equal, comparing every sub-hierarchy?
    pub fn are_equal(&mut self, a: AtmId, b: AtmId) -> TypeResult<bool> {
        let mut history = VisitHistory::new();
        StructuralEqualityComparer::new(self, None).are_equal(a, b, &mut history)
    }

    /// Are `a` and `b` equal in the sub-hierarchy of `top`?
    pub fn are_equal_in_hierarchy(
        &mut self,
        a: AtmId,
        b: AtmId,
        top: QualifierId,
    ) -> TypeResult<bool> {
        let mut history = VisitHistory::new();
        StructuralEqualityComparer::new(self, Some(top)).are_equal(a, b, &mut history)
    }
}

impl<'f, 'env> StructuralEqualityComparer<'f, 'env> {
    pub fn new(factory: &'f mut AnnotatedTypeFactory<'env>, top: Option<QualifierId>) -> Self {
        Self {
            factory,
            current_top: top,
            mismatch_is_unequal: false,
            depth: DepthCounter::with_profile(RecursionProfile::Equality),
        }
    }

    /// Kind pairs without a rule compare unequal instead of failing. An
    /// uninferred wildcard on either side is compared by effective
    /// annotations. Type arguments in subtype queries are compared this way.
    pub fn mismatched_kinds_unequal(mut self) -> Self {
        self.mismatch_is_unequal = true;
        self
    }

    pub fn are_equal(
        &mut self,
        a: AtmId,
        b: AtmId,
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        self.depth.enter_or_fail(RecursionProfile::Equality)?;
        let result = self.visit_pair(a, b, history);
        self.depth.leave();
        result
    }

    fn visit_pair(&mut self, a: AtmId, b: AtmId, history: &mut VisitHistory) -> TypeResult<bool> {
        let right = self.factory.kind(b);
        match self.factory.kind(a) {
            AtmKind::Array if right == AtmKind::Array => self.visit_array_array(a, b, history),
            AtmKind::Declared if right == AtmKind::Declared => {
                self.visit_declared_declared(a, b, history)
            }
            AtmKind::Declared if right == AtmKind::Primitive => self.visit_boxing(a, b, b, a),
            AtmKind::Primitive if right == AtmKind::Declared => self.visit_boxing(a, b, a, b),
            AtmKind::Intersection if right == AtmKind::Intersection => {
                self.visit_intersection_intersection(a, b, history)
            }
            AtmKind::Null if right == AtmKind::Null => self.prime_annotations_equal(a, b),
            AtmKind::Primitive if right == AtmKind::Primitive => {
                self.prime_annotations_equal(a, b)
            }
            AtmKind::TypeVariable if right == AtmKind::TypeVariable => {
                self.visit_typevar_typevar(a, b, history)
            }
            AtmKind::Wildcard if right == AtmKind::Wildcard => {
                self.visit_wildcard_wildcard(a, b, history)
            }
            AtmKind::Wildcard if right == AtmKind::TypeVariable => {
                self.visit_wildcard_typevar(a, b, history)
            }
            AtmKind::Array
            | AtmKind::Declared
            | AtmKind::Executable
            | AtmKind::Intersection
            | AtmKind::NoType
            | AtmKind::Null
            | AtmKind::Primitive
            | AtmKind::TypeVariable
            | AtmKind::Union
            | AtmKind::Wildcard => self.default_action(a, b, history),
        }
    }

    /// Kind pairs without a rule.
    fn default_action(&mut self, a: AtmId, b: AtmId, history: &VisitHistory) -> TypeResult<bool> {
        if self.factory.config().ignore_uninferred_type_arguments
            && (self.is_uninferred_wildcard(a) || self.is_uninferred_wildcard(b))
        {
            return Ok(true);
        }
        if self.factory.config().raw_type_fallback {
            trace!(
                left = %self.factory.format(a),
                right = %self.factory.format(b),
                "equality falling back to effective annotations"
            );
            return self.factory.effective_annotations_match(a, b, self.current_top);
        }
        if self.mismatch_is_unequal {
            if self.is_uninferred_wildcard(a) || self.is_uninferred_wildcard(b) {
                return self.factory.effective_annotations_match(a, b, self.current_top);
            }
            return Ok(false);
        }
        Err(FrameworkError::MismatchedKinds {
            left: format!("{:?}( {} )", self.factory.kind(a), self.factory.format(a)),
            right: format!("{:?}( {} )", self.factory.kind(b), self.factory.format(b)),
            history: history.to_string(),
        })
    }

    fn is_uninferred_wildcard(&self, id: AtmId) -> bool {
        self.factory.kind(id) == AtmKind::Wildcard && self.factory.is_uninferred(id)
    }

    fn prime_annotations_equal(&self, a: AtmId, b: AtmId) -> TypeResult<bool> {
        Ok(match self.current_top {
            Some(top) => {
                self.factory.annotation_in_hierarchy(a, top)
                    == self.factory.annotation_in_hierarchy(b, top)
            }
            None => self.factory.annotations(a) == self.factory.annotations(b),
        })
    }

    fn are_all_equal(
        &mut self,
        left: &[AtmId],
        right: &[AtmId],
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        if left.len() != right.len() {
            return Err(FrameworkError::ArgumentCountMismatch {
                left: self.format_list(left),
                right: self.format_list(right),
            });
        }
        for (a, b) in left.iter().zip(right) {
            if !self.check_or_are_equal(*a, *b, history)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn check_or_are_equal(
        &mut self,
        a: AtmId,
        b: AtmId,
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        if history.contains(a, b, self.current_top) {
            return Ok(true);
        }
        let result = self.are_equal(a, b, history)?;
        history.add(a, b, self.current_top, result);
        Ok(result)
    }

    fn format_list(&self, ids: &[AtmId]) -> String {
        ids.iter()
            .map(|id| self.factory.format(*id))
            .collect::<Vec<_>>()
            .join(",")
    }

    // -------------------------------------------------------------------------
    // Pair rules
    // -------------------------------------------------------------------------

    fn visit_array_array(
        &mut self,
        a: AtmId,
        b: AtmId,
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        if !self.prime_annotations_equal(a, b)? {
            return Ok(false);
        }
        let left = self.factory.component_type(a)?;
        let right = self.factory.component_type(b)?;
        self.are_equal(left, right, history)
    }

    fn visit_declared_declared(
        &mut self,
        a: AtmId,
        b: AtmId,
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        if history.contains(a, b, self.current_top) {
            return Ok(true);
        }
        if !self.prime_annotations_equal(a, b)? {
            return Ok(false);
        }
        if self.factory.declared_class(a) != self.factory.declared_class(b) {
            return Ok(false);
        }
        history.add(a, b, self.current_top, true);

        // A raw side has nothing to compare.
        if self.factory.was_raw(a) || self.factory.was_raw(b) {
            return Ok(true);
        }
        let left = self.factory.type_arguments(a)?;
        let right = self.factory.type_arguments(b)?;
        if left.is_empty() || right.is_empty() {
            return Ok(true);
        }
        self.are_all_equal(&left, &right, history)
    }

    /// Primitives compare with their boxed counterparts by primaries alone.
    fn visit_boxing(
        &mut self,
        a: AtmId,
        b: AtmId,
        primitive: AtmId,
        declared: AtmId,
    ) -> TypeResult<bool> {
        let boxes = self
            .factory
            .declared_class(declared)
            .and_then(|class| unboxed_primitive(self.factory.env(), class))
            .is_some_and(|p| self.factory.underlying(primitive) == &tqual_host::Type::Primitive(p));
        if !boxes {
            trace!(
                primitive = %self.factory.format(primitive),
                declared = %self.factory.format(declared),
                "comparing a primitive with a type that does not box it"
            );
        }
        self.prime_annotations_equal(a, b)
    }

    fn visit_intersection_intersection(
        &mut self,
        a: AtmId,
        b: AtmId,
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        if !self.prime_annotations_equal(a, b)? {
            return Ok(false);
        }
        history.add(a, b, self.current_top, true);
        let left = self.factory.intersection_bounds(a)?;
        let right = self.factory.intersection_bounds(b)?;
        self.are_all_equal(&left, &right, history)
    }

    fn visit_typevar_typevar(
        &mut self,
        a: AtmId,
        b: AtmId,
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        if history.contains(a, b, self.current_top) {
            return Ok(true);
        }
        history.add(a, b, self.current_top, true);

        let (upper_a, upper_b) = (self.factory.upper_bound(a)?, self.factory.upper_bound(b)?);
        let (lower_a, lower_b) = (self.factory.lower_bound(a)?, self.factory.lower_bound(b)?);

        let captured = self.factory.is_captured(a) || self.factory.is_captured(b);
        let bounds_match = self.factory.underlying(upper_a) == self.factory.underlying(upper_b)
            && self.factory.underlying(lower_a) == self.factory.underlying(lower_b);
        if captured && !bounds_match {
            return Ok(self.subtype_and_compare(upper_a, upper_b, history)?
                && self.subtype_and_compare(lower_a, lower_b, history)?);
        }

        Ok(self.are_equal(upper_a, upper_b, history)?
            && self.are_equal(lower_a, lower_b, history)?)
    }

    /// Bring two bounds of captured variables to a common class before
    /// comparing them. Unrelated bounds compare by effective annotations.
    fn subtype_and_compare(
        &mut self,
        a: AtmId,
        b: AtmId,
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        let (kind_a, kind_b) = (self.factory.kind(a), self.factory.kind(b));
        if kind_a == AtmKind::Null && kind_b == AtmKind::Null {
            return self.are_equal(a, b, &mut VisitHistory::new());
        }
        let env = self.factory.env();
        let (left, right) = if kind_a == AtmKind::Null || kind_b == AtmKind::Null {
            (a, b)
        } else if is_subtype(env, self.factory.underlying(b), self.factory.underlying(a)) {
            (a, self.factory.as_super(b, a)?)
        } else if is_subtype(env, self.factory.underlying(a), self.factory.underlying(b)) {
            (self.factory.as_super(a, b)?, b)
        } else {
            return self.factory.effective_annotations_match(a, b, self.current_top);
        };
        self.are_equal(left, right, history)
    }

    fn visit_wildcard_wildcard(
        &mut self,
        a: AtmId,
        b: AtmId,
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        if history.contains(a, b, self.current_top) {
            return Ok(true);
        }
        history.add(a, b, self.current_top, true);
        if self.factory.config().ignore_uninferred_type_arguments
            && (self.factory.is_uninferred(a) || self.factory.is_uninferred(b))
        {
            return Ok(true);
        }
        let (extends_a, extends_b) = (self.factory.upper_bound(a)?, self.factory.upper_bound(b)?);
        if !self.are_equal(extends_a, extends_b, history)? {
            return Ok(false);
        }
        let (super_a, super_b) = (self.factory.lower_bound(a)?, self.factory.lower_bound(b)?);
        self.are_equal(super_a, super_b, history)
    }

    /// Wildcards stand in for captured variables, so a wildcard may meet a
    /// type variable.
    fn visit_wildcard_typevar(
        &mut self,
        wildcard: AtmId,
        var: AtmId,
        history: &mut VisitHistory,
    ) -> TypeResult<bool> {
        if history.contains(wildcard, var, self.current_top) {
            return Ok(true);
        }
        history.add(wildcard, var, self.current_top, true);
        if self.factory.config().ignore_uninferred_type_arguments
            && self.factory.is_uninferred(wildcard)
        {
            return Ok(true);
        }
        let (extends, upper) = (
            self.factory.upper_bound(wildcard)?,
            self.factory.upper_bound(var)?,
        );
        if !self.are_equal(extends, upper, history)? {
            return Ok(false);
        }
        let (super_, lower) = (
            self.factory.lower_bound(wildcard)?,
            self.factory.lower_bound(var)?,
        );
        self.are_equal(super_, lower, history)
    }
}

#[cfg(test)]
#[path = "../tests/equality_tests.rs"]
mod tests;
