//! Wildcards. An uninferred wildcard stands for a failed inference; with
//! `ignore_uninferred_type_arguments` it is related to everything.

use crate::atm::{AtmId, AtmKind};
use crate::error::TypeResult;
use crate::subtype::SubtypeChecker;

impl<'f, 'env> SubtypeChecker<'f, 'env> {
    fn ignore_uninferred_flag(&self) -> bool {
        self.factory.config().ignore_uninferred_type_arguments
    }

    /// Below a wildcard means below its `super` bound.
    pub(crate) fn visit_wildcard_supertype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        if self.factory.is_uninferred(sup) {
            return Ok(self.ignore_uninferred_flag());
        }
        let lower = self.factory.lower_bound(sup)?;
        self.visit(sub, lower)
    }

    pub(crate) fn visit_wildcard_subtype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        if self.factory.is_uninferred(sub) {
            return Ok(self.ignore_uninferred_flag());
        }
        let sup_is_wildcard =
            self.factory.kind(sup) == AtmKind::Wildcard || self.factory.is_captured(sup);
        if sup_is_wildcard {
            let top = self.current_top;
            let sub_annotated = self.factory.has_annotation_in_hierarchy(sub, top);
            let sup_annotated = self.factory.has_annotation_in_hierarchy(sup, top);
            if sub_annotated && sup_annotated {
                return self.is_primary_subtype_with(sub, sup, true);
            }
            if !sub_annotated && !sup_annotated && self.are_equal_in_hierarchy(sub, sup)? {
                return Ok(true);
            }
        }
        let upper = self.factory.upper_bound(sub)?;
        self.visit(upper, sup)
    }

    pub(crate) fn visit_wildcard_declared(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        if self.factory.is_uninferred(sub) {
            if self.ignore_uninferred_flag() {
                return Ok(true);
            }
            if self.factory.type_arguments(sup)?.is_empty() {
                return self.uninferred_effective_subtype(sub, sup);
            }
        }
        self.visit_wildcard_subtype(sub, sup)
    }

    pub(crate) fn visit_wildcard_primitive(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        if self.factory.is_uninferred(sub) {
            return self.uninferred_effective_subtype(sub, sup);
        }
        self.visit_wildcard_subtype(sub, sup)
    }

    pub(crate) fn visit_primitive_wildcard(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        if self.factory.is_uninferred(sup) && self.ignore_uninferred_flag() {
            return Ok(true);
        }
        let lower = self.factory.lower_bound(sup)?;
        self.is_primary_subtype(sub, lower)
    }

    /// The effective qualifier of an uninferred wildcard against the primary
    /// of `sup`.
    fn uninferred_effective_subtype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let top = self.current_top;
        let sub_anno = self.factory.effective_annotation_in_hierarchy(sub, top)?;
        let sup_anno = self.factory.annotation_in_hierarchy(sup, top);
        self.is_anno_subtype((sub, sub_anno), (sup, sup_anno), false)
    }
}
