use crate::atm::AtmId;
use crate::error::TypeResult;
use crate::subtype::SubtypeChecker;
use tqual_host::{is_erased_subtype, unboxed_primitive};

impl<'f, 'env> SubtypeChecker<'f, 'env> {
    fn erased_related(&self, sub: AtmId, sup: AtmId) -> bool {
        is_erased_subtype(
            self.factory.env(),
            self.factory.underlying(sub),
            self.factory.underlying(sup),
        )
    }

    /// Below an intersection means below every conjunct.
    pub(crate) fn visit_intersection_supertype(
        &mut self,
        sub: AtmId,
        sup: AtmId,
    ) -> TypeResult<bool> {
        let top = Some(self.current_top);
        if let Some(known) = self.visit_history.result(sub, sup, top) {
            return Ok(known);
        }
        self.visit_history.add(sub, sup, top, true);
        let bounds = self.factory.intersection_bounds(sup)?;
        let result = self.is_subtype_of_all(sub, &bounds)?;
        self.visit_history.add(sub, sup, top, result);
        Ok(result)
    }

    pub(crate) fn visit_intersection_declared(
        &mut self,
        sub: AtmId,
        sup: AtmId,
    ) -> TypeResult<bool> {
        for bound in self.factory.intersection_bounds(sub)? {
            if self.erased_related(bound, sup) && self.visit(bound, sup)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(crate) fn visit_intersection_primitive(
        &mut self,
        sub: AtmId,
        sup: AtmId,
    ) -> TypeResult<bool> {
        for bound in self.factory.intersection_bounds(sub)? {
            let unboxes = self
                .factory
                .declared_class(bound)
                .and_then(|class| unboxed_primitive(self.factory.env(), class))
                .is_some();
            if unboxes && self.visit(bound, sup)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Every erased-related pair of conjuncts must be related.
    pub(crate) fn visit_intersection_intersection(
        &mut self,
        sub: AtmId,
        sup: AtmId,
    ) -> TypeResult<bool> {
        let sub_bounds = self.factory.intersection_bounds(sub)?;
        let sup_bounds = self.factory.intersection_bounds(sup)?;
        for &sub_bound in &sub_bounds {
            for &sup_bound in &sup_bounds {
                if self.erased_related(sub_bound, sup_bound) && !self.visit(sub_bound, sup_bound)? {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    pub(crate) fn visit_intersection_null(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        for bound in self.factory.intersection_bounds(sub)? {
            if self.is_primary_subtype(bound, sup)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(crate) fn visit_intersection_typevar(
        &mut self,
        sub: AtmId,
        sup: AtmId,
    ) -> TypeResult<bool> {
        for bound in self.factory.intersection_bounds(sub)? {
            if self.erased_related(bound, sup) && self.visit(bound, sup)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A union is below `sup` when every alternative is.
    pub(crate) fn visit_union_subtype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let alternatives = self.factory.union_alternatives(sub)?;
        self.are_all_subtypes(&alternatives, sup)
    }

    pub(crate) fn visit_null_union(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        for alternative in self.factory.union_alternatives(sup)? {
            if self.visit(sub, alternative)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
