use crate::atm::{AtmId, AtmKind, CopyMode};
use crate::error::{FrameworkError, TypeResult};
use crate::subtype::SubtypeChecker;
use tqual_host::{Type, boxed_class, is_erased_subtype, unboxed_primitive};

impl<'f, 'env> SubtypeChecker<'f, 'env> {
    pub(crate) fn visit_array_array(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        if !self.is_primary_subtype(sub, sup)? {
            return Ok(false);
        }
        let sub_component = self.factory.component_type(sub)?;
        let sup_component = self.factory.component_type(sup)?;
        if self.factory.config().invariant_array_components {
            self.are_equal_in_hierarchy(sub_component, sup_component)
        } else {
            self.visit(sub_component, sup_component)
        }
    }

    /// Primaries of the as-super view first, then type arguments. The pair
    /// counts as related while its arguments are being checked, so
    /// F-bounded declarations terminate.
    pub(crate) fn visit_declared_declared(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let env = self.factory.env();
        if !is_erased_subtype(env, self.factory.underlying(sub), self.factory.underlying(sup)) {
            return Ok(false);
        }
        let as_super = self.factory.casted_as_super(sub, sup)?;
        if !self.is_primary_subtype(as_super, sup)? {
            return Ok(false);
        }

        let top = Some(self.current_top);
        if let Some(known) = self.visit_history.result(sub, sup, top) {
            return Ok(known);
        }
        self.visit_history.add(sub, sup, top, true);
        let sub_raw = self.factory.was_raw(sub);
        let sup_raw = self.factory.was_raw(sup);
        let result = self.visit_type_args(as_super, sup, sub_raw, sup_raw)?;
        self.visit_history.add(sub, sup, top, result);
        Ok(result)
    }

    fn visit_type_args(
        &mut self,
        sub: AtmId,
        sup: AtmId,
        sub_raw: bool,
        sup_raw: bool,
    ) -> TypeResult<bool> {
        if self.factory.config().ignore_raw_types && (sub_raw || sup_raw) {
            return Ok(true);
        }
        let sub_args = self.factory.type_arguments(sub)?;
        let sup_args = self.factory.type_arguments(sup)?;
        if sub_args.is_empty() || sup_args.is_empty() {
            return Ok(true);
        }
        if sub_args.len() != sup_args.len() {
            return Err(FrameworkError::ArgumentCountMismatch {
                left: self.factory.format(sub),
                right: self.factory.format(sup),
            });
        }
        let covariant = self.covariant_indices(sup);
        for (i, (inside, outside)) in sub_args.into_iter().zip(sup_args).enumerate() {
            if !self.is_contained_by(inside, outside, covariant.contains(&i))? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Argument positions the declaration of `sup` marks covariant.
    fn covariant_indices(&self, sup: AtmId) -> Vec<usize> {
        let name = &self.factory.config().covariant_annotation;
        self.factory
            .declared_class(sup)
            .and_then(|class| self.factory.env().class(class))
            .and_then(|def| def.declaration_annotation(name))
            .map(|anno| {
                anno.values
                    .iter()
                    .filter_map(|v| usize::try_from(*v).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Type-argument containment: is `inside` within the range `outside`
    /// denotes?
    pub(crate) fn is_contained_by(
        &mut self,
        inside: AtmId,
        outside: AtmId,
        can_be_covariant: bool,
    ) -> TypeResult<bool> {
        if self.ignores_uninferred(inside) || self.ignores_uninferred(outside) {
            return Ok(true);
        }
        match self.factory.kind(outside) {
            AtmKind::Wildcard => self.is_within_bounds(inside, outside, can_be_covariant, true),
            AtmKind::TypeVariable if self.factory.is_captured(outside) => {
                self.is_within_bounds(inside, outside, can_be_covariant, false)
            }
            _ if can_be_covariant => self.visit(inside, outside),
            _ => self.are_equal_in_hierarchy(inside, outside),
        }
    }

    fn is_within_bounds(
        &mut self,
        inside: AtmId,
        outside: AtmId,
        can_be_covariant: bool,
        outside_is_wildcard: bool,
    ) -> TypeResult<bool> {
        let top = Some(self.current_top);
        if self.typearg_history.contains(inside, outside, top) {
            return Ok(true);
        }
        self.typearg_history.add(inside, outside, top, true);

        let mut upper = self.factory.upper_bound(outside)?;
        if self.factory.kind(inside) == AtmKind::Wildcard {
            upper = self.widen_to_upper_bound(upper, inside)?;
        }
        while self.factory.kind(upper) == AtmKind::Wildcard {
            if self.ignores_uninferred(upper) {
                return Ok(true);
            }
            upper = self.factory.upper_bound(upper)?;
        }
        if !self.check_and_subtype(inside, upper)? {
            return Ok(false);
        }

        let lower = self.factory.lower_bound(outside)?;
        if outside_is_wildcard && self.factory.kind(lower) == AtmKind::TypeVariable {
            return Ok(true);
        }
        Ok(can_be_covariant || self.check_and_subtype(lower, inside)?)
    }

    /// When the wildcard's own bound is wider than the container's, compare
    /// against the wildcard's bound carrying the container's qualifiers.
    fn widen_to_upper_bound(&mut self, upper: AtmId, wildcard: AtmId) -> TypeResult<AtmId> {
        let wildcard_upper = self.factory.upper_bound(wildcard)?;
        let env = self.factory.env();
        let container = self.factory.underlying(upper);
        let own = self.factory.underlying(wildcard_upper);
        if is_erased_subtype(env, own, container) || !is_erased_subtype(env, container, own) {
            return Ok(upper);
        }
        let widened = self
            .factory
            .deep_copy(wildcard_upper, CopyMode::StructureAndAnnotations)?;
        let primaries = self.factory.annotations(upper).clone();
        self.factory.replace_annotations(widened, &primaries);
        Ok(widened)
    }

    /// A boxed class against a primitive compares the unboxed view.
    pub(crate) fn visit_declared_primitive(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let unboxes = self
            .factory
            .declared_class(sub)
            .and_then(|class| unboxed_primitive(self.factory.env(), class))
            .is_some();
        if !unboxes {
            return self.is_primary_subtype(sub, sup);
        }
        let as_super = self.factory.casted_as_super(sub, sup)?;
        self.is_primary_subtype(as_super, sup)
    }

    pub(crate) fn visit_primitive_declared(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let env = self.factory.env();
        let boxes_into_sup = match self.factory.underlying(sub).peel() {
            Type::Primitive(prim) => {
                let boxed = Type::class(boxed_class(env, *prim), Vec::new());
                is_erased_subtype(env, &boxed, self.factory.underlying(sup))
            }
            _ => false,
        };
        if !boxes_into_sup {
            return self.is_primary_subtype(sub, sup);
        }
        let as_super = self.factory.casted_as_super(sub, sup)?;
        self.is_primary_subtype(as_super, sup)
    }

    pub(crate) fn visit_declared_union(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        for alternative in self.factory.union_alternatives(sup)? {
            let env = self.factory.env();
            let related = is_erased_subtype(
                env,
                self.factory.underlying(sub),
                self.factory.underlying(alternative),
            );
            if related && self.visit(sub, alternative)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
