use crate::atm::{AtmId, AtmKind};
use crate::error::TypeResult;
use crate::subtype::SubtypeChecker;
use tqual_host::{is_erased_subtype, unboxed_primitive};

impl<'f, 'env> SubtypeChecker<'f, 'env> {
    /// Anything is below a type variable when it is below the variable's
    /// lower bound.
    pub(crate) fn visit_typevar_supertype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let lower = self.factory.lower_bound(sup)?;
        self.check_and_subtype(sub, lower)
    }

    /// A type variable is below `sup` when its upper bound is.
    pub(crate) fn visit_typevar_subtype(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let mut upper = self.factory.upper_bound(sub)?;
        let sup_kind = self.factory.kind(sup);

        if sup_kind == AtmKind::Primitive {
            let unboxes = self
                .factory
                .declared_class(upper)
                .and_then(|class| unboxed_primitive(self.factory.env(), class))
                .is_some();
            if unboxes {
                upper = self.factory.as_super(upper, sup)?;
            }
        }

        if sup_kind == AtmKind::Declared && self.is_interface(sup) {
            while self.factory.kind(upper).is_bounded() {
                upper = self.factory.upper_bound(upper)?;
            }
            if self.factory.kind(upper) == AtmKind::Intersection {
                for bound in self.factory.intersection_bounds(upper)? {
                    let env = self.factory.env();
                    let related = is_erased_subtype(
                        env,
                        self.factory.underlying(bound),
                        self.factory.underlying(sup),
                    );
                    if related && self.check_and_subtype(bound, sup)? {
                        return Ok(true);
                    }
                }
                return Ok(false);
            }
        }

        self.check_and_subtype(upper, sup)
    }

    /// Two uses of the same variable compare by their primaries; otherwise
    /// the subtype's bounds decide.
    pub(crate) fn visit_typevar_typevar(&mut self, sub: AtmId, sup: AtmId) -> TypeResult<bool> {
        let sub_var = self.factory.node(sub).type_var();
        if sub_var.is_some() && sub_var == self.factory.node(sup).type_var() {
            let top = self.current_top;
            let sub_annotated = self.factory.has_annotation_in_hierarchy(sub, top);
            let sup_annotated = self.factory.has_annotation_in_hierarchy(sup, top);
            if sub_annotated && sup_annotated {
                return self.is_primary_subtype_with(sub, sup, true);
            }
            if !sub_annotated && !sup_annotated && self.are_equal_in_hierarchy(sub, sup)? {
                return Ok(true);
            }
            let upper = self.factory.upper_bound(sub)?;
            if self.factory.kind(upper) == AtmKind::Intersection {
                let lower = self.factory.lower_bound(sup)?;
                return self.visit(upper, lower);
            }
        }
        self.visit_typevar_subtype(sub, sup)
    }

    fn is_interface(&self, id: AtmId) -> bool {
        self.factory
            .declared_class(id)
            .and_then(|class| self.factory.env().class(class))
            .is_some_and(|def| def.is_interface())
    }
}
