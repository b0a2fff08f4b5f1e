//! Raw-type fallback for the equality comparer.
//!
//! Type-argument inference sometimes produces arguments whose kinds cannot be
//! compared structurally (a declared type against a wildcard, say). With
//! [`FactoryConfig::raw_type_fallback`](crate::config::FactoryConfig) on, the
//! equality comparer decides such pairs here by comparing effective
//! annotations instead of failing. The fallback is off by default. The
//! subtype engine's argument check uses the same comparison for uninferred
//! wildcards whatever the switch says.

use crate::annotations::QualifierId;
use crate::atm::{AtmId, AtmKind};
use crate::error::TypeResult;
use crate::factory::AnnotatedTypeFactory;

impl<'env> AnnotatedTypeFactory<'env> {
    /// Do `a` and `b` have the same effective qualifiers, in the sub-hierarchy
    /// of `top` or in every sub-hierarchy?
    pub fn effective_annotations_match(
        &mut self,
        a: AtmId,
        b: AtmId,
        top: Option<QualifierId>,
    ) -> TypeResult<bool> {
        match top {
            Some(top) => Ok(self.effective_annotation_in_hierarchy(a, top)?
                == self.effective_annotation_in_hierarchy(b, top)?),
            None => Ok(self.effective_annotations(a)? == self.effective_annotations(b)?),
        }
    }

    /// A type variable created by capture of a wildcard.
    pub fn is_captured(&self, id: AtmId) -> bool {
        if self.kind(id) != AtmKind::TypeVariable {
            return false;
        }
        self.node(id)
            .type_var()
            .and_then(|var| self.env().type_param(var))
            .is_some_and(|def| def.captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FactoryConfig;
    use crate::hierarchy::GraphQualifierHierarchy;
    use tqual_host::{Type, TypeEnv, TypeStore, WildcardBound};

    fn nullness() -> GraphQualifierHierarchy {
        GraphQualifierHierarchy::builder()
            .qualifier("Nullable", &[])
            .qualifier("NonNull", &["Nullable"])
            .build()
            .expect("valid hierarchy")
    }

    #[test]
    fn fallback_decides_unmatched_kinds_by_effective_annotations() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let config = FactoryConfig {
            raw_type_fallback: true,
            ignore_uninferred_type_arguments: false,
            ..FactoryConfig::default()
        };
        let mut f = AnnotatedTypeFactory::new(&store, nullness(), config).expect("valid config");
        let string = f.from_type(&Type::annotated(["Nullable"], Type::class(wk.string, vec![])));
        let wildcard = f.from_type(&Type::Wildcard(WildcardBound::Unbounded));

        // The unbounded wildcard's extends bound defaults to the top.
        assert!(f.are_equal(string, wildcard).expect("fallback"));

        let non_null = f.from_type(&Type::annotated(["NonNull"], Type::class(wk.string, vec![])));
        assert!(!f.are_equal(non_null, wildcard).expect("fallback"));
    }

    #[test]
    fn unmatched_kinds_fail_without_fallback() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let config = FactoryConfig {
            ignore_uninferred_type_arguments: false,
            ..FactoryConfig::default()
        };
        let mut f = AnnotatedTypeFactory::new(&store, nullness(), config).expect("valid config");
        let string = f.from_type(&Type::annotated(["Nullable"], Type::class(wk.string, vec![])));
        let array = f.from_type(&Type::array(Type::class(wk.string, vec![])));
        let err = f.are_equal(string, array);
        assert!(matches!(
            err,
            Err(crate::error::FrameworkError::MismatchedKinds { .. })
        ));
    }
}
