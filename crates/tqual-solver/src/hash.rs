//! Structural hashing of annotated types.
//!
//! The hash agrees with [`AnnotatedTypeFactory::are_equal`]: types the
//! comparer considers equal hash alike. That rules out hashing declared type
//! arguments (raw types compare equal to their parameterizations) and forces
//! declared types and primitives into one bucket (boxing compares them by
//! primaries), as well as type variables and wildcards.
//!
//! Uninferred wildcards are the exception. With
//! `ignore_uninferred_type_arguments` they equal every type variable and
//! wildcard, which no hash can honour.
//!
//! Bounds are hashed once per node, so cyclic bounds terminate.

use crate::atm::{AtmData, AtmId, AtmKind, Lazy};
use crate::error::TypeResult;
use crate::factory::AnnotatedTypeFactory;
use crate::visitor::AtmVisitor;
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};

impl<'env> AnnotatedTypeFactory<'env> {
    /// Hash of `id` consistent with [`are_equal`](Self::are_equal).
    ///
    /// Bounds, components and conjuncts reachable from `id` are computed
    /// first, so the result does not depend on what was initialized before.
    pub fn hash_atm(&mut self, id: AtmId) -> TypeResult<u64> {
        self.initialize_hashed_structure(id)?;
        let mut visitor = HashingVisitor::default();
        visitor.visit(self, id);
        Ok(visitor.hasher.finish())
    }

    fn initialize_hashed_structure(&mut self, id: AtmId) -> TypeResult<()> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            match self.kind(current) {
                AtmKind::Array => stack.push(self.component_type(current)?),
                AtmKind::TypeVariable | AtmKind::Wildcard => {
                    stack.push(self.upper_bound(current)?);
                    stack.push(self.lower_bound(current)?);
                }
                AtmKind::Intersection => stack.extend(self.intersection_bounds(current)?),
                _ => {}
            }
        }
        Ok(())
    }
}

/// Kind tags; kinds the comparer can equate share a tag.
const TAG_DECLARED_OR_PRIMITIVE: u8 = 1;
const TAG_ARRAY: u8 = 2;
const TAG_BOUNDED: u8 = 3;
const TAG_NULL: u8 = 4;
const TAG_NO_TYPE: u8 = 5;
const TAG_INTERSECTION: u8 = 6;
const TAG_UNION: u8 = 7;
const TAG_EXECUTABLE: u8 = 8;

#[derive(Default)]
struct HashingVisitor {
    hasher: FxHasher,
    visited: FxHashSet<AtmId>,
}

impl HashingVisitor {
    fn primaries(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId, tag: u8) {
        tag.hash(&mut self.hasher);
        factory.annotations(id).hash(&mut self.hasher);
    }

    fn bounds(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId, bounds: [&Lazy<AtmId>; 2]) {
        if !self.visited.insert(id) {
            return;
        }
        for bound in bounds {
            if let Some(bound) = bound.get() {
                self.visit(factory, *bound);
            }
        }
    }
}

impl AtmVisitor for HashingVisitor {
    type Output = ();

    fn visit_declared(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        self.primaries(factory, id, TAG_DECLARED_OR_PRIMITIVE);
    }

    fn visit_executable(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        self.primaries(factory, id, TAG_EXECUTABLE);
    }

    fn visit_array(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        self.primaries(factory, id, TAG_ARRAY);
        if let AtmData::Array {
            component: Lazy::Computed(component),
        } = &factory.node(id).data
        {
            self.visit(factory, *component);
        }
    }

    // Primaries are left out: the comparer relates variables and wildcards
    // through their bounds only.
    fn visit_type_variable(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        TAG_BOUNDED.hash(&mut self.hasher);
        if let AtmData::TypeVariable { upper, lower, .. } = &factory.node(id).data {
            self.bounds(factory, id, [upper, lower]);
        }
    }

    fn visit_wildcard(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        TAG_BOUNDED.hash(&mut self.hasher);
        if let AtmData::Wildcard { extends, super_, .. } = &factory.node(id).data {
            self.bounds(factory, id, [extends, super_]);
        }
    }

    fn visit_primitive(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        self.primaries(factory, id, TAG_DECLARED_OR_PRIMITIVE);
    }

    fn visit_null(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        self.primaries(factory, id, TAG_NULL);
    }

    fn visit_no_type(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        self.primaries(factory, id, TAG_NO_TYPE);
    }

    fn visit_intersection(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        self.primaries(factory, id, TAG_INTERSECTION);
        if let AtmData::Intersection {
            bounds: Lazy::Computed(bounds),
        } = &factory.node(id).data
        {
            for bound in bounds {
                self.visit(factory, *bound);
            }
        }
    }

    fn visit_union(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) {
        self.primaries(factory, id, TAG_UNION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FactoryConfig;
    use crate::hierarchy::GraphQualifierHierarchy;
    use tqual_host::{PrimitiveType, Type, TypeEnv, TypeStore};

    fn nullness() -> GraphQualifierHierarchy {
        GraphQualifierHierarchy::builder()
            .qualifier("Nullable", &[])
            .qualifier("NonNull", &["Nullable"])
            .build()
            .expect("valid hierarchy")
    }

    #[test]
    fn equal_types_hash_alike() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let mut f = AnnotatedTypeFactory::new(&store, nullness(), FactoryConfig::default())
            .expect("valid config");
        let list_of = |arg: Type| Type::class(wk.list, vec![arg]);
        let a = f.from_type(&Type::annotated(
            ["NonNull"],
            list_of(Type::annotated(["Nullable"], Type::class(wk.string, vec![]))),
        ));
        let b = f.from_type(&Type::annotated(
            ["NonNull"],
            list_of(Type::annotated(["Nullable"], Type::class(wk.string, vec![]))),
        ));
        assert!(f.are_equal(a, b).expect("comparable"));
        assert_eq!(f.hash_atm(a).expect("hash"), f.hash_atm(b).expect("hash"));
    }

    #[test]
    fn boxed_and_primitive_share_a_bucket() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let mut f = AnnotatedTypeFactory::new(&store, nullness(), FactoryConfig::default())
            .expect("valid config");
        let boxed = f.from_type(&Type::annotated(["NonNull"], Type::class(wk.integer, vec![])));
        let int = f.from_type(&Type::annotated(["NonNull"], Type::Primitive(PrimitiveType::Int)));
        assert_eq!(f.hash_atm(boxed).expect("hash"), f.hash_atm(int).expect("hash"));
    }

    #[test]
    fn primaries_change_the_hash() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known().clone();
        let mut f = AnnotatedTypeFactory::new(&store, nullness(), FactoryConfig::default())
            .expect("valid config");
        let nullable = f.from_type(&Type::annotated(["Nullable"], Type::class(wk.string, vec![])));
        let non_null = f.from_type(&Type::annotated(["NonNull"], Type::class(wk.string, vec![])));
        assert_ne!(f.hash_atm(nullable).expect("hash"), f.hash_atm(non_null).expect("hash"));
    }

    #[test]
    fn recursive_bounds_terminate() {
        let mut store = TypeStore::with_minimal_jdk();
        let node_t = store.add_type_param("T", Vec::new());
        let node = store.add_class(
            tqual_host::ClassDef::new("demo.Node", tqual_host::ClassKind::Class)
                .with_type_params(vec![node_t]),
        );
        store.set_type_param_bounds(
            node_t,
            vec![Type::class(node, vec![Type::type_var(node_t)])],
            None,
        );
        let mut f = AnnotatedTypeFactory::new(&store, nullness(), FactoryConfig::default())
            .expect("valid config");
        let var = f.from_type(&Type::type_var(node_t));
        let first = f.hash_atm(var).expect("hash");
        assert_eq!(first, f.hash_atm(var).expect("hash"));
    }
}
