use super::*;
use crate::config::FactoryConfig;
use crate::hierarchy::GraphQualifierHierarchy;
use tqual_host::{ClassDef, ClassKind, PrimitiveType, Type, TypeEnv, TypeStore, TypeVarId};

fn hierarchy() -> GraphQualifierHierarchy {
    GraphQualifierHierarchy::builder()
        .qualifier("Nullable", &[])
        .qualifier("NonNull", &["Nullable"])
        .qualifier("Tainted", &[])
        .qualifier("Untainted", &["Tainted"])
        .build()
        .expect("valid hierarchy")
}

fn factory(store: &TypeStore) -> AnnotatedTypeFactory<'_> {
    AnnotatedTypeFactory::new(store, hierarchy(), FactoryConfig::default()).expect("valid config")
}

fn with(names: &[&str], ty: Type) -> Type {
    Type::annotated(names.iter().copied(), ty)
}

fn class(id: tqual_host::ClassId) -> Type {
    Type::class(id, vec![])
}

fn node_store() -> (TypeStore, TypeVarId) {
    let mut store = TypeStore::with_minimal_jdk();
    let t = store.add_type_param("T", Vec::new());
    let node = store.add_class(ClassDef::new("demo.Node", ClassKind::Class).with_type_params(vec![t]));
    store.set_type_param_bounds(t, vec![Type::class(node, vec![Type::type_var(t)])], None);
    (store, t)
}

#[test]
fn declared_types_compare_primaries_and_arguments() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let list_of = |arg: Type| with(&["NonNull", "Untainted"], Type::class(wk.list, vec![arg]));

    let a = f.from_type(&list_of(with(&["Nullable", "Tainted"], class(wk.string))));
    let b = f.from_type(&list_of(with(&["Nullable", "Tainted"], class(wk.string))));
    let c = f.from_type(&list_of(with(&["NonNull", "Tainted"], class(wk.string))));

    assert!(f.are_equal(a, a).expect("comparable"));
    assert!(f.are_equal(a, b).expect("comparable"));
    assert!(!f.are_equal(a, c).expect("comparable"));
}

#[test]
fn comparison_in_one_sub_hierarchy_ignores_the_others() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let tainted = f.from_type(&with(&["NonNull", "Tainted"], class(wk.string)));
    let untainted = f.from_type(&with(&["NonNull", "Untainted"], class(wk.string)));
    let nullable = f.resolve_qualifier("Nullable").expect("Nullable");
    let taint_top = f.resolve_qualifier("Tainted").expect("Tainted");

    assert!(!f.are_equal(tainted, untainted).expect("comparable"));
    assert!(f.are_equal_in_hierarchy(tainted, untainted, nullable).expect("comparable"));
    assert!(!f.are_equal_in_hierarchy(tainted, untainted, taint_top).expect("comparable"));
}

#[test]
fn raw_type_equals_its_parameterization() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let raw = f.from_type(&with(&["NonNull"], class(wk.list)));
    let strings = f.from_type(&with(
        &["NonNull"],
        Type::class(wk.list, vec![with(&["NonNull"], class(wk.string))]),
    ));
    assert!(f.are_equal(raw, strings).expect("comparable"));
}

#[test]
fn raw_type_equals_its_parameterization_without_leniency() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let config = FactoryConfig {
        ignore_uninferred_type_arguments: false,
        ..FactoryConfig::default()
    };
    let mut f = AnnotatedTypeFactory::new(&store, hierarchy(), config).expect("valid config");
    let raw = f.from_type(&with(&["NonNull"], class(wk.list)));
    let strings = f.from_type(&with(
        &["NonNull"],
        Type::class(wk.list, vec![with(&["NonNull"], class(wk.string))]),
    ));
    // Forcing the raw side's arguments yields uninferred wildcards.
    assert_eq!(f.type_arguments(raw).expect("declared").len(), 1);
    assert!(f.are_equal(raw, strings).expect("comparable"));
    assert!(f.are_equal(strings, raw).expect("comparable"));
}

#[test]
fn different_classes_are_unequal() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let string = f.from_type(&with(&["NonNull"], class(wk.string)));
    let integer = f.from_type(&with(&["NonNull"], class(wk.integer)));
    assert!(!f.are_equal(string, integer).expect("comparable"));
}

#[test]
fn differing_argument_counts_are_fatal() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let string = || with(&["NonNull"], class(wk.string));
    let list = f.from_type(&with(&["NonNull"], Type::class(wk.list, vec![string()])));
    let unbalanced = f.from_type(&with(&["NonNull"], Type::class(wk.list, vec![string()])));
    let first = f.from_type(&string());
    let second = f.from_type(&string());
    f.set_type_arguments(unbalanced, vec![first, second]).expect("declared");

    let err = f.are_equal(list, unbalanced).expect_err("argument counts differ");
    assert!(matches!(err, FrameworkError::ArgumentCountMismatch { .. }), "{err}");
}

#[test]
fn mismatched_kinds_compare_unequal_in_argument_mode() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let config = FactoryConfig {
        ignore_uninferred_type_arguments: false,
        ..FactoryConfig::default()
    };
    let mut f = AnnotatedTypeFactory::new(&store, hierarchy(), config).expect("valid config");
    let string = f.from_type(&with(&["NonNull"], class(wk.string)));
    let array = f.from_type(&with(&["NonNull"], Type::array(class(wk.string))));
    let nullable = f.resolve_qualifier("Nullable").expect("Nullable");

    let mut history = VisitHistory::new();
    let equal = StructuralEqualityComparer::new(&mut f, Some(nullable))
        .mismatched_kinds_unequal()
        .are_equal(string, array, &mut history);
    assert!(!equal.expect("comparable"));
}

#[test]
fn arrays_compare_components() {
    let store = TypeStore::with_minimal_jdk();
    let mut f = factory(&store);
    let array = |component: &str| {
        with(&["NonNull"], Type::array(with(&[component], Type::Primitive(PrimitiveType::Int))))
    };
    let a = f.from_type(&array("NonNull"));
    let b = f.from_type(&array("NonNull"));
    let c = f.from_type(&array("Nullable"));

    assert!(f.are_equal(a, b).expect("comparable"));
    assert!(!f.are_equal(a, c).expect("comparable"));
}

#[test]
fn boxed_and_primitive_compare_by_primaries() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let int = f.from_type(&with(&["NonNull"], Type::Primitive(PrimitiveType::Int)));
    let integer = f.from_type(&with(&["NonNull"], class(wk.integer)));
    let nullable_integer = f.from_type(&with(&["Nullable"], class(wk.integer)));

    assert!(f.are_equal(int, integer).expect("comparable"));
    assert!(f.are_equal(integer, int).expect("comparable"));
    assert!(!f.are_equal(int, nullable_integer).expect("comparable"));
}

#[test]
fn wildcards_compare_bounds() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let both = |q: &str| with(&[q, "Tainted"], class(wk.number));
    let a = f.from_type(&Type::extends(both("Nullable")));
    let b = f.from_type(&Type::extends(both("Nullable")));
    let c = f.from_type(&Type::extends(both("NonNull")));

    assert!(f.are_equal(a, b).expect("comparable"));
    assert!(!f.are_equal(a, c).expect("comparable"));
}

#[test]
fn uninferred_wildcards_equal_anything_when_ignored() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let list_e = store.class(wk.list).expect("List").type_params[0];
    let mut f = factory(&store);
    let uninferred = f.uninferred_wildcard(list_e);
    let string = f.from_type(&with(&["NonNull", "Tainted"], class(wk.string)));
    assert!(f.are_equal(uninferred, string).expect("comparable"));

    let strict = FactoryConfig {
        ignore_uninferred_type_arguments: false,
        ..FactoryConfig::default()
    };
    let mut f = AnnotatedTypeFactory::new(&store, hierarchy(), strict).expect("valid config");
    let uninferred = f.uninferred_wildcard(list_e);
    let string = f.from_type(&with(&["NonNull", "Tainted"], class(wk.string)));
    assert!(matches!(
        f.are_equal(uninferred, string),
        Err(FrameworkError::MismatchedKinds { .. })
    ));
}

#[test]
fn recursive_type_variables_are_reflexive() {
    let (store, t) = node_store();
    let mut f = factory(&store);
    let a = f.from_type(&Type::type_var(t));
    let b = f.from_type(&Type::type_var(t));

    assert!(f.are_equal(a, a).expect("comparable"));
    assert!(f.are_equal(a, b).expect("comparable"));
}

#[test]
fn shared_history_records_visited_pairs() {
    let (store, t) = node_store();
    let mut f = factory(&store);
    let a = f.from_type(&Type::type_var(t));
    let b = f.from_type(&Type::type_var(t));

    let mut history = VisitHistory::new();
    let mut comparer = StructuralEqualityComparer::new(&mut f, None);
    assert!(comparer.are_equal(a, b, &mut history).expect("comparable"));
    assert!(history.contains(a, b, None));
    assert!(history.len() >= 2);
}
