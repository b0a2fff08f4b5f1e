use super::*;
use crate::config::FactoryConfig;
use crate::hierarchy::GraphQualifierHierarchy;
use tqual_host::{
    ClassDef, ClassKind, DeclAnnotation, PrimitiveType, Type, TypeEnv, TypeStore, TypeVarId,
    WellKnownTypes, WildcardBound,
};

fn nullness() -> GraphQualifierHierarchy {
    GraphQualifierHierarchy::builder()
        .qualifier("Nullable", &[])
        .qualifier("NonNull", &["Nullable"])
        .build()
        .expect("valid hierarchy")
}

fn nullness_and_taint() -> GraphQualifierHierarchy {
    GraphQualifierHierarchy::builder()
        .qualifier("Nullable", &[])
        .qualifier("NonNull", &["Nullable"])
        .qualifier("Tainted", &[])
        .qualifier("Untainted", &["Tainted"])
        .build()
        .expect("valid hierarchy")
}

fn factory(store: &TypeStore) -> AnnotatedTypeFactory<'_> {
    AnnotatedTypeFactory::new(store, nullness(), FactoryConfig::default()).expect("valid config")
}

fn nn(ty: Type) -> Type {
    Type::annotated(["NonNull"], ty)
}

fn nble(ty: Type) -> Type {
    Type::annotated(["Nullable"], ty)
}

fn class(id: tqual_host::ClassId) -> Type {
    Type::class(id, vec![])
}

fn list_of(wk: &WellKnownTypes, arg: Type) -> Type {
    nn(Type::class(wk.list, vec![arg]))
}

/// `class Node<T extends Node<T>>`
fn node_store() -> (TypeStore, TypeVarId) {
    let mut store = TypeStore::with_minimal_jdk();
    let t = store.add_type_param("T", Vec::new());
    let node = store.add_class(ClassDef::new("demo.Node", ClassKind::Class).with_type_params(vec![t]));
    store.set_type_param_bounds(t, vec![Type::class(node, vec![Type::type_var(t)])], None);
    (store, t)
}

#[test]
fn declared_types_follow_qualifiers_and_host_subtyping() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);

    let nn_string = f.from_type(&nn(class(wk.string)));
    let nble_string = f.from_type(&nble(class(wk.string)));
    let nn_object = f.from_type(&nn(class(wk.object)));
    let nble_object = f.from_type(&nble(class(wk.object)));
    let nn_integer = f.from_type(&nn(class(wk.integer)));

    assert!(f.is_subtype(nn_string, nble_object).expect("comparable"));
    assert!(f.is_subtype(nn_string, nn_object).expect("comparable"));
    assert!(!f.is_subtype(nble_string, nn_object).expect("comparable"));
    assert!(!f.is_subtype(nble_object, nn_string).expect("comparable"));
    assert!(!f.is_subtype(nn_string, nn_integer).expect("comparable"));
}

#[test]
fn subtyping_is_reflexive() {
    let (store, t) = node_store();
    let wk = store.well_known().clone();
    let mut f = factory(&store);

    let types = [
        f.from_type(&nn(class(wk.string))),
        f.from_type(&list_of(&wk, nble(class(wk.string)))),
        f.from_type(&nn(Type::array(nble(class(wk.integer))))),
        f.from_type(&nn(Type::Primitive(PrimitiveType::Int))),
        f.from_type(&Type::type_var(t)),
        f.from_type(&nn(Type::type_var(t))),
        f.from_type(&list_of(&wk, Type::extends(nble(class(wk.number))))),
    ];
    for ty in types {
        assert!(f.is_subtype(ty, ty).expect("comparable"), "{}", f.format(ty));
    }
}

#[test]
fn mutual_subtypes_are_equal() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let a = f.from_type(&list_of(&wk, nn(class(wk.string))));
    let b = f.from_type(&list_of(&wk, nn(class(wk.string))));

    assert!(f.is_subtype(a, b).expect("comparable"));
    assert!(f.is_subtype(b, a).expect("comparable"));
    assert!(f.are_equal(a, b).expect("comparable"));
}

#[test]
fn type_arguments_are_invariant() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let non_null = f.from_type(&list_of(&wk, nn(class(wk.string))));
    let nullable = f.from_type(&list_of(&wk, nble(class(wk.string))));

    assert!(!f.is_subtype(non_null, nullable).expect("comparable"));
    assert!(!f.is_subtype(nullable, non_null).expect("comparable"));
}

#[test]
fn unbalanced_argument_counts_are_fatal() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let strings = f.from_type(&list_of(&wk, nn(class(wk.string))));
    let unbalanced = f.from_type(&list_of(&wk, nn(class(wk.string))));
    let first = f.from_type(&nn(class(wk.string)));
    let second = f.from_type(&nn(class(wk.string)));
    f.set_type_arguments(unbalanced, vec![first, second]).expect("declared");

    let err = f.is_subtype(strings, unbalanced).expect_err("argument counts differ");
    assert!(matches!(err, FrameworkError::ArgumentCountMismatch { .. }), "{err}");
}

#[test]
fn covariant_declaration_relaxes_argument_check() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let t = store.add_type_param("T", Vec::new());
    let boxed = store.add_class(
        ClassDef::new("demo.Box", ClassKind::Class)
            .with_type_params(vec![t])
            .annotated(DeclAnnotation::new("Covariant", vec![0])),
    );
    let mut f = factory(&store);
    let non_null = f.from_type(&nn(Type::class(boxed, vec![nn(class(wk.string))])));
    let nullable = f.from_type(&nn(Type::class(boxed, vec![nble(class(wk.string))])));

    assert!(f.is_subtype(non_null, nullable).expect("comparable"));
    assert!(!f.is_subtype(nullable, non_null).expect("comparable"));
}

#[test]
fn extends_wildcard_contains_narrower_argument() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);

    let strings = f.from_type(&list_of(&wk, nn(class(wk.string))));
    let nullable_strings = f.from_type(&list_of(&wk, nble(class(wk.string))));
    let wide = f.from_type(&list_of(&wk, Type::extends(nble(class(wk.object)))));
    let narrow = f.from_type(&list_of(&wk, Type::extends(nn(class(wk.object)))));

    assert!(f.is_subtype(strings, wide).expect("comparable"));
    assert!(f.is_subtype(nullable_strings, wide).expect("comparable"));
    assert!(f.is_subtype(strings, narrow).expect("comparable"));
    assert!(!f.is_subtype(nullable_strings, narrow).expect("comparable"));
}

#[test]
fn argument_of_another_kind_is_not_contained() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let t = store.add_type_param("T", Vec::new());
    let mut f = factory(&store);

    let strings = f.from_type(&list_of(&wk, nn(class(wk.string))));
    let extends_strings = f.from_type(&list_of(&wk, Type::extends(nn(class(wk.string)))));
    let vars = f.from_type(&list_of(&wk, nn(Type::type_var(t))));

    assert!(!f.is_subtype(extends_strings, strings).expect("comparable"));
    assert!(!f.is_subtype(vars, strings).expect("comparable"));
    assert!(f.is_subtype(strings, extends_strings).expect("comparable"));
}

#[test]
fn extends_wildcard_rejects_unrelated_argument() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);

    let integers = f.from_type(&list_of(&wk, nn(class(wk.integer))));
    let strings = f.from_type(&list_of(&wk, Type::extends(nble(class(wk.string)))));
    let numbers = f.from_type(&list_of(&wk, Type::extends(nble(class(wk.number)))));

    assert!(!f.is_subtype(integers, strings).expect("comparable"));
    assert!(f.is_subtype(integers, numbers).expect("comparable"));
}

#[test]
fn super_wildcard_checks_the_lower_bound() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);

    let objects = f.from_type(&list_of(&wk, nble(class(wk.object))));
    let consumer = f.from_type(&list_of(&wk, Type::super_of(nn(class(wk.string)))));
    let strict_consumer = f.from_type(&list_of(&wk, Type::super_of(nble(class(wk.string)))));
    let non_null_objects = f.from_type(&list_of(&wk, nn(class(wk.object))));

    assert!(f.is_subtype(objects, consumer).expect("comparable"));
    assert!(f.is_subtype(objects, strict_consumer).expect("comparable"));
    assert!(!f.is_subtype(non_null_objects, strict_consumer).expect("comparable"));
}

#[test]
fn captured_variable_in_argument_position_acts_like_a_wildcard() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let list_e = store.class(wk.list).expect("List").type_params[0];
    let cap = store.capture_wildcard(
        &WildcardBound::Extends(Box::new(nble(class(wk.object)))),
        Some(list_e),
    );
    let mut f = factory(&store);

    let strings = f.from_type(&list_of(&wk, nn(class(wk.string))));
    let captured = f.from_type(&list_of(&wk, Type::type_var(cap)));
    let captured_arg = f.type_arguments(captured).expect("args")[0];
    assert!(f.is_captured(captured_arg));
    assert!(f.is_subtype(strings, captured).expect("comparable"));
}

#[test]
fn raw_types_are_lenient() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let raw = f.from_type(&nn(class(wk.list)));
    let raw_array_list = f.from_type(&nn(class(wk.array_list)));
    let strings = f.from_type(&list_of(&wk, nn(class(wk.string))));

    assert!(f.was_raw(raw));
    assert!(f.is_subtype(raw, strings).expect("comparable"));
    assert!(f.is_subtype(strings, raw).expect("comparable"));
    assert!(f.is_subtype(raw_array_list, strings).expect("comparable"));
}

#[test]
fn raw_types_fall_back_to_uninferred_arguments() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let config = FactoryConfig {
        ignore_raw_types: false,
        ..FactoryConfig::default()
    };
    let mut f = AnnotatedTypeFactory::new(&store, nullness(), config).expect("valid config");
    let raw = f.from_type(&nn(class(wk.list)));
    let strings = f.from_type(&list_of(&wk, nn(class(wk.string))));

    let args = f.type_arguments(raw).expect("args");
    assert_eq!(args.len(), 1);
    assert!(f.is_uninferred(args[0]));
    assert!(f.is_subtype(raw, strings).expect("comparable"));
}

#[test]
fn raw_types_compare_effective_qualifiers_without_leniency() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let config = FactoryConfig {
        ignore_raw_types: false,
        ignore_uninferred_type_arguments: false,
        ..FactoryConfig::default()
    };
    let mut f = AnnotatedTypeFactory::new(&store, nullness(), config).expect("valid config");
    let raw = f.from_type(&nn(class(wk.list)));
    let strings = f.from_type(&list_of(&wk, nn(class(wk.string))));
    let objects = f.from_type(&list_of(&wk, nble(class(wk.object))));

    // The uninferred argument's bound carries the top qualifier.
    assert!(f.is_subtype(raw, objects).expect("comparable"));
    assert!(!f.is_subtype(raw, strings).expect("comparable"));
}

#[test]
fn boxing_compares_primaries() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let int = f.from_type(&nn(Type::Primitive(PrimitiveType::Int)));
    let nullable_integer = f.from_type(&nble(class(wk.integer)));
    let nullable_number = f.from_type(&nble(class(wk.number)));

    assert!(f.is_subtype(int, nullable_integer).expect("comparable"));
    assert!(f.is_subtype(int, nullable_number).expect("comparable"));
    assert!(!f.is_subtype(nullable_integer, int).expect("comparable"));
}

#[test]
fn arrays_are_covariant_unless_configured_otherwise() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let sub_ty = nn(Type::array(nn(class(wk.string))));
    let sup_ty = nn(Type::array(nble(class(wk.string))));

    let mut f = factory(&store);
    let (sub, sup) = (f.from_type(&sub_ty), f.from_type(&sup_ty));
    assert!(f.is_subtype(sub, sup).expect("comparable"));

    let config = FactoryConfig {
        invariant_array_components: true,
        ..FactoryConfig::default()
    };
    let mut f = AnnotatedTypeFactory::new(&store, nullness(), config).expect("valid config");
    let (sub, sup) = (f.from_type(&sub_ty), f.from_type(&sup_ty));
    assert!(!f.is_subtype(sub, sup).expect("comparable"));
}

#[test]
fn null_type_compares_primaries() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let non_null_null = f.from_type(&nn(Type::Null));
    let nullable_null = f.from_type(&nble(Type::Null));
    let string = f.from_type(&nn(class(wk.string)));

    assert!(f.is_subtype(non_null_null, string).expect("comparable"));
    assert!(!f.is_subtype(nullable_null, string).expect("comparable"));
}

#[test]
fn type_variable_primary_reaches_upper_bound() {
    let (store, t) = node_store();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let non_null = f.resolve_qualifier("NonNull").expect("NonNull");
    let nullable = f.resolve_qualifier("Nullable").expect("Nullable");

    let var = f.from_type(&Type::type_var(t));
    f.add_annotation(var, non_null);
    let upper = f.upper_bound(var).expect("bounds");
    assert_eq!(f.annotation_in_hierarchy(upper, nullable), Some(non_null));

    let nn_object = f.from_type(&nn(class(wk.object)));
    assert!(f.is_subtype(var, nn_object).expect("comparable"));

    let bare = f.from_type(&Type::type_var(t));
    assert!(!f.is_subtype(bare, nn_object).expect("comparable"));
}

#[test]
fn uses_of_the_same_variable_compare_by_primaries() {
    let (store, t) = node_store();
    let mut f = factory(&store);
    let bare = f.from_type(&Type::type_var(t));
    let other_bare = f.from_type(&Type::type_var(t));
    let non_null = f.from_type(&nn(Type::type_var(t)));
    let nullable = f.from_type(&nble(Type::type_var(t)));

    assert!(f.is_subtype(bare, other_bare).expect("comparable"));
    assert!(f.is_subtype(non_null, nullable).expect("comparable"));
    assert!(!f.is_subtype(nullable, non_null).expect("comparable"));
}

#[test]
fn recursive_bounds_terminate() {
    let (store, t) = node_store();
    let mut f = factory(&store);
    let a = f.from_type(&Type::type_var(t));
    let b = f.from_type(&Type::type_var(t));

    assert!(f.are_equal(a, b).expect("comparable"));
    assert!(f.is_subtype(a, b).expect("comparable"));
    let upper = f.upper_bound(a).expect("bounds");
    assert!(f.is_subtype(a, upper).expect("comparable"));
    assert!(f.is_subtype(upper, upper).expect("comparable"));
}

#[test]
fn union_is_below_a_common_supertype() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let exception = f.from_type(&nble(class(wk.exception)));
    let non_null_exception = f.from_type(&nn(class(wk.exception)));

    let union = f.from_type(&nn(Type::Union(vec![
        nn(class(wk.io_exception)),
        nn(class(wk.runtime_exception)),
    ])));
    assert!(f.is_subtype(union, exception).expect("comparable"));

    let with_string = f.from_type(&nn(Type::Union(vec![
        nn(class(wk.io_exception)),
        nn(class(wk.string)),
    ])));
    assert!(!f.is_subtype(with_string, exception).expect("comparable"));

    let nullable_alternative = f.from_type(&nn(Type::Union(vec![
        nble(class(wk.io_exception)),
        nn(class(wk.runtime_exception)),
    ])));
    assert!(!f.is_subtype(nullable_alternative, non_null_exception).expect("comparable"));
}

#[test]
fn intersection_bound_is_below_its_interface_conjunct() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let t = store.add_type_param("T", Vec::new());
    store.set_type_param_bounds(
        t,
        vec![
            Type::class(wk.comparable, vec![Type::type_var(t)]),
            class(wk.serializable),
        ],
        None,
    );
    let mut f = factory(&store);
    let var = f.from_type(&Type::type_var(t));
    let serializable = f.from_type(&nble(class(wk.serializable)));
    let non_null_serializable = f.from_type(&nn(class(wk.serializable)));

    let upper = f.upper_bound(var).expect("bounds");
    assert_eq!(f.kind(upper), AtmKind::Intersection);
    assert!(f.is_subtype(var, serializable).expect("comparable"));
    assert!(!f.is_subtype(var, non_null_serializable).expect("comparable"));
}

#[test]
fn type_variable_below_interface_needs_a_related_bound() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let t = store.add_type_param(
        "T",
        vec![Type::class(wk.comparable, vec![nn(class(wk.integer))])],
    );
    let u = store.add_type_param("U", Vec::new());
    let mut f = factory(&store);

    let var = f.from_type(&nn(Type::type_var(t)));
    let comparable_strings = f.from_type(&nble(Type::class(wk.comparable, vec![nn(class(wk.string))])));
    let comparable_integers =
        f.from_type(&nble(Type::class(wk.comparable, vec![nn(class(wk.integer))])));
    assert!(!f.is_subtype(var, comparable_strings).expect("comparable"));
    assert!(f.is_subtype(var, comparable_integers).expect("comparable"));

    let unrelated = f.from_type(&nn(Type::type_var(u)));
    let serializable = f.from_type(&nble(class(wk.serializable)));
    assert!(!f.is_subtype(unrelated, serializable).expect("comparable"));
}

#[test]
fn every_sub_hierarchy_must_agree() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = AnnotatedTypeFactory::new(&store, nullness_and_taint(), FactoryConfig::default())
        .expect("valid config");
    let sub = f.from_type(&Type::annotated(["NonNull", "Tainted"], class(wk.string)));
    let sup = f.from_type(&Type::annotated(["Nullable", "Untainted"], class(wk.object)));
    let non_null = f.resolve_qualifier("NonNull").expect("NonNull");
    let tainted = f.resolve_qualifier("Tainted").expect("Tainted");

    assert!(!f.is_subtype(sub, sup).expect("comparable"));
    assert!(f.is_subtype_in_hierarchy(sub, sup, non_null).expect("comparable"));
    assert!(!f.is_subtype_in_hierarchy(sub, sup, tainted).expect("comparable"));
}

#[test]
fn missing_primary_is_fatal() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let bare = f.from_type(&class(wk.string));
    let object = f.from_type(&nble(class(wk.object)));

    let err = f.is_subtype(bare, object).expect_err("missing qualifier");
    assert!(matches!(err, FrameworkError::MissingAnnotation { .. }));
}

#[test]
fn incomparable_kinds_report_both_types() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let int = f.from_type(&nn(Type::Primitive(PrimitiveType::Int)));
    let strings = f.from_type(&nn(Type::array(nn(class(wk.string)))));

    match f.is_subtype(int, strings) {
        Err(FrameworkError::IncomparableTypes { sub, sup, .. }) => {
            assert_eq!(sub, "@NonNull int");
            assert!(sup.contains("String"), "{sup}");
        }
        other => panic!("expected incomparable types, got {other:?}"),
    }
}

#[test]
fn checker_reuses_history_across_queries() {
    let (store, t) = node_store();
    let mut f = factory(&store);
    let a = f.from_type(&Type::type_var(t));
    let upper = f.upper_bound(a).expect("bounds");

    let mut checker = SubtypeChecker::new(&mut f);
    assert!(checker.is_subtype(a, upper).expect("comparable"));
    assert!(!checker.visit_history.is_empty());
    assert!(checker.is_subtype(a, upper).expect("comparable"));
}

#[test]
fn recursive_query_runs_under_trace_logging() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let (store, t) = node_store();
        let mut f = factory(&store);
        let a = f.from_type(&nn(Type::type_var(t)));
        let b = f.from_type(&nble(Type::type_var(t)));
        assert!(f.is_subtype(a, b).expect("comparable"));
        assert!(!f.is_subtype(b, a).expect("comparable"));
    });
}
