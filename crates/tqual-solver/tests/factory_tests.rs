use super::*;
use crate::hierarchy::GraphQualifierHierarchy;
use tqual_host::{ClassDef, ClassKind, MethodType, PrimitiveType, TypeStore};

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

fn q(f: &AnnotatedTypeFactory<'_>, name: &str) -> QualifierId {
    f.resolve_qualifier(name).expect("supported qualifier")
}

#[test]
fn adding_replaces_only_the_same_sub_hierarchy() {
    let store = TypeStore::with_minimal_jdk();
    let string = store.well_known().string;
    let mut f = factory(&store);
    let id = f.from_type(&Type::annotated(["Nullable", "Tainted"], Type::class(string, vec![])));

    let non_null = q(&f, "NonNull");
    f.add_annotation(id, non_null);
    assert!(f.has_annotation(id, non_null));
    assert!(!f.has_annotation(id, q(&f, "Nullable")));
    assert!(f.has_annotation(id, q(&f, "Tainted")));
    assert_eq!(f.annotations(id).len(), 2);
}

#[test]
fn aliases_resolve_and_unknown_names_are_dropped() {
    let store = TypeStore::with_minimal_jdk();
    let string = store.well_known().string;
    let config = FactoryConfig::default().with_alias("javax.annotation.CheckForNull", "Nullable");
    let mut f = AnnotatedTypeFactory::new(&store, hierarchy(), config).expect("valid config");

    let written = f.from_type(&Type::annotated(
        ["javax.annotation.CheckForNull", "Frobnicated"],
        Type::class(string, vec![]),
    ));
    assert_eq!(f.annotations(written).len(), 1);
    assert!(f.has_annotation(written, q(&f, "Nullable")));

    assert!(f.add_annotation_named(written, "Untainted"));
    assert!(!f.add_annotation_named(written, "Frobnicated"));
    assert!(f.is_supported_qualifier("javax.annotation.CheckForNull"));
    assert!(!f.is_supported_qualifier("Frobnicated"));
}

#[test]
fn missing_annotations_never_overwrite() {
    let store = TypeStore::with_minimal_jdk();
    let string = store.well_known().string;
    let mut f = factory(&store);
    let id = f.from_type(&Type::annotated(["NonNull"], Type::class(string, vec![])));

    let defaults = [q(&f, "Nullable"), q(&f, "Tainted")];
    f.add_missing_annotations(id, defaults);
    assert!(f.has_annotation(id, q(&f, "NonNull")));
    assert!(f.has_annotation(id, q(&f, "Tainted")));
    assert!(!f.has_annotation(id, q(&f, "Nullable")));
}

#[test]
fn removing_by_hierarchy() {
    let store = TypeStore::with_minimal_jdk();
    let string = store.well_known().string;
    let mut f = factory(&store);
    let id = f.from_type(&Type::annotated(["NonNull", "Tainted"], Type::class(string, vec![])));

    let nullable = q(&f, "Nullable");
    assert!(f.remove_annotation_in_hierarchy(id, nullable));
    assert!(!f.remove_annotation_in_hierarchy(id, nullable));
    assert!(!f.has_annotation_in_hierarchy(id, nullable));
    assert!(f.has_annotation_in_hierarchy(id, q(&f, "Tainted")));
}

#[test]
fn annotating_a_type_variable_updates_computed_bounds() {
    let mut store = TypeStore::with_minimal_jdk();
    let t = store.add_type_param("T", Vec::new());
    let mut f = factory(&store);
    let var = f.from_type(&Type::type_var(t));
    let upper = f.upper_bound(var).expect("bounds");
    let lower = f.lower_bound(var).expect("bounds");

    let non_null = q(&f, "NonNull");
    f.add_annotation(var, non_null);
    assert!(f.has_annotation(upper, non_null));
    assert!(f.has_annotation(lower, non_null));
    assert!(f.has_annotation(upper, q(&f, "Tainted")));
}

#[test]
fn raw_references_get_uninferred_arguments() {
    let store = TypeStore::with_minimal_jdk();
    let list = store.well_known().list;
    let mut f = factory(&store);
    let raw = f.from_type(&Type::class(list, vec![]));
    assert!(f.was_raw(raw));

    let args = f.type_arguments(raw).expect("args");
    assert_eq!(args.len(), 1);
    assert_eq!(f.kind(args[0]), AtmKind::Wildcard);
    assert!(f.is_uninferred(args[0]));
    assert_eq!(f.type_arguments(raw).expect("args"), args);
}

#[test]
fn class_declarations_use_their_type_variables() {
    let store = TypeStore::with_minimal_jdk();
    let map = store.well_known().map;
    let mut f = factory(&store);
    let first = f.from_class_declaration(map).expect("declaration");
    let second = f.from_class_declaration(map).expect("declaration");
    assert_ne!(first, second);
    assert!(f.is_declaration(first));
    assert!(!f.was_raw(first));

    let args = f.type_arguments(first).expect("args");
    assert_eq!(args.len(), 2);
    for arg in args {
        assert_eq!(f.kind(arg), AtmKind::TypeVariable);
        assert!(f.is_declaration(arg));
    }
}

#[test]
fn type_parameter_declarations_are_fresh_copies() {
    let mut store = TypeStore::with_minimal_jdk();
    let t = store.add_type_param("T", Vec::new());
    let mut f = factory(&store);
    let first = f.from_type_param(t).expect("declaration");
    let second = f.from_type_param(t).expect("declaration");
    assert_ne!(first, second);
    assert!(f.is_declaration(first));
    assert!(matches!(
        f.from_type_param(TypeVarId(9_999)),
        Err(FrameworkError::UnknownTypeParam(_))
    ));
}

#[test]
fn nested_types_know_their_enclosing_type() {
    let mut store = TypeStore::with_minimal_jdk();
    let outer = store.add_class(ClassDef::new("demo.Outer", ClassKind::Class));
    let inner = store.add_class(ClassDef::new("demo.Outer.Inner", ClassKind::Class).enclosed_by(outer));
    let string = store.well_known().string;
    let mut f = factory(&store);

    let nested = f.from_type(&Type::nested(Type::class(outer, vec![]), inner, vec![]));
    let enclosing = f.enclosing_type(nested).expect("enclosing").expect("nested type");
    assert_eq!(f.underlying(enclosing), &Type::class(outer, vec![]));

    let top_level = f.from_type(&Type::class(string, vec![]));
    assert_eq!(f.enclosing_type(top_level).expect("enclosing"), None);
}

#[test]
fn executable_children_are_computed_together() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let u = store.add_type_param("U", Vec::new());
    let method = MethodType {
        name: "convert".to_owned(),
        type_params: vec![u],
        params: vec![Type::Primitive(PrimitiveType::Int), Type::type_var(u)],
        return_type: Type::annotated(["NonNull"], Type::class(wk.string, vec![])),
        receiver: Some(Type::class(wk.list, vec![Type::class(wk.string, vec![])])),
        thrown: vec![Type::class(wk.io_exception, vec![])],
    };
    let mut f = factory(&store);
    let id = f.from_type(&Type::Executable(Box::new(method)));

    let params = f.parameter_types(id).expect("params");
    assert_eq!(params.len(), 2);
    assert_eq!(f.kind(params[0]), AtmKind::Primitive);
    let ret = f.return_type(id).expect("return");
    assert!(f.has_annotation(ret, q(&f, "NonNull")));
    assert!(f.receiver_type(id).expect("receiver").is_some());
    assert_eq!(f.thrown_types(id).expect("thrown").len(), 1);
    let vars = f.executable_type_variables(id).expect("type variables");
    assert_eq!(vars.len(), 1);
    assert!(f.is_declaration(vars[0]));
}

#[test]
fn accessors_reject_the_wrong_kind() {
    let store = TypeStore::with_minimal_jdk();
    let string = store.well_known().string;
    let mut f = factory(&store);
    let declared = f.from_type(&Type::class(string, vec![]));

    match f.component_type(declared) {
        Err(FrameworkError::UnexpectedKind { op, found, .. }) => {
            assert_eq!(op, "component_type");
            assert_eq!(found, AtmKind::Declared);
        }
        other => panic!("expected a kind error, got {other:?}"),
    }
    assert!(f.upper_bound(declared).is_err());
    assert!(f.return_type(declared).is_err());
}

#[test]
fn effective_annotations_follow_upper_bounds() {
    let mut store = TypeStore::with_minimal_jdk();
    let number = store.well_known().number;
    let bounded = store.add_type_param(
        "N",
        vec![Type::annotated(["NonNull"], Type::class(number, vec![]))],
    );
    let plain = store.add_type_param("T", Vec::new());
    let mut f = factory(&store);
    let nullable = q(&f, "Nullable");

    let n = f.from_type(&Type::type_var(bounded));
    assert_eq!(
        f.effective_annotation_in_hierarchy(n, nullable).expect("effective"),
        Some(q(&f, "NonNull"))
    );
    let t = f.from_type(&Type::type_var(plain));
    assert_eq!(
        f.effective_annotation_in_hierarchy(t, nullable).expect("effective"),
        Some(nullable)
    );
    let lower = f.effective_lower_bound_annotations(t).expect("effective");
    assert!(lower.contains(q(&f, "NonNull")));
    assert!(lower.contains(q(&f, "Untainted")));
}

#[test]
fn as_super_carries_primaries_and_arguments() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let strings = f.from_type(&Type::annotated(
        ["NonNull"],
        Type::class(
            wk.array_list,
            vec![Type::annotated(["Nullable"], Type::class(wk.string, vec![]))],
        ),
    ));
    let list = f.from_class_declaration(wk.list).expect("declaration");

    let view = f.as_super(strings, list).expect("as super");
    assert_eq!(f.declared_class(view), Some(wk.list));
    assert!(f.has_annotation(view, q(&f, "NonNull")));
    let arg = f.type_arguments(view).expect("args")[0];
    assert_eq!(f.underlying(arg), &Type::class(wk.string, vec![]));
    assert!(f.has_annotation(arg, q(&f, "Nullable")));
}

#[test]
fn raw_types_have_raw_supertypes() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let mut f = factory(&store);
    let raw = f.from_type(&Type::annotated(["NonNull"], Type::class(wk.array_list, vec![])));

    let supers = f.direct_supertypes(raw).expect("supertypes");
    assert!(!supers.is_empty());
    for sup in supers {
        assert!(f.type_arguments(sup).expect("args").is_empty());
        assert!(f.has_annotation(sup, q(&f, "NonNull")));
    }
}
