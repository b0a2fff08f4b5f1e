//! Type-parameter correspondence across supertype chains.

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_direct_forwarding() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    assert_eq!(
        map_type_argument_indices(&store, wk.array_list, wk.list),
        vec![(0, 0)]
    );
    assert_eq!(
        map_type_argument_indices(&store, wk.hash_map, wk.map),
        vec![(0, 0), (1, 1)]
    );
}

#[test]
fn test_forwarding_through_several_levels() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    assert_eq!(
        map_type_argument_indices(&store, wk.array_list, wk.iterable),
        vec![(0, 0)]
    );
}

#[test]
fn test_swapped_parameters_are_sorted_by_destination() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let a = store.add_type_param("A", Vec::new());
    let b = store.add_type_param("B", Vec::new());
    let flipped = store.add_class(
        ClassDef::new("test.Flipped", ClassKind::Class)
            .with_type_params(vec![a, b])
            .implements(Type::class(wk.map, vec![Type::TypeVar(b), Type::TypeVar(a)])),
    );
    assert_eq!(
        map_type_argument_indices(&store, flipped, wk.map),
        vec![(1, 0), (0, 1)]
    );
}

#[test]
fn test_concrete_arguments_do_not_map() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let v = store.add_type_param("V", Vec::new());
    let by_name = store.add_class(
        ClassDef::new("test.ByName", ClassKind::Class)
            .with_type_params(vec![v])
            .implements(Type::class(
                wk.map,
                vec![Type::class(wk.string, Vec::new()), Type::TypeVar(v)],
            )),
    );
    assert_eq!(
        map_type_argument_indices(&store, by_name, wk.map),
        vec![(0, 1)]
    );
}

#[test]
fn test_unrelated_classes_have_no_mapping() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    assert!(map_type_argument_indices(&store, wk.list, wk.map).is_empty());
}

#[test]
fn test_direct_supertypes_substitute_and_erase() {
    let store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let string = Type::class(wk.string, Vec::new());
    let ct = ClassType {
        def: wk.list,
        args: vec![string.clone()],
        enclosing: None,
    };
    assert_eq!(
        direct_supertypes(&store, &ct),
        vec![Type::class(wk.collection, vec![string])]
    );

    let raw = ClassType {
        def: wk.list,
        args: Vec::new(),
        enclosing: None,
    };
    assert_eq!(
        direct_supertypes(&store, &raw),
        vec![Type::class(wk.collection, Vec::new())]
    );

    let serializable = ClassType {
        def: wk.serializable,
        args: Vec::new(),
        enclosing: None,
    };
    assert_eq!(
        direct_supertypes(&store, &serializable),
        vec![Type::class(wk.object, Vec::new())]
    );
}

#[test]
fn test_substitute_keeps_annotations() {
    let mut store = TypeStore::with_minimal_jdk();
    let wk = store.well_known().clone();
    let t = store.add_type_param("T", Vec::new());
    let mut map = Substitution::default();
    map.insert(t, Type::class(wk.string, Vec::new()));

    let ty = Type::class(
        wk.list,
        vec![Type::annotated(["NonNull"], Type::TypeVar(t))],
    );
    assert_eq!(
        substitute(&ty, &map),
        Type::class(
            wk.list,
            vec![Type::annotated(["NonNull"], Type::class(wk.string, Vec::new()))],
        )
    );
}
