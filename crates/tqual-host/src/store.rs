//! In-memory declaration store with a minimal JDK.

use crate::{
    ClassDef, ClassId, ClassKind, Type, TypeEnv, TypeParamDef, TypeVarId, WildcardBound,
};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Frequently used JDK classes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub char_sequence: ClassId,
    pub serializable: ClassId,
    pub cloneable: ClassId,
    pub comparable: ClassId,
    pub number: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub character: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
    pub iterable: ClassId,
    pub collection: ClassId,
    pub list: ClassId,
    pub array_list: ClassId,
    pub map: ClassId,
    pub hash_map: ClassId,
    pub throwable: ClassId,
    pub exception: ClassId,
    pub runtime_exception: ClassId,
    pub io_exception: ClassId,
    pub enum_: ClassId,
}

/// Owns every class and type-parameter declaration.
#[derive(Clone, Debug)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    type_params: Vec<TypeParamDef>,
    by_name: FxHashMap<String, ClassId>,
    well_known: WellKnownTypes,
    next_capture: u32,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::with_minimal_jdk()
    }
}

impl TypeStore {
    /// A store pre-populated with the core `java.lang`, `java.io` and
    /// `java.util` types the solver and its tests rely on.
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore {
            classes: Vec::new(),
            type_params: Vec::new(),
            by_name: FxHashMap::default(),
            well_known: WellKnownTypes {
                object: ClassId(0),
                string: ClassId(0),
                char_sequence: ClassId(0),
                serializable: ClassId(0),
                cloneable: ClassId(0),
                comparable: ClassId(0),
                number: ClassId(0),
                boolean: ClassId(0),
                byte: ClassId(0),
                short: ClassId(0),
                character: ClassId(0),
                integer: ClassId(0),
                long: ClassId(0),
                float: ClassId(0),
                double: ClassId(0),
                iterable: ClassId(0),
                collection: ClassId(0),
                list: ClassId(0),
                array_list: ClassId(0),
                map: ClassId(0),
                hash_map: ClassId(0),
                throwable: ClassId(0),
                exception: ClassId(0),
                runtime_exception: ClassId(0),
                io_exception: ClassId(0),
                enum_: ClassId(0),
            },
            next_capture: 0,
        };

        let object = store.add_class(ClassDef::new("java.lang.Object", ClassKind::Class));
        let obj = || Type::class(object, Vec::new());

        let serializable =
            store.add_class(ClassDef::new("java.io.Serializable", ClassKind::Interface));
        let cloneable = store.add_class(ClassDef::new("java.lang.Cloneable", ClassKind::Interface));
        let char_sequence =
            store.add_class(ClassDef::new("java.lang.CharSequence", ClassKind::Interface));

        let comparable_t = store.add_type_param("T", Vec::new());
        let comparable = store.add_class(
            ClassDef::new("java.lang.Comparable", ClassKind::Interface)
                .with_type_params(vec![comparable_t]),
        );
        let comparable_of =
            |id: ClassId| Type::class(comparable, vec![Type::class(id, Vec::new())]);

        let string = store.reserve_class("java.lang.String");
        store.define_class(
            string,
            ClassDef::new("java.lang.String", ClassKind::Class)
                .extends(obj())
                .implements(Type::class(serializable, Vec::new()))
                .implements(comparable_of(string))
                .implements(Type::class(char_sequence, Vec::new())),
        );

        let number = store.add_class(
            ClassDef::new("java.lang.Number", ClassKind::Class)
                .extends(obj())
                .implements(Type::class(serializable, Vec::new())),
        );

        let boxed = |store: &mut TypeStore, name: &str, base: ClassId| {
            let id = store.reserve_class(name);
            store.define_class(
                id,
                ClassDef::new(name, ClassKind::Class)
                    .extends(Type::class(base, Vec::new()))
                    .implements(Type::class(serializable, Vec::new()))
                    .implements(comparable_of(id)),
            );
            id
        };
        let boolean = boxed(&mut store, "java.lang.Boolean", object);
        let character = boxed(&mut store, "java.lang.Character", object);
        let byte = boxed(&mut store, "java.lang.Byte", number);
        let short = boxed(&mut store, "java.lang.Short", number);
        let integer = boxed(&mut store, "java.lang.Integer", number);
        let long = boxed(&mut store, "java.lang.Long", number);
        let float = boxed(&mut store, "java.lang.Float", number);
        let double = boxed(&mut store, "java.lang.Double", number);

        let iterable_t = store.add_type_param("T", Vec::new());
        let iterable = store.add_class(
            ClassDef::new("java.lang.Iterable", ClassKind::Interface)
                .with_type_params(vec![iterable_t]),
        );

        let collection_e = store.add_type_param("E", Vec::new());
        let collection = store.add_class(
            ClassDef::new("java.util.Collection", ClassKind::Interface)
                .with_type_params(vec![collection_e])
                .implements(Type::class(iterable, vec![Type::TypeVar(collection_e)])),
        );

        let list_e = store.add_type_param("E", Vec::new());
        let list = store.add_class(
            ClassDef::new("java.util.List", ClassKind::Interface)
                .with_type_params(vec![list_e])
                .implements(Type::class(collection, vec![Type::TypeVar(list_e)])),
        );

        let abstract_collection_e = store.add_type_param("E", Vec::new());
        let abstract_collection = store.add_class(
            ClassDef::new("java.util.AbstractCollection", ClassKind::Class)
                .with_type_params(vec![abstract_collection_e])
                .extends(obj())
                .implements(Type::class(
                    collection,
                    vec![Type::TypeVar(abstract_collection_e)],
                )),
        );

        let abstract_list_e = store.add_type_param("E", Vec::new());
        let abstract_list = store.add_class(
            ClassDef::new("java.util.AbstractList", ClassKind::Class)
                .with_type_params(vec![abstract_list_e])
                .extends(Type::class(
                    abstract_collection,
                    vec![Type::TypeVar(abstract_list_e)],
                ))
                .implements(Type::class(list, vec![Type::TypeVar(abstract_list_e)])),
        );

        let array_list_e = store.add_type_param("E", Vec::new());
        let array_list = store.add_class(
            ClassDef::new("java.util.ArrayList", ClassKind::Class)
                .with_type_params(vec![array_list_e])
                .extends(Type::class(abstract_list, vec![Type::TypeVar(array_list_e)]))
                .implements(Type::class(list, vec![Type::TypeVar(array_list_e)]))
                .implements(Type::class(cloneable, Vec::new()))
                .implements(Type::class(serializable, Vec::new())),
        );

        let map_k = store.add_type_param("K", Vec::new());
        let map_v = store.add_type_param("V", Vec::new());
        let map = store.add_class(
            ClassDef::new("java.util.Map", ClassKind::Interface)
                .with_type_params(vec![map_k, map_v]),
        );

        let hash_map_k = store.add_type_param("K", Vec::new());
        let hash_map_v = store.add_type_param("V", Vec::new());
        let hash_map = store.add_class(
            ClassDef::new("java.util.HashMap", ClassKind::Class)
                .with_type_params(vec![hash_map_k, hash_map_v])
                .extends(obj())
                .implements(Type::class(
                    map,
                    vec![Type::TypeVar(hash_map_k), Type::TypeVar(hash_map_v)],
                ))
                .implements(Type::class(cloneable, Vec::new()))
                .implements(Type::class(serializable, Vec::new())),
        );

        let throwable = store.add_class(
            ClassDef::new("java.lang.Throwable", ClassKind::Class)
                .extends(obj())
                .implements(Type::class(serializable, Vec::new())),
        );
        let exception = store.add_class(
            ClassDef::new("java.lang.Exception", ClassKind::Class)
                .extends(Type::class(throwable, Vec::new())),
        );
        let runtime_exception = store.add_class(
            ClassDef::new("java.lang.RuntimeException", ClassKind::Class)
                .extends(Type::class(exception, Vec::new())),
        );
        let io_exception = store.add_class(
            ClassDef::new("java.io.IOException", ClassKind::Class)
                .extends(Type::class(exception, Vec::new())),
        );

        // Enum<E extends Enum<E>>
        let enum_e = store.add_type_param("E", Vec::new());
        let enum_ = store.add_class(
            ClassDef::new("java.lang.Enum", ClassKind::Class)
                .with_type_params(vec![enum_e])
                .extends(obj())
                .implements(Type::class(comparable, vec![Type::TypeVar(enum_e)]))
                .implements(Type::class(serializable, Vec::new())),
        );
        store.set_type_param_bounds(
            enum_e,
            vec![Type::class(enum_, vec![Type::TypeVar(enum_e)])],
            None,
        );

        store.well_known = WellKnownTypes {
            object,
            string,
            char_sequence,
            serializable,
            cloneable,
            comparable,
            number,
            boolean,
            byte,
            short,
            character,
            integer,
            long,
            float,
            double,
            iterable,
            collection,
            list,
            array_list,
            map,
            hash_map,
            throwable,
            exception,
            runtime_exception,
            io_exception,
            enum_,
        };
        store
    }

    /// Add (or replace, by binary name) a class declaration.
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        if let Some(&existing) = self.by_name.get(&def.name) {
            self.classes[existing.0 as usize] = def;
            return existing;
        }
        let id = ClassId(self.classes.len() as u32);
        self.by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    /// Allocate an id for a class whose declaration refers to itself
    /// (`class String implements Comparable<String>`). Fill it in with
    /// [`define_class`](Self::define_class).
    pub fn reserve_class(&mut self, name: &str) -> ClassId {
        self.add_class(ClassDef::new(name, ClassKind::Class))
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        if let Some(slot) = self.classes.get_mut(id.0 as usize) {
            self.by_name.remove(&slot.name);
            self.by_name.insert(def.name.clone(), id);
            *slot = def;
        }
    }

    pub fn class_mut(&mut self, id: ClassId) -> Option<&mut ClassDef> {
        self.classes.get_mut(id.0 as usize)
    }

    /// Declare a type parameter. Bounds may be patched later with
    /// [`set_type_param_bounds`](Self::set_type_param_bounds) when they refer
    /// back to the declaring class.
    pub fn add_type_param(&mut self, name: &str, upper_bounds: Vec<Type>) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.to_owned(),
            upper_bounds,
            lower_bound: None,
            captured: false,
        });
        id
    }

    pub fn set_type_param_bounds(
        &mut self,
        id: TypeVarId,
        upper_bounds: Vec<Type>,
        lower_bound: Option<Type>,
    ) {
        if let Some(tp) = self.type_params.get_mut(id.0 as usize) {
            tp.upper_bounds = upper_bounds;
            tp.lower_bound = lower_bound;
        }
    }

    /// Allocate a fresh captured type variable for a wildcard argument.
    ///
    /// `param` is the declared parameter the wildcard stands for; an
    /// unbounded or `super` wildcard inherits its upper bound.
    pub fn capture_wildcard(
        &mut self,
        bound: &WildcardBound,
        param: Option<TypeVarId>,
    ) -> TypeVarId {
        let declared_bounds = param
            .and_then(|p| self.type_param(p))
            .map(|tp| tp.upper_bounds.clone())
            .unwrap_or_default();
        let (upper_bounds, lower_bound) = match bound {
            WildcardBound::Unbounded => (declared_bounds, None),
            WildcardBound::Extends(b) => (vec![(**b).clone()], None),
            WildcardBound::Super(b) => (declared_bounds, Some((**b).clone())),
        };

        self.next_capture += 1;
        let name = format!("CAP#{}", self.next_capture);
        trace!(name = %name, "capturing wildcard");
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name,
            upper_bounds,
            lower_bound,
            captured: true,
        });
        id
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)
    }

    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    fn class_id(&self, binary_name: &str) -> Option<ClassId> {
        self.by_name.get(binary_name).copied()
    }

    fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }
}
