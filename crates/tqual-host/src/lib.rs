//! Host type model.
//!
//! The qualifier solver is layered on top of a host compiler's type system.
//! This crate is that host: class and type-parameter declarations, plain
//! (unqualified) `Type` values, and the handful of host-level queries the
//! solver needs (erasure, subtyping, as-super substitution, boxing,
//! type-parameter correspondence).
//!
//! Types are plain values. Identity of a generic declaration is carried by
//! [`ClassId`] and [`TypeVarId`]; nothing here is cyclic, so `Eq`/`Hash` are
//! derived structurally.
//!
//! ## Type-use annotations
//!
//! [`Type::Annotated`] records the names of type-use annotations written on a
//! type (`@Nullable String`). The host never interprets them; the solver's
//! factory turns them into qualifiers.

mod format;
mod ops;
mod store;

pub use format::format_type;
pub use ops::{
    as_super, boxed_class, direct_supertypes, erasure, is_erased_subtype, is_primitive_widening,
    is_raw, is_subtype, map_type_argument_indices, substitute, unboxed_primitive,
};
pub use store::{TypeStore, WellKnownTypes};

use rustc_hash::FxHashMap;
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a class or interface declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// Identifier of a type parameter declaration (including captured variables).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(pub u32);

// =============================================================================
// Declarations
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
}

/// A declaration annotation such as `@Covariant({0})`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeclAnnotation {
    pub name: String,
    pub values: Vec<i64>,
}

impl DeclAnnotation {
    pub fn new(name: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// A class, interface or enum declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDef {
    /// Binary name, e.g. `java.util.List`.
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    /// Enclosing class for non-static member classes.
    pub enclosing: Option<ClassId>,
    pub annotations: Vec<DeclAnnotation>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            enclosing: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_type_params(mut self, params: Vec<TypeVarId>) -> Self {
        self.type_params = params;
        self
    }

    pub fn extends(mut self, super_class: Type) -> Self {
        self.super_class = Some(super_class);
        self
    }

    pub fn implements(mut self, interface: Type) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn enclosed_by(mut self, outer: ClassId) -> Self {
        self.enclosing = Some(outer);
        self
    }

    pub fn annotated(mut self, annotation: DeclAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Unqualified name: the part after the last `.` or `$`.
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(['.', '$'])
            .next()
            .unwrap_or(self.name.as_str())
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn declaration_annotation(&self, name: &str) -> Option<&DeclAnnotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Declared supertypes in source order: superclass first, then interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &Type> {
        self.super_class.iter().chain(self.interfaces.iter())
    }
}

/// A type parameter declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamDef {
    pub name: String,
    /// Empty means `Object`; more than one forms an intersection bound.
    pub upper_bounds: Vec<Type>,
    /// Only captured variables have a lower bound.
    pub lower_bound: Option<Type>,
    /// Fresh variable produced by capture of a wildcard.
    pub captured: bool,
}

impl TypeParamDef {
    /// The single upper bound type: `Object`, the sole bound, or an intersection.
    pub fn upper_bound(&self, env: &dyn TypeEnv) -> Type {
        match self.upper_bounds.as_slice() {
            [] => Type::class(env.well_known().object, Vec::new()),
            [single] => single.clone(),
            many => Type::Intersection(many.to_vec()),
        }
    }
}

// =============================================================================
// Types
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Char,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Char => "char",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parameterized (or raw) class type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub def: ClassId,
    /// Empty for raw uses of generic classes.
    pub args: Vec<Type>,
    /// Enclosing instance type for inner classes.
    pub enclosing: Option<Box<Type>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// Signature of a method or constructor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodType {
    pub name: String,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    pub return_type: Type,
    /// `None` for static methods and top-level constructors.
    pub receiver: Option<Type>,
    pub thrown: Vec<Type>,
}

/// An unqualified host type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Class(ClassType),
    Array(Box<Type>),
    TypeVar(TypeVarId),
    Wildcard(WildcardBound),
    Primitive(PrimitiveType),
    Null,
    /// `void` and the absent type.
    Void,
    Intersection(Vec<Type>),
    Union(Vec<Type>),
    Executable(Box<MethodType>),
    /// Type-use annotation names written on the inner type.
    Annotated(Vec<String>, Box<Type>),
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType {
            def,
            args,
            enclosing: None,
        })
    }

    /// An inner class type `Outer<..>.Inner<..>`.
    pub fn nested(outer: Type, def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType {
            def,
            args,
            enclosing: Some(Box::new(outer)),
        })
    }

    pub fn array(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    pub fn type_var(id: TypeVarId) -> Self {
        Type::TypeVar(id)
    }

    pub fn unbounded() -> Self {
        Type::Wildcard(WildcardBound::Unbounded)
    }

    pub fn extends(bound: Type) -> Self {
        Type::Wildcard(WildcardBound::Extends(Box::new(bound)))
    }

    pub fn super_of(bound: Type) -> Self {
        Type::Wildcard(WildcardBound::Super(Box::new(bound)))
    }

    /// Attach type-use annotation names. Nested wrappers are merged.
    pub fn annotated<I, S>(names: I, inner: Type) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        match inner {
            Type::Annotated(more, inner) => {
                names.extend(more);
                Type::Annotated(names, inner)
            }
            other => Type::Annotated(names, Box::new(other)),
        }
    }

    /// The type with outer annotation wrappers removed.
    pub fn peel(&self) -> &Type {
        let mut ty = self;
        while let Type::Annotated(_, inner) = ty {
            ty = inner;
        }
        ty
    }

    /// Annotation names on the outermost level.
    pub fn annotation_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut ty = self;
        while let Type::Annotated(names, inner) = ty {
            out.extend(names.iter().map(String::as_str));
            ty = inner;
        }
        out
    }

    /// Deep copy with every annotation wrapper removed.
    pub fn unannotated(&self) -> Type {
        match self {
            Type::Annotated(_, inner) => inner.unannotated(),
            Type::Class(ct) => Type::Class(ClassType {
                def: ct.def,
                args: ct.args.iter().map(Type::unannotated).collect(),
                enclosing: ct.enclosing.as_ref().map(|e| Box::new(e.unannotated())),
            }),
            Type::Array(c) => Type::array(c.unannotated()),
            Type::Wildcard(WildcardBound::Extends(b)) => Type::extends(b.unannotated()),
            Type::Wildcard(WildcardBound::Super(b)) => Type::super_of(b.unannotated()),
            Type::Intersection(parts) => {
                Type::Intersection(parts.iter().map(Type::unannotated).collect())
            }
            Type::Union(alts) => Type::Union(alts.iter().map(Type::unannotated).collect()),
            Type::Executable(m) => Type::Executable(Box::new(MethodType {
                name: m.name.clone(),
                type_params: m.type_params.clone(),
                params: m.params.iter().map(Type::unannotated).collect(),
                return_type: m.return_type.unannotated(),
                receiver: m.receiver.as_ref().map(Type::unannotated),
                thrown: m.thrown.iter().map(Type::unannotated).collect(),
            })),
            other => other.clone(),
        }
    }

    pub fn is_reference(&self) -> bool {
        !matches!(
            self.peel(),
            Type::Primitive(_) | Type::Void | Type::Executable(_)
        )
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self.peel() {
            Type::Class(ct) => Some(ct),
            _ => None,
        }
    }
}

/// Substitution from type parameters to types.
pub type Substitution = FxHashMap<TypeVarId, Type>;

// =============================================================================
// Environment
// =============================================================================

/// Read access to host declarations.
///
/// The solver consumes the host exclusively through this trait.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef>;
    fn class_id(&self, binary_name: &str) -> Option<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

#[cfg(test)]
#[path = "../tests/minimal_jdk_subtyping.rs"]
mod minimal_jdk_subtyping;

#[cfg(test)]
#[path = "../tests/type_arg_mapping.rs"]
mod type_arg_mapping;
