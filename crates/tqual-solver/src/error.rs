//! Error types.
//!
//! [`FrameworkError`] is an internal-consistency failure: a malformed type,
//! an unreachable kind pair, a broken caller contract. It always aborts the
//! query that raised it. [`ConfigError`] reports a bad qualifier hierarchy
//! or factory configuration and is raised before any type checking starts.

use crate::atm::AtmKind;
use tqual_host::{ClassId, TypeVarId};

pub type TypeResult<T> = Result<T, FrameworkError>;

#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("incomparable types ({sub}, {sup}) visitHistory = {history}")]
    IncomparableTypes {
        sub: String,
        sup: String,
        history: String,
    },

    #[error("annotated type kinds are not comparable for equality: {left} vs {right}; visitHistory = {history}")]
    MismatchedKinds {
        left: String,
        right: String,
        history: String,
    },

    #[error("invalid bound {ty} at path [{path}]")]
    InvalidBound { ty: String, path: String },

    #[error("mismatched type-argument counts: [{left}] vs [{right}]")]
    ArgumentCountMismatch { left: String, right: String },

    #[error("qualifier collections differ in size: expected {expected}, found {found}")]
    QualifierCollectionSize { expected: usize, found: usize },

    #[error("qualifier collection is empty")]
    EmptyQualifierCollection,

    #[error("qualifiers {left} and {right} belong to different sub-hierarchies")]
    DifferentHierarchies { left: String, right: String },

    #[error("{ty} has no annotation in the hierarchy of {top}")]
    MissingAnnotation { ty: String, top: String },

    #[error("{sub} is not an erased subtype of {sup}")]
    NotErasedSubtype { sub: String, sup: String },

    #[error("{op} expects a {expected} type, found {found:?}")]
    UnexpectedKind {
        op: &'static str,
        expected: &'static str,
        found: AtmKind,
    },

    #[error("unknown class {0:?}")]
    UnknownClass(ClassId),

    #[error("unknown type parameter {0:?}")]
    UnknownTypeParam(TypeVarId),

    #[error("recursion limit of {depth} exceeded during {pass}")]
    RecursionLimit { pass: &'static str, depth: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("the qualifier hierarchy declares no qualifiers")]
    NoQualifiers,

    #[error("qualifier {0} is declared more than once")]
    DuplicateQualifier(String),

    #[error("unknown qualifier {name} referenced by {referenced_by}")]
    UnknownQualifier { name: String, referenced_by: String },

    #[error("polymorphic qualifier {0} must not declare supertypes")]
    PolymorphicWithSupertypes(String),

    #[error("polymorphic qualifier {0} must name the top of its sub-hierarchy")]
    PolymorphicWithoutTop(String),

    #[error("{top} is not the top of a sub-hierarchy (named by polymorphic qualifier {name})")]
    PolymorphicTopNotTop { name: String, top: String },

    #[error("cyclic subtyping through qualifier {0}")]
    CyclicSubtyping(String),

    #[error("sub-hierarchy has more than one top: {}", .0.join(", "))]
    MultipleTops(Vec<String>),

    #[error("sub-hierarchy has more than one bottom: {}", .0.join(", "))]
    MultipleBottoms(Vec<String>),

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}
