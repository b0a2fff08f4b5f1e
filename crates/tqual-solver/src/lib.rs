//! Qualifier Type-Checking Core
//!
//! Pluggable type qualifiers layered over a host type system. It provides:
//!
//! - **Qualifier hierarchies**: a lattice of qualifiers per sub-hierarchy,
//!   built from configuration
//! - **Annotated types**: host types paired with qualifiers, stored in an
//!   arena and addressed by [`AtmId`]
//! - **Bounds initialization**: lazy, cycle-aware construction of type
//!   variable and wildcard bounds
//! - **Equality and subtyping**: structural comparison and qualified
//!   subtyping with coinductive handling of recursive bounds
//!
//! Everything hangs off an [`AnnotatedTypeFactory`], which owns the arena and
//! the per-compilation caches for one host type environment.
pub mod annotations;
mod as_super;
pub mod atm;
mod bounds;
pub mod config;
mod copy;
mod effective;
pub mod equality;
pub mod error;
pub mod factory;
pub mod format;
mod hash;
pub mod hierarchy;
mod rawness;
pub mod recursion;
pub mod subtype;
mod subtype_rules;
pub mod visit_history;
pub mod visitor;

pub use annotations::{AnnotationSet, QualifierId};
pub use atm::{AtmData, AtmId, AtmKind, AtmNode, CopyMode, Lazy};
pub use config::{FactoryConfig, HierarchyConfig, QualifierDecl};
pub use equality::StructuralEqualityComparer;
pub use error::{ConfigError, FrameworkError, TypeResult};
pub use factory::AnnotatedTypeFactory;
pub use format::{AtmFormatter, DefaultAtmFormatter};
pub use hierarchy::{GraphQualifierHierarchy, QualifierHierarchy, QualifierHierarchyBuilder};
pub use subtype::SubtypeChecker;
pub use visit_history::VisitHistory;
pub use visitor::AtmVisitor;
