//! Read-only visitor over annotated types.
//!
//! Visitors see only structure that has already been computed; they take a
//! shared borrow of the factory, so nothing reachable from a visitor can
//! trigger lazy initialization. Formatting and hashing are built on it.

use crate::atm::{AtmId, AtmKind};
use crate::factory::AnnotatedTypeFactory;

pub trait AtmVisitor {
    type Output;

    fn visit_declared(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> Self::Output;
    fn visit_executable(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId)
    -> Self::Output;
    fn visit_array(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> Self::Output;
    fn visit_type_variable(
        &mut self,
        factory: &AnnotatedTypeFactory<'_>,
        id: AtmId,
    ) -> Self::Output;
    fn visit_wildcard(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> Self::Output;
    fn visit_primitive(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> Self::Output;
    fn visit_null(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> Self::Output;
    fn visit_no_type(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> Self::Output;
    fn visit_intersection(
        &mut self,
        factory: &AnnotatedTypeFactory<'_>,
        id: AtmId,
    ) -> Self::Output;
    fn visit_union(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> Self::Output;

    /// Dispatch on the kind of `id`.
    fn visit(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> Self::Output {
        match factory.kind(id) {
            AtmKind::Declared => self.visit_declared(factory, id),
            AtmKind::Executable => self.visit_executable(factory, id),
            AtmKind::Array => self.visit_array(factory, id),
            AtmKind::TypeVariable => self.visit_type_variable(factory, id),
            AtmKind::Wildcard => self.visit_wildcard(factory, id),
            AtmKind::Primitive => self.visit_primitive(factory, id),
            AtmKind::Null => self.visit_null(factory, id),
            AtmKind::NoType => self.visit_no_type(factory, id),
            AtmKind::Intersection => self.visit_intersection(factory, id),
            AtmKind::Union => self.visit_union(factory, id),
        }
    }
}
