//! Effective annotations.
//!
//! Type variables and wildcards take their qualifiers from their bounds.
//! The effective annotation in a sub-hierarchy is found by following upper
//! (or extends) bounds until a concrete type is reached; intersections
//! contribute the greatest lower bound of their conjuncts.

use crate::annotations::{AnnotationSet, QualifierId};
use crate::atm::{AtmId, AtmKind};
use crate::error::{FrameworkError, TypeResult};
use crate::factory::AnnotatedTypeFactory;
use crate::recursion::{DepthCounter, RecursionProfile};

impl<'env> AnnotatedTypeFactory<'env> {
    /// The qualifier `id` effectively has in the sub-hierarchy of `top`.
    pub fn effective_annotation_in_hierarchy(
        &mut self,
        id: AtmId,
        top: QualifierId,
    ) -> TypeResult<Option<QualifierId>> {
        let mut depth = DepthCounter::with_profile(RecursionProfile::SubtypeCheck);
        self.effective_upper(id, top, &mut depth)
    }

    /// One effective qualifier per sub-hierarchy, where one exists.
    pub fn effective_annotations(&mut self, id: AtmId) -> TypeResult<AnnotationSet> {
        let tops = self.hierarchy().top_annotations().to_vec();
        let mut out = AnnotationSet::new();
        for top in tops {
            if let Some(q) = self.effective_annotation_in_hierarchy(id, top)? {
                out.insert(q);
            }
        }
        Ok(out)
    }

    /// Like [`effective_annotations`](Self::effective_annotations) but
    /// following lower (or super) bounds.
    pub fn effective_lower_bound_annotations(&mut self, id: AtmId) -> TypeResult<AnnotationSet> {
        let tops = self.hierarchy().top_annotations().to_vec();
        let mut out = AnnotationSet::new();
        for top in tops {
            let mut depth = DepthCounter::with_profile(RecursionProfile::SubtypeCheck);
            if let Some(q) = self.effective_lower(id, top, &mut depth)? {
                out.insert(q);
            }
        }
        Ok(out)
    }

    /// [`effective_annotation_in_hierarchy`](Self::effective_annotation_in_hierarchy),
    /// failing when no qualifier is found.
    pub(crate) fn require_effective(
        &mut self,
        id: AtmId,
        top: QualifierId,
    ) -> TypeResult<QualifierId> {
        match self.effective_annotation_in_hierarchy(id, top)? {
            Some(q) => Ok(q),
            None => Err(self.missing_annotation(id, top)),
        }
    }

    pub(crate) fn missing_annotation(&self, id: AtmId, top: QualifierId) -> FrameworkError {
        FrameworkError::MissingAnnotation {
            ty: self.format(id),
            top: self.hierarchy().name(top).to_owned(),
        }
    }

    fn effective_upper(
        &mut self,
        id: AtmId,
        top: QualifierId,
        depth: &mut DepthCounter,
    ) -> TypeResult<Option<QualifierId>> {
        match self.kind(id) {
            AtmKind::TypeVariable | AtmKind::Wildcard => {
                if let Some(q) = self.annotation_in_hierarchy(id, top) {
                    return Ok(Some(q));
                }
                let upper = self.upper_bound(id)?;
                depth.enter_or_fail(RecursionProfile::SubtypeCheck)?;
                let found = self.effective_upper(upper, top, depth)?;
                depth.leave();
                Ok(found)
            }
            AtmKind::Intersection => {
                if let Some(q) = self.annotation_in_hierarchy(id, top) {
                    return Ok(Some(q));
                }
                let mut glb: Option<QualifierId> = None;
                for bound in self.intersection_bounds(id)? {
                    depth.enter_or_fail(RecursionProfile::SubtypeCheck)?;
                    let q = self.effective_upper(bound, top, depth)?;
                    depth.leave();
                    glb = self
                        .hierarchy()
                        .greatest_lower_bound_type_variable(glb, q)?;
                }
                Ok(glb)
            }
            _ => Ok(self.annotation_in_hierarchy(id, top)),
        }
    }

    fn effective_lower(
        &mut self,
        id: AtmId,
        top: QualifierId,
        depth: &mut DepthCounter,
    ) -> TypeResult<Option<QualifierId>> {
        match self.kind(id) {
            AtmKind::TypeVariable | AtmKind::Wildcard => {
                if let Some(q) = self.annotation_in_hierarchy(id, top) {
                    return Ok(Some(q));
                }
                let lower = self.lower_bound(id)?;
                depth.enter_or_fail(RecursionProfile::SubtypeCheck)?;
                let found = self.effective_lower(lower, top, depth)?;
                depth.leave();
                Ok(found)
            }
            _ => Ok(self.annotation_in_hierarchy(id, top)),
        }
    }
}
