//! Bounds initialization for type variables and wildcards.
//!
//! Bounds are built once per node, on first access, by walking the host
//! bound types. Recursive declarations (`T extends Comparable<T>`) terminate
//! because every type variable met during one pass gets a single *template*
//! node whose bounds are built exactly once:
//!
//! - an occurrence of a variable whose template is still being built (its
//!   frame is on the stack) links to the template itself, closing the cycle;
//! - every other occurrence gets a placeholder that is filled with a deep
//!   copy of the finished template once the whole pass is done.
//!
//! The primaries of the node being initialized are saved and cleared for the
//! duration of the pass so they never leak into the shared skeleton.
//!
//! Bound roots without a qualifier in some sub-hierarchy receive that
//! sub-hierarchy's top (upper and extends bounds) or bottom (lower and super
//! bounds).

use crate::annotations::AnnotationSet;
use crate::atm::{AtmData, AtmId, AtmKind, AtmNode, CopyMode, Lazy};
use crate::error::{FrameworkError, TypeResult};
use crate::factory::AnnotatedTypeFactory;
use crate::recursion::{DepthCounter, RecursionProfile};
use rustc_hash::FxHashMap;
use std::fmt;
use tqual_host::{Type, TypeVarId, WildcardBound, format_type};
use tracing::{trace, trace_span};

/// One step from a bound root towards a nested type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoundStep {
    Upper,
    Lower,
    Extends,
    Super,
    TypeArg(usize),
    Component,
    IntersectionBranch(usize),
    UnionAlternative(usize),
    Enclosing,
}

impl fmt::Display for BoundStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundStep::Upper => f.write_str("upper"),
            BoundStep::Lower => f.write_str("lower"),
            BoundStep::Extends => f.write_str("extends"),
            BoundStep::Super => f.write_str("super"),
            BoundStep::TypeArg(i) => write!(f, "arg {i}"),
            BoundStep::Component => f.write_str("component"),
            BoundStep::IntersectionBranch(i) => write!(f, "intersection {i}"),
            BoundStep::UnionAlternative(i) => write!(f, "union {i}"),
            BoundStep::Enclosing => f.write_str("enclosing"),
        }
    }
}

fn format_path(path: &[BoundStep]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A type-variable occurrence waiting for a copy of its template.
struct Placeholder {
    node: AtmId,
    var: TypeVarId,
}

struct BoundsContext {
    /// One template per type variable met in this pass.
    templates: FxHashMap<TypeVarId, AtmId>,
    /// Variables whose template bounds are being built.
    frames: Vec<TypeVarId>,
    wildcards: FxHashMap<(Type, Option<TypeVarId>), AtmId>,
    intersections: FxHashMap<Type, AtmId>,
    placeholders: Vec<Placeholder>,
    path: Vec<BoundStep>,
    depth: DepthCounter,
}

impl BoundsContext {
    fn new() -> Self {
        Self {
            templates: FxHashMap::default(),
            frames: Vec::new(),
            wildcards: FxHashMap::default(),
            intersections: FxHashMap::default(),
            placeholders: Vec::new(),
            path: Vec::new(),
            depth: DepthCounter::with_profile(RecursionProfile::BoundsInit),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum BoundRole {
    Upper,
    Lower,
}

impl<'env> AnnotatedTypeFactory<'env> {
    /// Compute both bounds of the type variable or wildcard `id`.
    ///
    /// Callers push the primaries into the result afterwards with
    /// [`sync_bounds`](Self::sync_bounds).
    pub(crate) fn initialize_bounds(&mut self, id: AtmId) -> TypeResult<()> {
        let _span = trace_span!("init_bounds", id = id.0, kind = ?self.kind(id)).entered();
        let saved = std::mem::take(&mut self.arena[id].annotations);
        let result = self.initialize_bounds_inner(id);
        self.arena[id].annotations = saved;
        result
    }

    fn initialize_bounds_inner(&mut self, id: AtmId) -> TypeResult<()> {
        let mut cx = BoundsContext::new();
        let (upper, lower) = match self.arena[id].data.clone() {
            AtmData::TypeVariable { var, .. } => {
                // The node itself is never the template: it may be a use
                // carrying primaries of its own.
                self.ensure_template(&mut cx, var)?;
                cx.frames.push(var);
                let bounds = self.type_var_bounds(&mut cx, var);
                cx.frames.pop();
                bounds?
            }
            AtmData::Wildcard { type_param, .. } => {
                let bound = match &self.arena[id].underlying {
                    Type::Wildcard(bound) => bound.clone(),
                    _ => WildcardBound::Unbounded,
                };
                self.wildcard_bounds(&mut cx, &bound, type_param)?
            }
            _ => {
                return Err(FrameworkError::UnexpectedKind {
                    op: "initialize_bounds",
                    expected: "type variable or wildcard",
                    found: self.kind(id),
                });
            }
        };
        self.store_bounds(id, upper, lower);
        self.resolve_placeholders(&mut cx)?;

        for (var, template) in &cx.templates {
            trace!(var = var.0, template = template.0, "type variable template");
        }
        Ok(())
    }

    fn store_bounds(&mut self, id: AtmId, upper: AtmId, lower: AtmId) {
        match &mut self.arena[id].data {
            AtmData::TypeVariable {
                upper: u, lower: l, ..
            }
            | AtmData::Wildcard {
                extends: u,
                super_: l,
                ..
            } => {
                *u = Lazy::Computed(upper);
                *l = Lazy::Computed(lower);
            }
            _ => {}
        }
    }

    /// Build the template for `var` unless this pass already has one.
    fn ensure_template(&mut self, cx: &mut BoundsContext, var: TypeVarId) -> TypeResult<AtmId> {
        if let Some(template) = cx.templates.get(&var) {
            return Ok(*template);
        }
        let template = self.arena.alloc(AtmNode::new(
            Type::type_var(var),
            AtmData::TypeVariable {
                var,
                upper: Lazy::Uncomputed,
                lower: Lazy::Uncomputed,
            },
        ));
        cx.templates.insert(var, template);
        cx.frames.push(var);
        let bounds = self.type_var_bounds(cx, var);
        cx.frames.pop();
        let (upper, lower) = bounds?;
        self.store_bounds(template, upper, lower);
        Ok(template)
    }

    /// Fresh upper and lower bound nodes for `var`.
    fn type_var_bounds(
        &mut self,
        cx: &mut BoundsContext,
        var: TypeVarId,
    ) -> TypeResult<(AtmId, AtmId)> {
        let env = self.env();
        let def = env
            .type_param(var)
            .ok_or(FrameworkError::UnknownTypeParam(var))?;
        let upper_ty = def.upper_bound(env);
        let lower_ty = def.lower_bound.clone().unwrap_or(Type::Null);

        let upper = self.build_bound(cx, &upper_ty, BoundStep::Upper, BoundRole::Upper)?;
        let lower = self.build_bound(cx, &lower_ty, BoundStep::Lower, BoundRole::Lower)?;
        Ok((upper, lower))
    }

    /// Extends and super bound nodes for a wildcard standing for `param`.
    fn wildcard_bounds(
        &mut self,
        cx: &mut BoundsContext,
        bound: &WildcardBound,
        param: Option<TypeVarId>,
    ) -> TypeResult<(AtmId, AtmId)> {
        let env = self.env();
        let declared_upper = || match param.and_then(|p| env.type_param(p)) {
            Some(def) => def.upper_bound(env),
            None => Type::class(env.well_known().object, Vec::new()),
        };
        let (extends_ty, super_ty) = match bound {
            WildcardBound::Unbounded => (declared_upper(), Type::Null),
            WildcardBound::Extends(b) => ((**b).clone(), Type::Null),
            WildcardBound::Super(b) => (declared_upper(), (**b).clone()),
        };
        let extends = self.build_bound(cx, &extends_ty, BoundStep::Extends, BoundRole::Upper)?;
        let super_ = self.build_bound(cx, &super_ty, BoundStep::Super, BoundRole::Lower)?;
        Ok((extends, super_))
    }

    fn build_bound(
        &mut self,
        cx: &mut BoundsContext,
        ty: &Type,
        step: BoundStep,
        role: BoundRole,
    ) -> TypeResult<AtmId> {
        cx.path.push(step);
        let built = self.build(cx, ty, None);
        cx.path.pop();
        let root = built?;
        self.default_bound_root(root, role);
        Ok(root)
    }

    /// Give a bound root the top or bottom of every sub-hierarchy it has no
    /// qualifier in. Intersection roots default each conjunct.
    fn default_bound_root(&mut self, root: AtmId, role: BoundRole) {
        let defaults: Vec<_> = match role {
            BoundRole::Upper => self.hierarchy().top_annotations().to_vec(),
            BoundRole::Lower => self.hierarchy().bottom_annotations().to_vec(),
        };
        let mut targets = vec![root];
        if let AtmData::Intersection {
            bounds: Lazy::Computed(bounds),
        } = &self.arena[root].data
        {
            targets.extend(bounds.iter().copied());
        }
        for target in targets {
            if self.kind(target).is_bounded() {
                continue;
            }
            let mut set = self.arena[target].annotations.clone();
            for q in &defaults {
                if self.hierarchy().find_in_hierarchy(&set, *q).is_none() {
                    set.insert(*q);
                }
            }
            self.arena[target].annotations = set;
        }
    }

    fn build(
        &mut self,
        cx: &mut BoundsContext,
        ty: &Type,
        type_param: Option<TypeVarId>,
    ) -> TypeResult<AtmId> {
        cx.depth.enter_or_fail(RecursionProfile::BoundsInit)?;
        let result = self.build_inner(cx, ty, type_param);
        cx.depth.leave();
        result
    }

    fn build_inner(
        &mut self,
        cx: &mut BoundsContext,
        ty: &Type,
        type_param: Option<TypeVarId>,
    ) -> TypeResult<AtmId> {
        let peeled = ty.peel();
        match peeled {
            Type::TypeVar(var) => {
                let annotations = self.qualifiers_for(ty.annotation_names());
                self.build_type_var(cx, *var, annotations)
            }
            Type::Wildcard(bound) => {
                let key = (ty.clone(), type_param);
                if let Some(existing) = cx.wildcards.get(&key) {
                    return Ok(*existing);
                }
                let id = self.create(ty, false, type_param);
                cx.wildcards.insert(key, id);
                let (extends, super_) = self.wildcard_bounds(cx, bound, type_param)?;
                self.store_bounds(id, extends, super_);
                Ok(id)
            }
            Type::Intersection(parts) => {
                if let Some(existing) = cx.intersections.get(ty) {
                    return Ok(*existing);
                }
                let id = self.create(ty, false, None);
                cx.intersections.insert(ty.clone(), id);
                let mut bounds = Vec::with_capacity(parts.len());
                for (i, part) in parts.iter().enumerate() {
                    bounds.push(self.build_step(cx, part, BoundStep::IntersectionBranch(i), None)?);
                }
                if let AtmData::Intersection { bounds: slot } = &mut self.arena[id].data {
                    *slot = Lazy::Computed(bounds);
                }
                Ok(id)
            }
            Type::Class(ct) => {
                let id = self.create(ty, false, None);
                let enclosing = match &ct.enclosing {
                    Some(outer) => Some(self.build_step(cx, outer, BoundStep::Enclosing, None)?),
                    None => None,
                };
                if let AtmData::Declared { enclosing: slot, .. } = &mut self.arena[id].data {
                    *slot = Lazy::Computed(enclosing);
                }
                // Raw references keep their arguments lazy: they become
                // uninferred wildcards on first access.
                if ct.args.is_empty() {
                    return Ok(id);
                }
                let params = self
                    .env()
                    .class(ct.def)
                    .ok_or(FrameworkError::UnknownClass(ct.def))?
                    .type_params
                    .clone();
                if params.len() != ct.args.len() {
                    return Err(FrameworkError::ArgumentCountMismatch {
                        left: format_type(self.env(), peeled),
                        right: format!("{} type parameters", params.len()),
                    });
                }
                let mut args = Vec::with_capacity(ct.args.len());
                for (i, (arg, param)) in ct.args.iter().zip(&params).enumerate() {
                    args.push(self.build_step(cx, arg, BoundStep::TypeArg(i), Some(*param))?);
                }
                if let AtmData::Declared { args: slot, .. } = &mut self.arena[id].data {
                    *slot = Lazy::Computed(args);
                }
                Ok(id)
            }
            Type::Array(component) => {
                let id = self.create(ty, false, None);
                let built = self.build_step(cx, component, BoundStep::Component, None)?;
                self.set_component_type(id, built)?;
                Ok(id)
            }
            Type::Union(alts) => {
                let id = self.create(ty, false, None);
                let mut alternatives = Vec::with_capacity(alts.len());
                for (i, alt) in alts.iter().enumerate() {
                    let step = BoundStep::UnionAlternative(i);
                    alternatives.push(self.build_step(cx, alt, step, None)?);
                }
                if let AtmData::Union { alternatives: slot } = &mut self.arena[id].data {
                    *slot = Lazy::Computed(alternatives);
                }
                Ok(id)
            }
            Type::Null => Ok(self.create(ty, false, None)),
            // Primitive array components are the one legal non-reference.
            Type::Primitive(_) if cx.path.last() == Some(&BoundStep::Component) => {
                Ok(self.create(ty, false, None))
            }
            Type::Primitive(_) | Type::Void | Type::Executable(_) | Type::Annotated(..) => {
                Err(FrameworkError::InvalidBound {
                    ty: format_type(self.env(), ty),
                    path: format_path(&cx.path),
                })
            }
        }
    }

    fn build_step(
        &mut self,
        cx: &mut BoundsContext,
        ty: &Type,
        step: BoundStep,
        type_param: Option<TypeVarId>,
    ) -> TypeResult<AtmId> {
        cx.path.push(step);
        let built = self.build(cx, ty, type_param);
        cx.path.pop();
        built
    }

    fn build_type_var(
        &mut self,
        cx: &mut BoundsContext,
        var: TypeVarId,
        annotations: AnnotationSet,
    ) -> TypeResult<AtmId> {
        let template = self.ensure_template(cx, var)?;
        if annotations.is_empty() && cx.frames.contains(&var) {
            return Ok(template);
        }
        let mut node = AtmNode::new(
            Type::type_var(var),
            AtmData::TypeVariable {
                var,
                upper: Lazy::Uncomputed,
                lower: Lazy::Uncomputed,
            },
        );
        node.annotations = annotations;
        let placeholder = self.arena.alloc(node);
        cx.placeholders.push(Placeholder {
            node: placeholder,
            var,
        });
        Ok(placeholder)
    }

    /// Fill every placeholder with a copy of its variable's template, then
    /// reapply the annotations written on the occurrence.
    fn resolve_placeholders(&mut self, cx: &mut BoundsContext) -> TypeResult<()> {
        for placeholder in std::mem::take(&mut cx.placeholders) {
            let Some(template) = cx.templates.get(&placeholder.var).copied() else {
                continue;
            };
            let written = self.arena[placeholder.node].annotations.clone();
            let mode = CopyMode::StructureAndAnnotations;
            self.copy_into(template, placeholder.node, mode)?;
            debug_assert_eq!(self.kind(placeholder.node), AtmKind::TypeVariable);
            if !written.is_empty() {
                self.set_primary_and_sync_bounds(placeholder.node, written);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/bounds_tests.rs"]
mod tests;
