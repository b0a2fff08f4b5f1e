//! Supertypes and as-super conversion for annotated types.
//!
//! Host-level supertype search happens on erased classes; annotated type
//! arguments are carried along by substituting the subtype's argument nodes
//! for the declaration's type variables.

use crate::atm::{AtmData, AtmFlags, AtmId, AtmKind, CopyMode, Lazy};
use crate::error::{FrameworkError, TypeResult};
use crate::factory::AnnotatedTypeFactory;
use crate::recursion::{DepthCounter, RecursionProfile};
use rustc_hash::FxHashMap;
use tqual_host::{
    Type, TypeVarId, WildcardBound, boxed_class, erasure, is_erased_subtype, is_raw,
    map_type_argument_indices, unboxed_primitive,
};
use tracing::trace;

impl<'env> AnnotatedTypeFactory<'env> {
    /// Direct supertypes of a declared type with its type arguments
    /// substituted in. Each supertype carries the primaries of `id`.
    ///
    /// A raw type yields raw supertypes whose argument lists are explicitly
    /// empty.
    pub fn direct_supertypes(&mut self, id: AtmId) -> TypeResult<Vec<AtmId>> {
        let AtmData::Declared { class, .. } = self.arena[id].data else {
            return Err(FrameworkError::UnexpectedKind {
                op: "direct_supertypes",
                expected: "declared",
                found: self.kind(id),
            });
        };
        let env = self.env();
        let def = env.class(class).ok_or(FrameworkError::UnknownClass(class))?;
        let object = env.well_known().object;
        let mut declared: Vec<Type> = def.supertypes().cloned().collect();
        if declared.is_empty() && class != object {
            declared.push(Type::class(object, Vec::new()));
        }

        let raw = self.was_raw(id)
            && self
                .underlying(id)
                .as_class()
                .is_some_and(|ct| ct.args.is_empty());
        let mut out = Vec::with_capacity(declared.len());
        if raw {
            for sup in &declared {
                let erased = erasure(env, sup);
                let node = self.create(&erased, false, None);
                if let AtmData::Declared { args, .. } = &mut self.arena[node].data {
                    *args = Lazy::Computed(Vec::new());
                }
                out.push(node);
            }
        } else {
            let args = self.type_arguments(id)?;
            let map: FxHashMap<TypeVarId, AtmId> =
                def.type_params.iter().copied().zip(args).collect();
            for sup in &declared {
                out.push(self.substituted(sup, &map)?);
            }
        }

        let primaries = self.annotations(id).clone();
        for sup in &out {
            self.replace_annotations(*sup, &primaries);
        }
        Ok(out)
    }

    /// Annotated type for host type `ty` with type variables replaced by
    /// copies of the mapped nodes.
    pub(crate) fn substituted(
        &mut self,
        ty: &Type,
        map: &FxHashMap<TypeVarId, AtmId>,
    ) -> TypeResult<AtmId> {
        let written = self.qualifiers_for(ty.annotation_names());
        let peeled = ty.peel();
        if let Type::TypeVar(var) = peeled {
            if let Some(&arg) = map.get(var) {
                let copy = self.deep_copy(arg, CopyMode::StructureAndAnnotations)?;
                let use_ = self.as_use(copy)?;
                if !written.is_empty() {
                    self.replace_annotations(use_, &written);
                }
                return Ok(use_);
            }
        }
        let id = match peeled {
            Type::Class(ct) if !ct.args.is_empty() => {
                let id = self.create(ty, false, None);
                let params = self
                    .env()
                    .class(ct.def)
                    .map(|d| d.type_params.clone())
                    .unwrap_or_default();
                let mut args = Vec::with_capacity(ct.args.len());
                for (i, arg) in ct.args.iter().enumerate() {
                    let node = self.substituted_arg(arg, params.get(i).copied(), map)?;
                    args.push(node);
                }
                self.set_type_arguments(id, args)?;
                id
            }
            Type::Array(component) => {
                let id = self.create(ty, false, None);
                let component = self.substituted(component, map)?;
                self.set_component_type(id, component)?;
                id
            }
            _ => self.create(ty, false, None),
        };
        Ok(id)
    }

    fn substituted_arg(
        &mut self,
        arg: &Type,
        param: Option<TypeVarId>,
        map: &FxHashMap<TypeVarId, AtmId>,
    ) -> TypeResult<AtmId> {
        let Type::Wildcard(bound) = arg.peel() else {
            return self.substituted(arg, map);
        };
        let id = self.create(arg, false, param);
        match bound {
            // The extends bound comes from the declared parameter; leave it lazy.
            WildcardBound::Unbounded => {}
            WildcardBound::Extends(b) => {
                let extends = self.substituted(b, map)?;
                let super_ = self.create(&Type::Null, false, None);
                let bottoms = self.hierarchy().bottom_annotations().to_vec();
                self.add_missing_annotations(super_, bottoms);
                self.set_lower_bound(id, super_)?;
                self.set_upper_bound(id, extends)?;
            }
            WildcardBound::Super(b) => {
                let super_ = self.substituted(b, map)?;
                self.set_lower_bound(id, super_)?;
                let extends = match param.and_then(|p| self.env().type_param(p)) {
                    Some(def) => def.upper_bound(self.env()),
                    None => Type::class(self.env().well_known().object, Vec::new()),
                };
                let extends = self.substituted(&extends, map)?;
                let tops = self.hierarchy().top_annotations().to_vec();
                self.add_missing_annotations(extends, tops);
                self.set_upper_bound(id, extends)?;
            }
        }
        Ok(id)
    }

    /// View `id` as an instance of the type of `sup`, carrying the
    /// primaries of `id` along. The result is a fresh node.
    pub fn as_super(&mut self, id: AtmId, sup: AtmId) -> TypeResult<AtmId> {
        let mut depth = DepthCounter::with_profile(RecursionProfile::AsSuper);
        let result = self.as_super_inner(id, sup, &mut depth)?;
        let primaries = self.annotations(id).clone();
        if !primaries.is_empty() {
            self.replace_annotations(result, &primaries);
        }
        Ok(result)
    }

    fn as_super_inner(
        &mut self,
        id: AtmId,
        sup: AtmId,
        depth: &mut DepthCounter,
    ) -> TypeResult<AtmId> {
        depth.enter_or_fail(RecursionProfile::AsSuper)?;
        let result = self.as_super_step(id, sup, depth);
        depth.leave();
        result
    }

    fn as_super_step(
        &mut self,
        id: AtmId,
        sup: AtmId,
        depth: &mut DepthCounter,
    ) -> TypeResult<AtmId> {
        let env = self.env();
        match (self.kind(id), self.kind(sup)) {
            (AtmKind::Null, _) => self.deep_copy(id, CopyMode::StructureAndAnnotations),

            (_, AtmKind::TypeVariable) if self.same_type_var(id, sup) => {
                self.deep_copy(id, CopyMode::StructureAndAnnotations)
            }
            (AtmKind::Wildcard, AtmKind::Wildcard) => {
                self.deep_copy(id, CopyMode::StructureAndAnnotations)
            }
            (_, AtmKind::TypeVariable | AtmKind::Wildcard) => {
                let upper = self.upper_bound(sup)?;
                self.as_super_inner(id, upper, depth)
            }

            (AtmKind::TypeVariable | AtmKind::Wildcard, _) => {
                let upper = self.upper_bound(id)?;
                let result = self.as_super_inner(upper, sup, depth)?;
                self.copy_primaries(id, result);
                Ok(result)
            }

            (AtmKind::Intersection, _) => {
                let target = self.underlying(sup).clone();
                for bound in self.intersection_bounds(id)? {
                    if is_erased_subtype(env, self.underlying(bound), &target) {
                        let result = self.as_super_inner(bound, sup, depth)?;
                        self.copy_primaries(id, result);
                        return Ok(result);
                    }
                }
                Err(self.not_erased_subtype(id, sup))
            }

            (AtmKind::Union, _) => {
                let result = self.create(&erasure(env, self.underlying(sup)), false, None);
                self.copy_primaries(id, result);
                Ok(result)
            }

            (AtmKind::Declared, AtmKind::Declared) => {
                let (sub_class, sup_class) = (self.declared_class(id), self.declared_class(sup));
                if sub_class == sup_class {
                    return self.deep_copy(id, CopyMode::StructureAndAnnotations);
                }
                let target = self.underlying(sup).clone();
                for direct in self.direct_supertypes(id)? {
                    if is_erased_subtype(env, self.underlying(direct), &target) {
                        return self.as_super_inner(direct, sup, depth);
                    }
                }
                Err(self.not_erased_subtype(id, sup))
            }

            (AtmKind::Declared, AtmKind::Primitive) => {
                let unboxed = self
                    .declared_class(id)
                    .and_then(|class| unboxed_primitive(env, class))
                    .ok_or_else(|| self.not_erased_subtype(id, sup))?;
                let result = self.create(&Type::Primitive(unboxed), false, None);
                self.copy_primaries(id, result);
                Ok(result)
            }

            (AtmKind::Primitive, AtmKind::Declared) => {
                let AtmData::Primitive(prim) = self.arena[id].data else {
                    return Err(self.not_erased_subtype(id, sup));
                };
                let boxed_ty = Type::class(boxed_class(env, prim), Vec::new());
                let boxed = self.create(&boxed_ty, false, None);
                self.copy_primaries(id, boxed);
                self.as_super_inner(boxed, sup, depth)
            }

            (AtmKind::Primitive, AtmKind::Primitive) => {
                let result = self.create(&self.underlying(sup).clone(), false, None);
                self.copy_primaries(id, result);
                Ok(result)
            }

            (AtmKind::Array, AtmKind::Array) => {
                let result = self.deep_copy(id, CopyMode::StructureAndAnnotations)?;
                let component = self.component_type(result)?;
                let sup_component = self.component_type(sup)?;
                let both_reference = self.underlying(component).is_reference()
                    && self.underlying(sup_component).is_reference();
                if both_reference && self.kind(sup_component) != AtmKind::Wildcard {
                    let converted = self.as_super_inner(component, sup_component, depth)?;
                    self.set_component_type(result, converted)?;
                }
                Ok(result)
            }

            (AtmKind::Array, AtmKind::Declared) => {
                let wk = env.well_known();
                let allowed = self
                    .declared_class(sup)
                    .is_some_and(|c| c == wk.object || c == wk.cloneable || c == wk.serializable);
                if !allowed {
                    return Err(self.not_erased_subtype(id, sup));
                }
                let result = self.create(&erasure(env, self.underlying(sup)), false, None);
                self.copy_primaries(id, result);
                Ok(result)
            }

            (_, _) if self.kind(id) == self.kind(sup) => {
                self.deep_copy(id, CopyMode::StructureAndAnnotations)
            }

            _ => Err(self.not_erased_subtype(id, sup)),
        }
    }

    /// [`as_super`](Self::as_super) followed by raw-type argument recovery.
    ///
    /// The null type is special: it becomes a copy of `sup` carrying the
    /// primaries of `id`.
    pub fn casted_as_super(&mut self, id: AtmId, sup: AtmId) -> TypeResult<AtmId> {
        if self.kind(id) == AtmKind::Null {
            let copy = self.deep_copy(sup, CopyMode::StructureAndAnnotations)?;
            let primaries = self.annotations(id).clone();
            self.replace_annotations(copy, &primaries);
            return Ok(copy);
        }
        let result = self.as_super(id, sup)?;
        self.fix_up_raw_types(id, result, sup)?;
        Ok(result)
    }

    /// When as-super crossed a raw reference and lost the arguments `sup`
    /// has, recover them from the original subtype through the
    /// type-parameter correspondence of the two declarations.
    fn fix_up_raw_types(&mut self, original: AtmId, as_super: AtmId, sup: AtmId) -> TypeResult<()> {
        if self.kind(as_super) != AtmKind::Declared
            || self.kind(sup) != AtmKind::Declared
            || self.kind(original) != AtmKind::Declared
        {
            return Ok(());
        }
        if !is_raw(self.env(), self.underlying(as_super))
            || !self.type_arguments(as_super)?.is_empty()
            || self.type_arguments(sup)?.is_empty()
        {
            return Ok(());
        }
        let (Some(sub_class), Some(sup_class)) =
            (self.declared_class(original), self.declared_class(sup))
        else {
            return Ok(());
        };
        let mapping = map_type_argument_indices(self.env(), sub_class, sup_class);
        let original_args = self.type_arguments(original)?;
        if mapping.len() != original_args.len() {
            return Ok(());
        }
        let sup_arg_count = self.type_arguments(sup)?.len();
        let recovered = if mapping.len() == sup_arg_count {
            mapping
                .iter()
                .filter_map(|(from, _)| original_args.get(*from).copied())
                .collect()
        } else {
            Vec::new()
        };
        trace!(recovered = recovered.len(), "recovered raw type arguments");
        self.set_type_arguments(as_super, recovered)?;
        self.arena[as_super].flags.remove(AtmFlags::WAS_RAW);
        Ok(())
    }

    pub(crate) fn declared_class(&self, id: AtmId) -> Option<tqual_host::ClassId> {
        match self.arena[id].data {
            AtmData::Declared { class, .. } => Some(class),
            _ => None,
        }
    }

    fn same_type_var(&self, a: AtmId, b: AtmId) -> bool {
        let (Some(va), Some(vb)) = (self.arena[a].type_var(), self.arena[b].type_var()) else {
            return false;
        };
        va == vb
    }

    fn copy_primaries(&mut self, from: AtmId, to: AtmId) {
        let primaries = self.annotations(from).clone();
        if !primaries.is_empty() {
            self.replace_annotations(to, &primaries);
        }
    }

    fn not_erased_subtype(&self, sub: AtmId, sup: AtmId) -> FrameworkError {
        FrameworkError::NotErasedSubtype {
            sub: self.format(sub),
            sup: self.format(sup),
        }
    }
}
