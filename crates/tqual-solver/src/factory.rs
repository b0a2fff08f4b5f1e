//! The annotated type factory.
//!
//! One factory is one type-checking session: it owns the node arena, the
//! qualifier hierarchy, the configuration and the declaration caches.
//! Every operation on annotated types is a method on the factory taking
//! [`AtmId`] handles; the operations are split across modules as separate
//! `impl` blocks (`bounds`, `copy`, `as_super`, `effective`, `equality`,
//! `format`, `hash`, `rawness`, `subtype`).

use crate::annotations::{AnnotationSet, QualifierId};
use crate::atm::{AtmArena, AtmData, AtmFlags, AtmId, AtmKind, AtmNode, Lazy};
use crate::config::FactoryConfig;
use crate::error::{ConfigError, FrameworkError, TypeResult};
use crate::format::{AtmFormatter, DefaultAtmFormatter};
use crate::hierarchy::QualifierHierarchy;
use rustc_hash::{FxHashMap, FxHashSet};
use tqual_host::{ClassId, Type, TypeEnv, TypeVarId, WildcardBound};
use tracing::trace;

pub struct AnnotatedTypeFactory<'env> {
    env: &'env dyn TypeEnv,
    hierarchy: Box<dyn QualifierHierarchy + 'env>,
    config: FactoryConfig,
    pub(crate) arena: AtmArena,
    class_decls: FxHashMap<ClassId, AtmId>,
    type_param_decls: FxHashMap<TypeVarId, AtmId>,
    pub(crate) formatter: Box<dyn AtmFormatter + 'env>,
}

impl<'env> AnnotatedTypeFactory<'env> {
    /// Create a session. Fails if an alias names a qualifier the hierarchy
    /// does not know.
    pub fn new(
        env: &'env dyn TypeEnv,
        hierarchy: impl QualifierHierarchy + 'env,
        config: FactoryConfig,
    ) -> Result<Self, ConfigError> {
        for (alias, canonical) in &config.aliases {
            if hierarchy.qualifier_by_name(canonical).is_none() {
                return Err(ConfigError::UnknownQualifier {
                    name: canonical.clone(),
                    referenced_by: alias.clone(),
                });
            }
        }
        Ok(Self {
            env,
            hierarchy: Box::new(hierarchy),
            config,
            arena: AtmArena::with_capacity(64),
            class_decls: FxHashMap::default(),
            type_param_decls: FxHashMap::default(),
            formatter: Box::new(DefaultAtmFormatter::default()),
        })
    }

    pub fn env(&self) -> &'env dyn TypeEnv {
        self.env
    }

    pub fn hierarchy(&self) -> &dyn QualifierHierarchy {
        self.hierarchy.as_ref()
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn arena(&self) -> &AtmArena {
        &self.arena
    }

    #[inline]
    pub fn node(&self, id: AtmId) -> &AtmNode {
        &self.arena[id]
    }

    #[inline]
    pub fn kind(&self, id: AtmId) -> AtmKind {
        self.arena[id].kind()
    }

    pub fn underlying(&self, id: AtmId) -> &Type {
        &self.arena[id].underlying
    }

    /// Drop the declaration caches. Nodes already handed out stay valid.
    pub fn clear_caches(&mut self) {
        self.class_decls.clear();
        self.type_param_decls.clear();
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Annotated type for a use of `ty`.
    pub fn from_type(&mut self, ty: &Type) -> AtmId {
        self.create(ty, false, None)
    }

    /// Annotated type for `ty`, marked as a declaration when `is_declaration`.
    pub fn from_type_with(&mut self, ty: &Type, is_declaration: bool) -> AtmId {
        self.create(ty, is_declaration, None)
    }

    /// The generic declaration `class C<T1, .., Tn>` as a declared type whose
    /// arguments are the declared type variables. Returns a fresh copy of a
    /// cached node.
    pub fn from_class_declaration(&mut self, class: ClassId) -> TypeResult<AtmId> {
        let cached = match self.class_decls.get(&class) {
            Some(id) => *id,
            None => {
                let def = self.env.class(class).ok_or(FrameworkError::UnknownClass(class))?;
                let args = def.type_params.iter().copied().map(Type::type_var).collect();
                let id = self.create(&Type::class(class, args), true, None);
                self.class_decls.insert(class, id);
                id
            }
        };
        self.deep_copy(cached, crate::atm::CopyMode::StructureAndAnnotations)
    }

    /// The declaration of type parameter `var`. Returns a fresh copy of a
    /// cached node.
    pub fn from_type_param(&mut self, var: TypeVarId) -> TypeResult<AtmId> {
        if self.env.type_param(var).is_none() {
            return Err(FrameworkError::UnknownTypeParam(var));
        }
        let cached = match self.type_param_decls.get(&var) {
            Some(id) => *id,
            None => {
                let id = self.create(&Type::type_var(var), true, None);
                self.type_param_decls.insert(var, id);
                id
            }
        };
        self.deep_copy(cached, crate::atm::CopyMode::StructureAndAnnotations)
    }

    /// Build a node for `ty` with every child left uncomputed.
    pub(crate) fn create(
        &mut self,
        ty: &Type,
        is_declaration: bool,
        type_param: Option<TypeVarId>,
    ) -> AtmId {
        let annotations = self.qualifiers_for(ty.annotation_names());
        let peeled = ty.peel();
        let mut flags = AtmFlags::empty();
        let data = match peeled {
            Type::Class(ct) => {
                if tqual_host::is_raw(self.env, peeled) && !is_declaration {
                    flags |= AtmFlags::WAS_RAW;
                }
                AtmData::Declared {
                    class: ct.def,
                    args: Lazy::Uncomputed,
                    enclosing: Lazy::Uncomputed,
                }
            }
            Type::Array(_) => AtmData::Array {
                component: Lazy::Uncomputed,
            },
            Type::TypeVar(var) => AtmData::TypeVariable {
                var: *var,
                upper: Lazy::Uncomputed,
                lower: Lazy::Uncomputed,
            },
            Type::Wildcard(_) => AtmData::Wildcard {
                type_param,
                extends: Lazy::Uncomputed,
                super_: Lazy::Uncomputed,
            },
            Type::Primitive(p) => AtmData::Primitive(*p),
            Type::Null => AtmData::Null,
            // peel() never returns a wrapper
            Type::Void | Type::Annotated(..) => AtmData::NoType,
            Type::Intersection(_) => AtmData::Intersection {
                bounds: Lazy::Uncomputed,
            },
            Type::Union(_) => AtmData::Union {
                alternatives: Lazy::Uncomputed,
            },
            Type::Executable(_) => AtmData::Executable {
                type_vars: Lazy::Uncomputed,
                params: Lazy::Uncomputed,
                return_type: Lazy::Uncomputed,
                receiver: Lazy::Uncomputed,
                thrown: Lazy::Uncomputed,
            },
        };
        if is_declaration && matches!(peeled, Type::Class(_) | Type::TypeVar(_)) {
            flags |= AtmFlags::DECLARATION;
        }

        let mut node = AtmNode::new(peeled.clone(), data);
        node.flags = flags;
        node.annotations = annotations;
        self.arena.alloc(node)
    }

    /// Canonical qualifiers for annotation names. Unsupported names are
    /// dropped; a later name replaces an earlier one in the same
    /// sub-hierarchy.
    pub(crate) fn qualifiers_for<I>(&self, names: I) -> AnnotationSet
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut set = AnnotationSet::new();
        for name in names {
            let name = name.as_ref();
            let Some(q) = self.resolve_qualifier(name) else {
                trace!(name, "dropping unsupported annotation");
                continue;
            };
            self.insert_replacing(&mut set, q);
        }
        set
    }

    /// Alias table first, then the hierarchy.
    pub fn resolve_qualifier(&self, name: &str) -> Option<QualifierId> {
        let canonical = self
            .config
            .aliases
            .get(name)
            .map(String::as_str)
            .unwrap_or(name);
        self.hierarchy
            .qualifier_by_name(canonical)
            .filter(|q| self.hierarchy.is_supported(*q))
    }

    pub fn is_supported_qualifier(&self, name: &str) -> bool {
        self.resolve_qualifier(name).is_some()
    }

    fn insert_replacing(&self, set: &mut AnnotationSet, q: QualifierId) {
        let top = self.hierarchy.top_of(q);
        set.retain(|existing| self.hierarchy.top_of(*existing) != top);
        set.insert(q);
    }

    // =========================================================================
    // Lazy children
    // =========================================================================

    fn unexpected(&self, op: &'static str, expected: &'static str, id: AtmId) -> FrameworkError {
        FrameworkError::UnexpectedKind {
            op,
            expected,
            found: self.kind(id),
        }
    }

    /// Type arguments of a declared type.
    ///
    /// A declaration yields its declared type variables; a raw use yields one
    /// uninferred wildcard per type parameter.
    pub fn type_arguments(&mut self, id: AtmId) -> TypeResult<Vec<AtmId>> {
        let AtmData::Declared { class, args, .. } = &self.arena[id].data else {
            return Err(self.unexpected("type_arguments", "declared", id));
        };
        if let Some(args) = args.cloned() {
            return Ok(args);
        }
        let class = *class;
        let def = self.env.class(class).ok_or(FrameworkError::UnknownClass(class))?;
        let params = def.type_params.clone();
        let node = &self.arena[id];
        let written: Vec<Type> = node
            .underlying
            .as_class()
            .map(|ct| ct.args.clone())
            .unwrap_or_default();

        let computed: Vec<AtmId> = if node.is_declaration() {
            params
                .iter()
                .map(|p| self.create(&Type::type_var(*p), true, None))
                .collect()
        } else if written.is_empty() {
            params.iter().map(|p| self.uninferred_wildcard(*p)).collect()
        } else {
            if written.len() != params.len() {
                return Err(FrameworkError::ArgumentCountMismatch {
                    left: self.format(id),
                    right: format!("{} type parameters", params.len()),
                });
            }
            written
                .iter()
                .zip(&params)
                .map(|(arg, p)| self.create(arg, false, Some(*p)))
                .collect()
        };
        self.store_type_arguments(id, computed.clone());
        Ok(computed)
    }

    pub fn set_type_arguments(&mut self, id: AtmId, new_args: Vec<AtmId>) -> TypeResult<()> {
        if self.kind(id) != AtmKind::Declared {
            return Err(self.unexpected("set_type_arguments", "declared", id));
        }
        self.store_type_arguments(id, new_args);
        Ok(())
    }

    fn store_type_arguments(&mut self, id: AtmId, new_args: Vec<AtmId>) {
        if let AtmData::Declared { args, .. } = &mut self.arena[id].data {
            *args = Lazy::Computed(new_args);
        }
    }

    /// Enclosing type of a nested declared type.
    pub fn enclosing_type(&mut self, id: AtmId) -> TypeResult<Option<AtmId>> {
        let AtmData::Declared { enclosing, .. } = &self.arena[id].data else {
            return Err(self.unexpected("enclosing_type", "declared", id));
        };
        if let Some(enclosing) = enclosing.cloned() {
            return Ok(enclosing);
        }
        let outer = self.arena[id]
            .underlying
            .as_class()
            .and_then(|ct| ct.enclosing.as_deref().cloned());
        let is_declaration = self.arena[id].is_declaration();
        let computed = outer.map(|ty| self.create(&ty, is_declaration, None));
        if let AtmData::Declared { enclosing, .. } = &mut self.arena[id].data {
            *enclosing = Lazy::Computed(computed);
        }
        Ok(computed)
    }

    pub fn component_type(&mut self, id: AtmId) -> TypeResult<AtmId> {
        let AtmData::Array { component } = &self.arena[id].data else {
            return Err(self.unexpected("component_type", "array", id));
        };
        if let Some(component) = component.cloned() {
            return Ok(component);
        }
        let element = match &self.arena[id].underlying {
            Type::Array(element) => (**element).clone(),
            _ => return Err(self.unexpected("component_type", "array", id)),
        };
        let computed = self.create(&element, false, None);
        self.set_component_type(id, computed)?;
        Ok(computed)
    }

    pub fn set_component_type(&mut self, id: AtmId, new_component: AtmId) -> TypeResult<()> {
        if self.kind(id) != AtmKind::Array {
            return Err(self.unexpected("set_component_type", "array", id));
        }
        if let AtmData::Array { component } = &mut self.arena[id].data {
            *component = Lazy::Computed(new_component);
        }
        Ok(())
    }

    /// Upper bound of a type variable, or extends bound of a wildcard.
    pub fn upper_bound(&mut self, id: AtmId) -> TypeResult<AtmId> {
        self.ensure_bounds(id)?;
        match &self.arena[id].data {
            AtmData::TypeVariable {
                upper: Lazy::Computed(b),
                ..
            }
            | AtmData::Wildcard {
                extends: Lazy::Computed(b),
                ..
            } => Ok(*b),
            _ => Err(self.unexpected("upper_bound", "type variable or wildcard", id)),
        }
    }

    /// Lower bound of a type variable, or super bound of a wildcard.
    pub fn lower_bound(&mut self, id: AtmId) -> TypeResult<AtmId> {
        self.ensure_bounds(id)?;
        match &self.arena[id].data {
            AtmData::TypeVariable {
                lower: Lazy::Computed(b),
                ..
            }
            | AtmData::Wildcard {
                super_: Lazy::Computed(b),
                ..
            } => Ok(*b),
            _ => Err(self.unexpected("lower_bound", "type variable or wildcard", id)),
        }
    }

    pub fn extends_bound(&mut self, id: AtmId) -> TypeResult<AtmId> {
        if self.kind(id) != AtmKind::Wildcard {
            return Err(self.unexpected("extends_bound", "wildcard", id));
        }
        self.upper_bound(id)
    }

    pub fn super_bound(&mut self, id: AtmId) -> TypeResult<AtmId> {
        if self.kind(id) != AtmKind::Wildcard {
            return Err(self.unexpected("super_bound", "wildcard", id));
        }
        self.lower_bound(id)
    }

    /// Run the bounds initializer on first access, then push primaries into
    /// the fresh bounds.
    fn ensure_bounds(&mut self, id: AtmId) -> TypeResult<()> {
        let computed = match &self.arena[id].data {
            AtmData::TypeVariable { upper, lower, .. } => {
                upper.is_computed() && lower.is_computed()
            }
            AtmData::Wildcard { extends, super_, .. } => {
                extends.is_computed() && super_.is_computed()
            }
            _ => return Err(self.unexpected("bounds", "type variable or wildcard", id)),
        };
        if !computed {
            self.initialize_bounds(id)?;
            self.sync_bounds(id);
        }
        Ok(())
    }

    pub fn set_upper_bound(&mut self, id: AtmId, bound: AtmId) -> TypeResult<()> {
        if !self.kind(id).is_bounded() {
            return Err(self.unexpected("set_upper_bound", "type variable or wildcard", id));
        }
        if let AtmData::TypeVariable { upper: slot, .. } | AtmData::Wildcard { extends: slot, .. } =
            &mut self.arena[id].data
        {
            *slot = Lazy::Computed(bound);
        }
        self.sync_bounds(id);
        Ok(())
    }

    pub fn set_lower_bound(&mut self, id: AtmId, bound: AtmId) -> TypeResult<()> {
        if !self.kind(id).is_bounded() {
            return Err(self.unexpected("set_lower_bound", "type variable or wildcard", id));
        }
        if let AtmData::TypeVariable { lower: slot, .. } | AtmData::Wildcard { super_: slot, .. } =
            &mut self.arena[id].data
        {
            *slot = Lazy::Computed(bound);
        }
        self.sync_bounds(id);
        Ok(())
    }

    /// Conjuncts of an intersection.
    pub fn intersection_bounds(&mut self, id: AtmId) -> TypeResult<Vec<AtmId>> {
        let AtmData::Intersection { bounds } = &self.arena[id].data else {
            return Err(self.unexpected("intersection_bounds", "intersection", id));
        };
        if let Some(bounds) = bounds.cloned() {
            return Ok(bounds);
        }
        let parts = match &self.arena[id].underlying {
            Type::Intersection(parts) => parts.clone(),
            _ => Vec::new(),
        };
        let computed: Vec<AtmId> = parts.iter().map(|p| self.create(p, false, None)).collect();
        if let AtmData::Intersection { bounds } = &mut self.arena[id].data {
            *bounds = Lazy::Computed(computed.clone());
        }
        self.sync_bounds(id);
        Ok(computed)
    }

    /// Alternatives of a union.
    pub fn union_alternatives(&mut self, id: AtmId) -> TypeResult<Vec<AtmId>> {
        let AtmData::Union { alternatives } = &self.arena[id].data else {
            return Err(self.unexpected("union_alternatives", "union", id));
        };
        if let Some(alternatives) = alternatives.cloned() {
            return Ok(alternatives);
        }
        let alts = match &self.arena[id].underlying {
            Type::Union(alts) => alts.clone(),
            _ => Vec::new(),
        };
        let computed: Vec<AtmId> = alts.iter().map(|a| self.create(a, false, None)).collect();
        if let AtmData::Union { alternatives } = &mut self.arena[id].data {
            *alternatives = Lazy::Computed(computed.clone());
        }
        Ok(computed)
    }

    // -------------------------------------------------------------------------
    // Executable children
    // -------------------------------------------------------------------------

    fn method_type(&self, id: AtmId, op: &'static str) -> TypeResult<tqual_host::MethodType> {
        match &self.arena[id].underlying {
            Type::Executable(m) => Ok((**m).clone()),
            _ => Err(self.unexpected(op, "executable", id)),
        }
    }

    /// Computes every executable child at once on first access.
    fn ensure_executable(&mut self, id: AtmId, op: &'static str) -> TypeResult<()> {
        let AtmData::Executable { params, .. } = &self.arena[id].data else {
            return Err(self.unexpected(op, "executable", id));
        };
        if params.is_computed() {
            return Ok(());
        }
        let method = self.method_type(id, op)?;
        let type_vars_new: Vec<AtmId> = method
            .type_params
            .iter()
            .map(|v| self.create(&Type::type_var(*v), true, None))
            .collect();
        let params_new: Vec<AtmId> = method
            .params
            .iter()
            .map(|p| self.create(p, false, None))
            .collect();
        let return_new = self.create(&method.return_type, false, None);
        let receiver_new = method.receiver.as_ref().map(|r| self.create(r, false, None));
        let thrown_new: Vec<AtmId> = method
            .thrown
            .iter()
            .map(|t| self.create(t, false, None))
            .collect();
        self.arena[id].data = AtmData::Executable {
            type_vars: Lazy::Computed(type_vars_new),
            params: Lazy::Computed(params_new),
            return_type: Lazy::Computed(return_new),
            receiver: Lazy::Computed(receiver_new),
            thrown: Lazy::Computed(thrown_new),
        };
        Ok(())
    }

    pub fn parameter_types(&mut self, id: AtmId) -> TypeResult<Vec<AtmId>> {
        self.ensure_executable(id, "parameter_types")?;
        match &self.arena[id].data {
            AtmData::Executable { params, .. } => Ok(params.cloned().unwrap_or_default()),
            _ => Err(self.unexpected("parameter_types", "executable", id)),
        }
    }

    pub fn return_type(&mut self, id: AtmId) -> TypeResult<AtmId> {
        self.ensure_executable(id, "return_type")?;
        match &self.arena[id].data {
            AtmData::Executable {
                return_type: Lazy::Computed(r),
                ..
            } => Ok(*r),
            _ => Err(self.unexpected("return_type", "executable", id)),
        }
    }

    /// `None` for static methods and top-level constructors.
    pub fn receiver_type(&mut self, id: AtmId) -> TypeResult<Option<AtmId>> {
        self.ensure_executable(id, "receiver_type")?;
        match &self.arena[id].data {
            AtmData::Executable { receiver, .. } => Ok(receiver.cloned().flatten()),
            _ => Err(self.unexpected("receiver_type", "executable", id)),
        }
    }

    pub fn thrown_types(&mut self, id: AtmId) -> TypeResult<Vec<AtmId>> {
        self.ensure_executable(id, "thrown_types")?;
        match &self.arena[id].data {
            AtmData::Executable { thrown, .. } => Ok(thrown.cloned().unwrap_or_default()),
            _ => Err(self.unexpected("thrown_types", "executable", id)),
        }
    }

    pub fn executable_type_variables(&mut self, id: AtmId) -> TypeResult<Vec<AtmId>> {
        self.ensure_executable(id, "executable_type_variables")?;
        match &self.arena[id].data {
            AtmData::Executable { type_vars, .. } => Ok(type_vars.cloned().unwrap_or_default()),
            _ => Err(self.unexpected("executable_type_variables", "executable", id)),
        }
    }

    // =========================================================================
    // Primary annotations
    // =========================================================================

    pub fn annotations(&self, id: AtmId) -> &AnnotationSet {
        &self.arena[id].annotations
    }

    /// The primary qualifier in the sub-hierarchy of `top`.
    pub fn annotation_in_hierarchy(&self, id: AtmId, top: QualifierId) -> Option<QualifierId> {
        self.hierarchy
            .find_in_hierarchy(&self.arena[id].annotations, top)
    }

    pub fn has_annotation_in_hierarchy(&self, id: AtmId, top: QualifierId) -> bool {
        self.annotation_in_hierarchy(id, top).is_some()
    }

    pub fn has_annotation(&self, id: AtmId, q: QualifierId) -> bool {
        self.arena[id].annotations.contains(q)
    }

    /// Add `q`, replacing any qualifier of the same sub-hierarchy.
    ///
    /// On type variables, wildcards and intersections this goes through
    /// [`set_primary_and_sync_bounds`](Self::set_primary_and_sync_bounds).
    pub fn add_annotation(&mut self, id: AtmId, q: QualifierId) {
        let mut set = self.arena[id].annotations.clone();
        self.insert_replacing(&mut set, q);
        self.set_primary_and_sync_bounds(id, set);
    }

    pub fn add_annotations(
        &mut self,
        id: AtmId,
        qualifiers: impl IntoIterator<Item = QualifierId>,
    ) {
        let mut set = self.arena[id].annotations.clone();
        for q in qualifiers {
            self.insert_replacing(&mut set, q);
        }
        self.set_primary_and_sync_bounds(id, set);
    }

    /// Add an annotation by name, going through the alias table. Returns
    /// `false` if the name is not a supported qualifier.
    pub fn add_annotation_named(&mut self, id: AtmId, name: &str) -> bool {
        match self.resolve_qualifier(name) {
            Some(q) => {
                self.add_annotation(id, q);
                true
            }
            None => {
                trace!(name, "dropping unsupported annotation");
                false
            }
        }
    }

    /// Add `q` only if the type has no qualifier in its sub-hierarchy yet.
    pub fn add_missing_annotation(&mut self, id: AtmId, q: QualifierId) {
        if !self.has_annotation_in_hierarchy(id, q) {
            self.add_annotation(id, q);
        }
    }

    pub fn add_missing_annotations(
        &mut self,
        id: AtmId,
        qualifiers: impl IntoIterator<Item = QualifierId>,
    ) {
        let mut set = self.arena[id].annotations.clone();
        let mut changed = false;
        for q in qualifiers {
            if self.hierarchy.find_in_hierarchy(&set, q).is_none() {
                set.insert(q);
                changed = true;
            }
        }
        if changed {
            self.set_primary_and_sync_bounds(id, set);
        }
    }

    pub fn replace_annotation(&mut self, id: AtmId, q: QualifierId) {
        self.add_annotation(id, q);
    }

    pub fn replace_annotations(&mut self, id: AtmId, qualifiers: &AnnotationSet) {
        self.add_annotations(id, qualifiers.iter());
    }

    pub fn remove_annotation(&mut self, id: AtmId, q: QualifierId) -> bool {
        let mut set = self.arena[id].annotations.clone();
        let removed = set.remove(q);
        if removed {
            self.set_primary_and_sync_bounds(id, set);
        }
        removed
    }

    pub fn remove_annotation_in_hierarchy(&mut self, id: AtmId, top: QualifierId) -> bool {
        match self.annotation_in_hierarchy(id, top) {
            Some(q) => self.remove_annotation(id, q),
            None => false,
        }
    }

    pub fn clear_annotations(&mut self, id: AtmId) {
        self.arena[id].annotations.clear();
    }

    /// Write the primary annotations of `id` and, for type variables,
    /// wildcards and intersections, push them into every computed bound.
    ///
    /// This is the only place primaries of bounded types are written.
    pub fn set_primary_and_sync_bounds(&mut self, id: AtmId, annotations: AnnotationSet) {
        self.arena[id].annotations = annotations;
        self.sync_bounds(id);
    }

    /// Push the primaries of `id` into its computed bounds. A no-op for
    /// kinds without bounds and for types without primaries.
    pub fn sync_bounds(&mut self, id: AtmId) {
        let mut seen = FxHashSet::default();
        self.sync_bounds_inner(id, &mut seen);
    }

    fn sync_bounds_inner(&mut self, id: AtmId, seen: &mut FxHashSet<AtmId>) {
        if !seen.insert(id) {
            return;
        }
        let primaries = self.arena[id].annotations.clone();
        if primaries.is_empty() {
            return;
        }
        let targets: Vec<AtmId> = match &self.arena[id].data {
            AtmData::TypeVariable { upper, lower, .. } => {
                upper.get().into_iter().chain(lower.get()).copied().collect()
            }
            AtmData::Wildcard { extends, super_, .. } => {
                extends.get().into_iter().chain(super_.get()).copied().collect()
            }
            AtmData::Intersection { bounds } => bounds
                .get()
                .into_iter()
                .flatten()
                .copied()
                .filter(|b| self.kind(*b) != AtmKind::TypeVariable)
                .collect(),
            _ => return,
        };
        for target in targets {
            let mut set = self.arena[target].annotations.clone();
            for q in &primaries {
                self.insert_replacing(&mut set, q);
            }
            self.arena[target].annotations = set;
            self.sync_bounds_inner(target, seen);
        }
    }

    // =========================================================================
    // Raw-reference helpers
    // =========================================================================

    /// Is the wildcard `id` a placeholder for a failed inference?
    pub fn is_uninferred(&self, id: AtmId) -> bool {
        self.arena[id].is_uninferred()
    }

    pub fn is_declaration(&self, id: AtmId) -> bool {
        self.arena[id].is_declaration()
    }

    pub fn was_raw(&self, id: AtmId) -> bool {
        self.arena[id].was_raw()
    }

    /// A fresh uninferred wildcard standing for parameter `param`.
    pub fn uninferred_wildcard(&mut self, param: TypeVarId) -> AtmId {
        let id = self.create(&Type::Wildcard(WildcardBound::Unbounded), false, Some(param));
        self.arena[id].flags |= AtmFlags::UNINFERRED;
        id
    }
}

#[cfg(test)]
#[path = "../tests/factory_tests.rs"]
mod tests;
