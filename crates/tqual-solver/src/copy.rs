//! Copy operations: deep, shallow, erased and declaration-to-use.
//!
//! Deep copies follow computed children only. Uncomputed slots stay
//! uncomputed in the copy and are derived from the same underlying type on
//! first access. An identity memo maps every source node to its copy, so
//! cyclic bound structures come out as equally cyclic copies.

use crate::annotations::AnnotationSet;
use crate::atm::{AtmData, AtmFlags, AtmId, AtmKind, AtmNode, CopyMode, Lazy};
use crate::error::TypeResult;
use crate::factory::AnnotatedTypeFactory;
use crate::recursion::{DepthCounter, RecursionProfile};
use rustc_hash::{FxHashMap, FxHashSet};
use tqual_host::{Type, erasure};

struct CopyState {
    mode: CopyMode,
    memo: FxHashMap<AtmId, AtmId>,
    depth: DepthCounter,
}

impl CopyState {
    fn new(mode: CopyMode) -> Self {
        Self {
            mode,
            memo: FxHashMap::default(),
            depth: DepthCounter::with_profile(RecursionProfile::Copy),
        }
    }
}

impl<'env> AnnotatedTypeFactory<'env> {
    /// Copy `id` and everything computed below it.
    pub fn deep_copy(&mut self, id: AtmId, mode: CopyMode) -> TypeResult<AtmId> {
        let mut state = CopyState::new(mode);
        self.copy_node(id, &mut state)
    }

    /// Deep-copy `src` into the existing slot `dst`. References to `src`
    /// inside the copied structure point at `dst`.
    pub(crate) fn copy_into(&mut self, src: AtmId, dst: AtmId, mode: CopyMode) -> TypeResult<()> {
        let mut state = CopyState::new(mode);
        state.memo.insert(src, dst);
        let shell = self.shell_of(src, mode);
        self.arena.replace(dst, shell);
        self.fill_copy(src, dst, &mut state)
    }

    /// A new node sharing every child of `id`.
    ///
    /// Type variables are deep-copied instead: their bounds carry the
    /// variable's primaries and must not be shared.
    pub fn shallow_copy(&mut self, id: AtmId, mode: CopyMode) -> TypeResult<AtmId> {
        if self.kind(id) == AtmKind::TypeVariable {
            return self.deep_copy(id, mode);
        }
        let mut node = self.arena[id].clone();
        if !mode.copies_annotations() {
            node.annotations = AnnotationSet::new();
        }
        Ok(self.arena.alloc(node))
    }

    /// The erasure of `id`, always a fresh node.
    ///
    /// Declared types lose their type arguments (an explicitly empty list),
    /// type variables and wildcards erase to the erasure of their upper
    /// bound, intersections to their first conjunct.
    pub fn erased(&mut self, id: AtmId) -> TypeResult<AtmId> {
        match self.kind(id) {
            AtmKind::Declared => {
                let erased_ty = erasure(self.env(), self.underlying(id));
                let enclosing = self.enclosing_type(id)?;
                let erased_enclosing = match enclosing {
                    Some(e) => Some(self.erased(e)?),
                    None => None,
                };
                let out = self.fresh_like(id, erased_ty);
                if let AtmData::Declared {
                    args, enclosing, ..
                } = &mut self.arena[out].data
                {
                    *args = Lazy::Computed(Vec::new());
                    *enclosing = Lazy::Computed(erased_enclosing);
                }
                Ok(out)
            }
            AtmKind::TypeVariable | AtmKind::Wildcard => {
                let upper = self.upper_bound(id)?;
                self.erased(upper)
            }
            AtmKind::Array => {
                let component = self.component_type(id)?;
                let erased_component = self.erased(component)?;
                let ty = Type::array(self.underlying(erased_component).clone());
                let out = self.fresh_like(id, ty);
                self.set_component_type(out, erased_component)?;
                Ok(out)
            }
            AtmKind::Intersection => {
                let bounds = self.intersection_bounds(id)?;
                match bounds.first() {
                    Some(first) => self.erased(*first),
                    None => self.shallow_copy(id, CopyMode::StructureAndAnnotations),
                }
            }
            AtmKind::Union => {
                let erased_ty = erasure(self.env(), self.underlying(id));
                Ok(self.fresh_like(id, erased_ty))
            }
            AtmKind::Executable
            | AtmKind::Primitive
            | AtmKind::Null
            | AtmKind::NoType => self.deep_copy(id, CopyMode::StructureAndAnnotations),
        }
    }

    /// `id` as a use. Declarations are deep-copied with the declaration flag
    /// cleared on every reachable node; uses are returned unchanged.
    pub fn as_use(&mut self, id: AtmId) -> TypeResult<AtmId> {
        if !self.is_declaration(id) {
            return Ok(id);
        }
        let copy = self.deep_copy(id, CopyMode::StructureAndAnnotations)?;
        let mut seen = FxHashSet::default();
        let mut stack = vec![copy];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            self.arena[current].flags.remove(AtmFlags::DECLARATION);
            stack.extend(self.arena[current].data.computed_children());
        }
        Ok(copy)
    }

    /// A node for `ty` carrying the primaries and flags of `id`.
    fn fresh_like(&mut self, id: AtmId, ty: Type) -> AtmId {
        let out = self.create(&ty, false, None);
        let annotations = self.arena[id].annotations.clone();
        let flags = self.arena[id].flags - AtmFlags::WAS_RAW;
        self.arena[out].annotations = annotations;
        self.arena[out].flags |= flags;
        out
    }

    fn shell_of(&self, src: AtmId, mode: CopyMode) -> AtmNode {
        let node = &self.arena[src];
        AtmNode {
            underlying: node.underlying.clone(),
            annotations: if mode.copies_annotations() {
                node.annotations.clone()
            } else {
                AnnotationSet::new()
            },
            flags: node.flags,
            data: node.data.uncomputed(),
        }
    }

    fn copy_node(&mut self, src: AtmId, state: &mut CopyState) -> TypeResult<AtmId> {
        if let Some(done) = state.memo.get(&src) {
            return Ok(*done);
        }
        let shell = self.shell_of(src, state.mode);
        let dst = self.arena.alloc(shell);
        state.memo.insert(src, dst);
        self.fill_copy(src, dst, state)?;
        Ok(dst)
    }

    fn fill_copy(&mut self, src: AtmId, dst: AtmId, state: &mut CopyState) -> TypeResult<()> {
        state.depth.enter_or_fail(RecursionProfile::Copy)?;
        let mut data = self.arena[src].data.clone();
        let mut mapped: FxHashMap<AtmId, AtmId> = FxHashMap::default();
        for child in data.computed_children() {
            let copy = self.copy_node(child, state)?;
            mapped.insert(child, copy);
        }
        data.map_children(|child| mapped.get(&child).copied().unwrap_or(child));
        state.depth.leave();
        self.arena[dst].data = data;
        Ok(())
    }
}
