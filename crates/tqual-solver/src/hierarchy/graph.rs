//! Qualifier hierarchy built from explicit subtype edges.
//!
//! Sub-hierarchies are the connected components of the edge graph (found
//! with union-find). Subtyping is answered from a precomputed
//! reflexive-transitive closure stored as one bitset of supertypes per
//! qualifier.

use super::{QualifierHierarchy, format_set};
use crate::annotations::{AnnotationSet, QualifierId};
use crate::config::{HierarchyConfig, QualifierDecl};
use crate::error::{ConfigError, FrameworkError, TypeResult};
use ena::unify::{InPlaceUnificationTable, UnifyKey};
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use tqual_common::Interner;
use tracing::debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct GroupKey(u32);

impl UnifyKey for GroupKey {
    type Value = ();

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        GroupKey(u)
    }

    fn tag() -> &'static str {
        "GroupKey"
    }
}

#[derive(Clone, Debug)]
pub struct GraphQualifierHierarchy {
    names: Interner,
    polymorphic: FixedBitSet,
    /// `supertypes[q]` holds every qualifier `q` is a subtype of, `q` included.
    supertypes: Vec<FixedBitSet>,
    top_of: Vec<QualifierId>,
    bottom_of: Vec<QualifierId>,
    tops: Vec<QualifierId>,
    bottoms: Vec<QualifierId>,
}

impl GraphQualifierHierarchy {
    pub fn builder() -> QualifierHierarchyBuilder {
        QualifierHierarchyBuilder::default()
    }

    pub fn from_config(config: &HierarchyConfig) -> Result<Self, ConfigError> {
        QualifierHierarchyBuilder {
            decls: config.qualifiers.clone(),
        }
        .build()
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Self::from_config(&HierarchyConfig::from_json(text)?)
    }

    fn check_same(&self, a: QualifierId, b: QualifierId) -> TypeResult<()> {
        if self.same_hierarchy(a, b) {
            Ok(())
        } else {
            Err(FrameworkError::DifferentHierarchies {
                left: self.name(a).to_owned(),
                right: self.name(b).to_owned(),
            })
        }
    }

    fn members(&self, top: QualifierId) -> impl Iterator<Item = QualifierId> + '_ {
        (0..self.supertypes.len() as u32)
            .map(QualifierId)
            .filter(move |q| self.top_of[q.index()] == top)
    }

    /// The unique element of `candidates` that is below all others, or the
    /// fallback when the sub-hierarchy is not a lattice.
    fn least_of(&self, candidates: &[QualifierId], fallback: QualifierId) -> QualifierId {
        candidates
            .iter()
            .copied()
            .find(|c| candidates.iter().all(|o| self.is_subtype(*c, *o)))
            .unwrap_or(fallback)
    }

    fn greatest_of(&self, candidates: &[QualifierId], fallback: QualifierId) -> QualifierId {
        candidates
            .iter()
            .copied()
            .find(|c| candidates.iter().all(|o| self.is_subtype(*o, *c)))
            .unwrap_or(fallback)
    }
}

impl QualifierHierarchy for GraphQualifierHierarchy {
    fn qualifier_count(&self) -> usize {
        self.supertypes.len()
    }

    fn qualifier_by_name(&self, name: &str) -> Option<QualifierId> {
        self.names.get(name).map(|atom| QualifierId(atom.0))
    }

    fn name(&self, q: QualifierId) -> &str {
        self.names.resolve(tqual_common::Atom(q.0))
    }

    fn is_polymorphic(&self, q: QualifierId) -> bool {
        self.polymorphic.contains(q.index())
    }

    fn top_annotations(&self) -> &[QualifierId] {
        &self.tops
    }

    fn bottom_annotations(&self) -> &[QualifierId] {
        &self.bottoms
    }

    fn top_of(&self, q: QualifierId) -> QualifierId {
        self.top_of.get(q.index()).copied().unwrap_or(q)
    }

    fn bottom_annotation(&self, start: QualifierId) -> QualifierId {
        self.bottom_of.get(start.index()).copied().unwrap_or(start)
    }

    fn is_subtype(&self, sub: QualifierId, sup: QualifierId) -> bool {
        self.supertypes
            .get(sub.index())
            .is_some_and(|ups| ups.contains(sup.index()))
    }

    fn least_upper_bound(&self, a: QualifierId, b: QualifierId) -> TypeResult<QualifierId> {
        self.check_same(a, b)?;
        if self.is_subtype(a, b) {
            return Ok(b);
        }
        if self.is_subtype(b, a) {
            return Ok(a);
        }
        let mut common = self.supertypes[a.index()].clone();
        common.intersect_with(&self.supertypes[b.index()]);
        let candidates: Vec<QualifierId> = common.ones().map(|i| QualifierId(i as u32)).collect();
        Ok(self.least_of(&candidates, self.top_of(a)))
    }

    fn greatest_lower_bound(&self, a: QualifierId, b: QualifierId) -> TypeResult<QualifierId> {
        self.check_same(a, b)?;
        if self.is_subtype(a, b) {
            return Ok(a);
        }
        if self.is_subtype(b, a) {
            return Ok(b);
        }
        let top = self.top_of(a);
        let candidates: Vec<QualifierId> = self
            .members(top)
            .filter(|q| self.is_subtype(*q, a) && self.is_subtype(*q, b))
            .collect();
        Ok(self.greatest_of(&candidates, self.bottom_annotation(a)))
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Collects qualifier declarations and validates them into a
/// [`GraphQualifierHierarchy`].
#[derive(Clone, Debug, Default)]
pub struct QualifierHierarchyBuilder {
    decls: Vec<QualifierDecl>,
}

impl QualifierHierarchyBuilder {
    /// Declare `name` with its direct supertypes.
    pub fn qualifier(mut self, name: &str, subtype_of: &[&str]) -> Self {
        self.decls.push(QualifierDecl::new(name, subtype_of));
        self
    }

    /// Declare a polymorphic qualifier in the sub-hierarchy topped by `top`.
    pub fn polymorphic(mut self, name: &str, top: &str) -> Self {
        self.decls.push(QualifierDecl::polymorphic(name, Some(top)));
        self
    }

    pub fn decl(mut self, decl: QualifierDecl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn build(self) -> Result<GraphQualifierHierarchy, ConfigError> {
        if self.decls.is_empty() {
            return Err(ConfigError::NoQualifiers);
        }

        let mut names = Interner::new();
        for decl in &self.decls {
            if names.get(&decl.name).is_some() {
                return Err(ConfigError::DuplicateQualifier(decl.name.clone()));
            }
            names.intern(&decl.name);
        }
        let count = self.decls.len();
        let lookup = |name: &str, referenced_by: &str| {
            names
                .get(name)
                .map(|atom| atom.index())
                .ok_or_else(|| ConfigError::UnknownQualifier {
                    name: name.to_owned(),
                    referenced_by: referenced_by.to_owned(),
                })
        };

        let mut polymorphic = FixedBitSet::with_capacity(count);
        let mut direct: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (i, decl) in self.decls.iter().enumerate() {
            if decl.polymorphic {
                if !decl.subtype_of.is_empty() {
                    return Err(ConfigError::PolymorphicWithSupertypes(decl.name.clone()));
                }
                polymorphic.insert(i);
                continue;
            }
            for sup in &decl.subtype_of {
                direct[i].push(lookup(sup, &decl.name)?);
            }
        }

        let mut supertypes = transitive_closure(&direct, |i| self.decls[i].name.clone())?;

        // Sub-hierarchies are the connected components of the edge graph.
        let mut groups: InPlaceUnificationTable<GroupKey> = InPlaceUnificationTable::new();
        let keys: Vec<GroupKey> = (0..count).map(|_| groups.new_key(())).collect();
        for (i, sups) in direct.iter().enumerate() {
            for &sup in sups {
                groups.union(keys[i], keys[sup]);
            }
        }
        let mut members: FxHashMap<GroupKey, Vec<usize>> = FxHashMap::default();
        let mut order: Vec<GroupKey> = Vec::new();
        for i in (0..count).filter(|i| !polymorphic.contains(*i)) {
            let root = groups.find(keys[i]);
            let entry = members.entry(root).or_default();
            if entry.is_empty() {
                order.push(root);
            }
            entry.push(i);
        }

        let mut top_of = vec![QualifierId(0); count];
        let mut bottom_of = vec![QualifierId(0); count];
        let mut tops = Vec::new();
        let mut bottoms = Vec::new();
        for root in &order {
            let group = &members[root];
            let maximal: Vec<usize> = group
                .iter()
                .copied()
                .filter(|q| direct[*q].is_empty())
                .collect();
            let minimal: Vec<usize> = group
                .iter()
                .copied()
                .filter(|q| {
                    !group
                        .iter()
                        .any(|other| other != q && supertypes[*other].contains(*q))
                })
                .collect();
            let names_of = |ids: &[usize]| -> Vec<String> {
                ids.iter().map(|i| self.decls[*i].name.clone()).collect()
            };
            if maximal.len() != 1 {
                return Err(ConfigError::MultipleTops(names_of(&maximal)));
            }
            if minimal.len() != 1 {
                return Err(ConfigError::MultipleBottoms(names_of(&minimal)));
            }
            let top = QualifierId(maximal[0] as u32);
            let bottom = QualifierId(minimal[0] as u32);
            for &q in group {
                top_of[q] = top;
                bottom_of[q] = bottom;
            }
            tops.push(top);
            bottoms.push(bottom);
        }

        // Polymorphic qualifiers sit directly below the top and directly
        // above the bottom of their sub-hierarchy.
        for (i, decl) in self.decls.iter().enumerate() {
            if !decl.polymorphic {
                continue;
            }
            let top = match &decl.top {
                Some(name) => {
                    let id = QualifierId(lookup(name, &decl.name)? as u32);
                    if !tops.contains(&id) {
                        return Err(ConfigError::PolymorphicTopNotTop {
                            name: decl.name.clone(),
                            top: name.clone(),
                        });
                    }
                    id
                }
                None if tops.len() == 1 => tops[0],
                None => return Err(ConfigError::PolymorphicWithoutTop(decl.name.clone())),
            };
            let bottom = bottom_of[top.index()];
            supertypes[i].insert(top.index());
            supertypes[bottom.index()].insert(i);
            top_of[i] = top;
            bottom_of[i] = bottom;
        }

        let hierarchy = GraphQualifierHierarchy {
            names,
            polymorphic,
            supertypes,
            top_of,
            bottom_of,
            tops,
            bottoms,
        };
        debug!(
            qualifiers = count,
            tops = %format_set(
                &hierarchy,
                &hierarchy.tops.iter().copied().collect::<AnnotationSet>()
            ),
            "built qualifier hierarchy"
        );
        Ok(hierarchy)
    }
}

/// Reflexive-transitive closure of `direct`, failing on cycles.
fn transitive_closure(
    direct: &[Vec<usize>],
    name: impl Fn(usize) -> String,
) -> Result<Vec<FixedBitSet>, ConfigError> {
    #[derive(Copy, Clone, PartialEq, Eq)]
    enum State {
        Unvisited,
        Visiting,
        Done,
    }

    fn visit(
        q: usize,
        direct: &[Vec<usize>],
        state: &mut [State],
        closure: &mut [FixedBitSet],
        name: &dyn Fn(usize) -> String,
    ) -> Result<(), ConfigError> {
        match state[q] {
            State::Done => return Ok(()),
            State::Visiting => return Err(ConfigError::CyclicSubtyping(name(q))),
            State::Unvisited => {}
        }
        state[q] = State::Visiting;
        let mut ups = FixedBitSet::with_capacity(direct.len());
        ups.insert(q);
        for &sup in &direct[q] {
            visit(sup, direct, state, closure, name)?;
            ups.union_with(&closure[sup]);
        }
        closure[q] = ups;
        state[q] = State::Done;
        Ok(())
    }

    let count = direct.len();
    let mut state = vec![State::Unvisited; count];
    let mut closure = vec![FixedBitSet::with_capacity(count); count];
    for q in 0..count {
        visit(q, direct, &mut state, &mut closure, &name)?;
    }
    Ok(closure)
}
