//! Host-level type operations.
//!
//! These follow the host language's rules for unannotated types. The
//! qualifier solver relies on them for erasure checks, for finding a
//! supertype view, and for positional type-parameter correspondence.

use crate::{
    ClassId, ClassType, MethodType, PrimitiveType, Substitution, Type, TypeEnv, TypeVarId,
    WildcardBound,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use tracing::trace;

fn object(env: &dyn TypeEnv) -> Type {
    Type::class(env.well_known().object, Vec::new())
}

// =============================================================================
// Erasure
// =============================================================================

/// Erase type arguments, type variables and wildcards.
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    erasure_inner(env, ty, &mut FxHashSet::default())
}

fn erasure_inner(env: &dyn TypeEnv, ty: &Type, seen: &mut FxHashSet<TypeVarId>) -> Type {
    match ty {
        Type::Annotated(_, inner) => erasure_inner(env, inner, seen),
        Type::Class(ct) => Type::Class(ClassType {
            def: ct.def,
            args: Vec::new(),
            enclosing: ct
                .enclosing
                .as_ref()
                .map(|e| Box::new(erasure_inner(env, e, seen))),
        }),
        Type::Array(component) => Type::array(erasure_inner(env, component, seen)),
        Type::TypeVar(id) => {
            // Cyclic variable bounds are invalid source; treat them as Object.
            if !seen.insert(*id) {
                return object(env);
            }
            let erased = env
                .type_param(*id)
                .and_then(|tp| tp.upper_bounds.first())
                .map(|b| erasure_inner(env, b, seen))
                .unwrap_or_else(|| object(env));
            seen.remove(id);
            erased
        }
        Type::Wildcard(WildcardBound::Extends(bound)) => erasure_inner(env, bound, seen),
        Type::Wildcard(_) => object(env),
        Type::Intersection(parts) => parts
            .first()
            .map(|p| erasure_inner(env, p, seen))
            .unwrap_or_else(|| object(env)),
        Type::Union(alts) => erased_lub(env, alts),
        Type::Executable(m) => Type::Executable(Box::new(MethodType {
            name: m.name.clone(),
            type_params: Vec::new(),
            params: m.params.iter().map(|p| erasure_inner(env, p, seen)).collect(),
            return_type: erasure_inner(env, &m.return_type, seen),
            receiver: m.receiver.as_ref().map(|r| erasure_inner(env, r, seen)),
            thrown: m.thrown.iter().map(|t| erasure_inner(env, t, seen)).collect(),
        })),
        other => other.clone(),
    }
}

/// Nearest superclass of the first alternative that every alternative extends.
fn erased_lub(env: &dyn TypeEnv, alts: &[Type]) -> Type {
    let Some(first) = alts.first() else {
        return object(env);
    };
    let mut candidate = erasure(env, first);
    loop {
        if alts.iter().all(|alt| is_erased_subtype(env, alt, &candidate)) {
            return candidate;
        }
        let Some(ct) = candidate.as_class() else {
            return object(env);
        };
        let next = env
            .class(ct.def)
            .and_then(|def| def.super_class.as_ref())
            .map(|sc| erasure(env, sc));
        match next {
            Some(next) => candidate = next,
            None => return object(env),
        }
    }
}

/// True if the erasure of `sub` is a subtype of the erasure of `sup`.
pub fn is_erased_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    is_subtype(env, &erasure(env, sub), &erasure(env, sup))
}

/// True for a generic class used without type arguments.
pub fn is_raw(env: &dyn TypeEnv, ty: &Type) -> bool {
    match ty.peel() {
        Type::Class(ct) => {
            ct.args.is_empty()
                && env
                    .class(ct.def)
                    .is_some_and(|def| !def.type_params.is_empty())
        }
        _ => false,
    }
}

// =============================================================================
// Substitution and supertypes
// =============================================================================

/// Replace type variables according to `map`.
///
/// Annotation wrappers on a replaced variable are kept around the
/// replacement.
pub fn substitute(ty: &Type, map: &Substitution) -> Type {
    if map.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::TypeVar(id) => map.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Annotated(names, inner) => Type::annotated(names.clone(), substitute(inner, map)),
        Type::Class(ct) => Type::Class(ClassType {
            def: ct.def,
            args: ct.args.iter().map(|a| substitute(a, map)).collect(),
            enclosing: ct.enclosing.as_ref().map(|e| Box::new(substitute(e, map))),
        }),
        Type::Array(component) => Type::array(substitute(component, map)),
        Type::Wildcard(WildcardBound::Extends(b)) => Type::extends(substitute(b, map)),
        Type::Wildcard(WildcardBound::Super(b)) => Type::super_of(substitute(b, map)),
        Type::Intersection(parts) => {
            Type::Intersection(parts.iter().map(|p| substitute(p, map)).collect())
        }
        Type::Union(alts) => Type::Union(alts.iter().map(|a| substitute(a, map)).collect()),
        Type::Executable(m) => Type::Executable(Box::new(MethodType {
            name: m.name.clone(),
            type_params: m.type_params.clone(),
            params: m.params.iter().map(|p| substitute(p, map)).collect(),
            return_type: substitute(&m.return_type, map),
            receiver: m.receiver.as_ref().map(|r| substitute(r, map)),
            thrown: m.thrown.iter().map(|t| substitute(t, map)).collect(),
        })),
        other => other.clone(),
    }
}

/// Direct supertypes of a class type with its arguments substituted in.
///
/// A raw use yields erased supertypes. Interfaces without declared
/// supertypes have `Object` as their only direct supertype.
pub fn direct_supertypes(env: &dyn TypeEnv, ct: &ClassType) -> Vec<Type> {
    let Some(def) = env.class(ct.def) else {
        return Vec::new();
    };
    let raw = ct.args.is_empty() && !def.type_params.is_empty();
    let map: Substitution = if raw {
        FxHashMap::default()
    } else {
        def.type_params
            .iter()
            .copied()
            .zip(ct.args.iter().cloned())
            .collect()
    };

    let mut out: Vec<Type> = def
        .supertypes()
        .map(|s| {
            if raw {
                erasure(env, s)
            } else {
                substitute(s, &map)
            }
        })
        .collect();
    let object_id = env.well_known().object;
    if out.is_empty() && ct.def != object_id {
        out.push(object(env));
    }
    out
}

/// View `ty` as an instance of `target`, substituting type arguments.
///
/// Returns `None` when `target` is not a supertype. The result is raw when
/// the path from `ty` to `target` crosses a raw reference.
pub fn as_super(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    as_super_inner(env, ty, target, &mut FxHashSet::default())
}

fn as_super_inner(
    env: &dyn TypeEnv,
    ty: &Type,
    target: ClassId,
    seen_vars: &mut FxHashSet<TypeVarId>,
) -> Option<Type> {
    match ty.peel() {
        Type::Class(ct) => {
            let mut queue: VecDeque<Type> = VecDeque::new();
            let mut seen: FxHashSet<ClassId> = FxHashSet::default();
            queue.push_back(Type::Class(ct.clone()));
            while let Some(current) = queue.pop_front() {
                let Some(cur) = current.as_class() else {
                    continue;
                };
                if !seen.insert(cur.def) {
                    continue;
                }
                if cur.def == target {
                    trace!(target = ?target, "as_super found target");
                    return Some(current.peel().clone());
                }
                queue.extend(direct_supertypes(env, cur));
            }
            None
        }
        Type::TypeVar(id) => {
            if !seen_vars.insert(*id) {
                return None;
            }
            let bound = env.type_param(*id).map(|tp| tp.upper_bound(env));
            let found = bound.and_then(|b| as_super_inner(env, &b, target, seen_vars));
            seen_vars.remove(id);
            found
        }
        Type::Wildcard(WildcardBound::Extends(b)) => as_super_inner(env, b, target, seen_vars),
        Type::Wildcard(_) => as_super_inner(env, &object(env), target, seen_vars),
        Type::Intersection(parts) => parts
            .iter()
            .find_map(|p| as_super_inner(env, p, target, seen_vars)),
        Type::Array(_) => {
            let wk = env.well_known();
            if target == wk.object || target == wk.cloneable || target == wk.serializable {
                Some(Type::class(target, Vec::new()))
            } else {
                None
            }
        }
        Type::Primitive(p) => {
            let boxed = Type::class(boxed_class(env, *p), Vec::new());
            as_super_inner(env, &boxed, target, seen_vars)
        }
        _ => None,
    }
}

// =============================================================================
// Subtyping
// =============================================================================

/// Host subtyping for unannotated types.
///
/// Raw types are related to their parameterizations (unchecked conversion).
/// Annotations are ignored.
pub fn is_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    let sub = sub.peel();
    let sup = sup.peel();
    if sub == sup {
        return true;
    }

    match (sub, sup) {
        (Type::Null, other) => other.is_reference(),
        (Type::Primitive(a), Type::Primitive(b)) => is_primitive_widening(*a, *b),
        (Type::Union(alts), _) => alts.iter().all(|a| is_subtype(env, a, sup)),
        (_, Type::Intersection(parts)) => parts.iter().all(|p| is_subtype(env, sub, p)),
        (Type::Intersection(parts), _) => parts.iter().any(|p| is_subtype(env, p, sup)),
        (_, Type::Union(alts)) => alts.iter().any(|a| is_subtype(env, sub, a)),
        (Type::TypeVar(a), Type::TypeVar(b)) if a == b => true,
        (_, Type::TypeVar(b)) => {
            let lower = env.type_param(*b).and_then(|tp| tp.lower_bound.clone());
            if let Some(lower) = lower {
                if is_subtype(env, sub, &lower) {
                    return true;
                }
            }
            match sub {
                Type::TypeVar(a) => type_var_upper_is_subtype(env, *a, sup),
                _ => false,
            }
        }
        (Type::TypeVar(a), _) => type_var_upper_is_subtype(env, *a, sup),
        (Type::Wildcard(WildcardBound::Extends(b)), _) => is_subtype(env, b, sup),
        (Type::Wildcard(_), _) => is_subtype(env, &object(env), sup),
        (Type::Array(a), Type::Array(b)) => match (a.peel(), b.peel()) {
            (Type::Primitive(x), Type::Primitive(y)) => x == y,
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
            _ => is_subtype(env, a, b),
        },
        (Type::Array(_), Type::Class(ct)) => {
            let wk = env.well_known();
            ct.def == wk.object || ct.def == wk.cloneable || ct.def == wk.serializable
        }
        (Type::Class(_), Type::Class(target)) => {
            let Some(view) = as_super(env, sub, target.def) else {
                return false;
            };
            let Some(view) = view.as_class() else {
                return false;
            };
            if view.args.is_empty() || target.args.is_empty() {
                return true;
            }
            view.args.len() == target.args.len()
                && view
                    .args
                    .iter()
                    .zip(target.args.iter())
                    .all(|(inner, outer)| contains(env, inner, outer))
        }
        _ => false,
    }
}

fn type_var_upper_is_subtype(env: &dyn TypeEnv, id: TypeVarId, sup: &Type) -> bool {
    let Some(tp) = env.type_param(id) else {
        return false;
    };
    if tp.upper_bounds.is_empty() {
        return is_subtype(env, &object(env), sup);
    }
    tp.upper_bounds.iter().any(|b| is_subtype(env, b, sup))
}

/// Type-argument containment (JLS 4.5.1).
fn contains(env: &dyn TypeEnv, inner: &Type, outer: &Type) -> bool {
    match outer.peel() {
        Type::Wildcard(WildcardBound::Unbounded) => true,
        Type::Wildcard(WildcardBound::Extends(bound)) => match inner.peel() {
            Type::Wildcard(WildcardBound::Super(_)) | Type::Wildcard(WildcardBound::Unbounded) => {
                is_subtype(env, &object(env), bound)
            }
            Type::Wildcard(WildcardBound::Extends(ib)) => is_subtype(env, ib, bound),
            other => is_subtype(env, other, bound),
        },
        Type::Wildcard(WildcardBound::Super(bound)) => match inner.peel() {
            Type::Wildcard(WildcardBound::Super(ib)) => is_subtype(env, bound, ib),
            Type::Wildcard(_) => false,
            other => is_subtype(env, bound, other),
        },
        other => inner.unannotated() == other.unannotated(),
    }
}

/// Widening primitive conversion (JLS 5.1.2), including identity.
pub fn is_primitive_widening(from: PrimitiveType, to: PrimitiveType) -> bool {
    use PrimitiveType::*;
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Byte, Short | Int | Long | Float | Double)
            | (Short, Int | Long | Float | Double)
            | (Char, Int | Long | Float | Double)
            | (Int, Long | Float | Double)
            | (Long, Float | Double)
            | (Float, Double)
    )
}

// =============================================================================
// Boxing
// =============================================================================

pub fn boxed_class(env: &dyn TypeEnv, prim: PrimitiveType) -> ClassId {
    let wk = env.well_known();
    match prim {
        PrimitiveType::Boolean => wk.boolean,
        PrimitiveType::Byte => wk.byte,
        PrimitiveType::Short => wk.short,
        PrimitiveType::Char => wk.character,
        PrimitiveType::Int => wk.integer,
        PrimitiveType::Long => wk.long,
        PrimitiveType::Float => wk.float,
        PrimitiveType::Double => wk.double,
    }
}

pub fn unboxed_primitive(env: &dyn TypeEnv, class: ClassId) -> Option<PrimitiveType> {
    PrimitiveType::ALL
        .into_iter()
        .find(|p| boxed_class(env, *p) == class)
}

// =============================================================================
// Type parameter correspondence
// =============================================================================

/// Positional correspondence between the type parameters of `sub` and
/// `sup`, following supertype references that forward a parameter directly
/// as a type argument.
///
/// For `class ArrayList<E> implements List<E>` the result for
/// `(ArrayList, List)` is `[(0, 0)]`. Pairs are ordered by destination index.
/// An empty result means no correspondence could be established.
pub fn map_type_argument_indices(
    env: &dyn TypeEnv,
    sub: ClassId,
    sup: ClassId,
) -> Vec<(usize, usize)> {
    let Some(sub_def) = env.class(sub) else {
        return Vec::new();
    };

    // Each entry maps an index of `sub`'s parameters to an index of the
    // current class's parameters.
    let start: Vec<Option<usize>> = (0..sub_def.type_params.len()).map(Some).collect();
    let mut queue: VecDeque<(ClassId, Vec<Option<usize>>)> = VecDeque::new();
    let mut seen: FxHashSet<ClassId> = FxHashSet::default();
    queue.push_back((sub, start));

    while let Some((current, mapping)) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        if current == sup {
            let mut pairs: Vec<(usize, usize)> = mapping
                .iter()
                .enumerate()
                .filter_map(|(from, to)| to.map(|to| (from, to)))
                .collect();
            pairs.sort_by_key(|&(_, to)| to);
            return pairs;
        }
        let Some(def) = env.class(current) else {
            continue;
        };
        for super_ref in def.supertypes() {
            let Some(super_ct) = super_ref.as_class() else {
                continue;
            };
            let next: Vec<Option<usize>> = mapping
                .iter()
                .map(|pos| {
                    let param = def.type_params.get((*pos)?)?;
                    super_ct
                        .args
                        .iter()
                        .position(|arg| matches!(arg.peel(), Type::TypeVar(v) if v == param))
                })
                .collect();
            queue.push_back((super_ct.def, next));
        }
    }
    Vec::new()
}
