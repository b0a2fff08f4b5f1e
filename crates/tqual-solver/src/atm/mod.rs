//! Annotated type mirrors.
//!
//! An annotated type mirror (ATM) pairs one host [`Type`] with a set of
//! primary qualifiers and kind-specific children. Children are computed on
//! first access and memoized in place. Nodes live in an [`AtmArena`] owned by
//! the factory and are referenced by [`AtmId`] handles, so recursive generic
//! bounds are plain cycles between handles.

mod arena;

pub use arena::AtmArena;

use crate::annotations::AnnotationSet;
use bitflags::bitflags;
use tqual_host::{ClassId, PrimitiveType, Type, TypeVarId};

/// Handle to a node in an [`AtmArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtmId(pub u32);

impl AtmId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AtmKind {
    Declared,
    Executable,
    Array,
    TypeVariable,
    Wildcard,
    Primitive,
    Null,
    NoType,
    Intersection,
    Union,
}

impl AtmKind {
    /// Type variables and wildcards: kinds whose qualifiers come from bounds.
    pub fn is_bounded(self) -> bool {
        matches!(self, AtmKind::TypeVariable | AtmKind::Wildcard)
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AtmFlags: u8 {
        /// A generic declaration (`class List<T>`, the `T` in it) rather than a use.
        const DECLARATION = 1 << 0;
        /// Written without type arguments.
        const WAS_RAW = 1 << 1;
        /// A wildcard standing in for a type argument whose inference failed.
        const UNINFERRED = 1 << 2;
    }
}

/// How much of a node a copy carries over.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CopyMode {
    StructureAndAnnotations,
    StructureOnly,
}

impl CopyMode {
    pub fn copies_annotations(self) -> bool {
        self == CopyMode::StructureAndAnnotations
    }
}

/// A memoized child slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Lazy<T> {
    #[default]
    Uncomputed,
    Computed(T),
}

impl<T> Lazy<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Lazy::Computed(value) => Some(value),
            Lazy::Uncomputed => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Lazy::Computed(_))
    }
}

impl<T: Clone> Lazy<T> {
    pub fn cloned(&self) -> Option<T> {
        self.get().cloned()
    }
}

/// Kind-specific children of a node.
#[derive(Clone, Debug)]
pub enum AtmData {
    Declared {
        class: ClassId,
        args: Lazy<Vec<AtmId>>,
        enclosing: Lazy<Option<AtmId>>,
    },
    Executable {
        type_vars: Lazy<Vec<AtmId>>,
        params: Lazy<Vec<AtmId>>,
        return_type: Lazy<AtmId>,
        receiver: Lazy<Option<AtmId>>,
        thrown: Lazy<Vec<AtmId>>,
    },
    Array {
        component: Lazy<AtmId>,
    },
    TypeVariable {
        var: TypeVarId,
        upper: Lazy<AtmId>,
        lower: Lazy<AtmId>,
    },
    Wildcard {
        /// The declared parameter this wildcard is an argument for.
        type_param: Option<TypeVarId>,
        extends: Lazy<AtmId>,
        super_: Lazy<AtmId>,
    },
    Primitive(PrimitiveType),
    Null,
    NoType,
    Intersection {
        bounds: Lazy<Vec<AtmId>>,
    },
    Union {
        alternatives: Lazy<Vec<AtmId>>,
    },
}

impl AtmData {
    pub fn kind(&self) -> AtmKind {
        match self {
            AtmData::Declared { .. } => AtmKind::Declared,
            AtmData::Executable { .. } => AtmKind::Executable,
            AtmData::Array { .. } => AtmKind::Array,
            AtmData::TypeVariable { .. } => AtmKind::TypeVariable,
            AtmData::Wildcard { .. } => AtmKind::Wildcard,
            AtmData::Primitive(_) => AtmKind::Primitive,
            AtmData::Null => AtmKind::Null,
            AtmData::NoType => AtmKind::NoType,
            AtmData::Intersection { .. } => AtmKind::Intersection,
            AtmData::Union { .. } => AtmKind::Union,
        }
    }

    /// The same kind with every child slot reset to uncomputed.
    pub fn uncomputed(&self) -> AtmData {
        match self {
            AtmData::Declared { class, .. } => AtmData::Declared {
                class: *class,
                args: Lazy::Uncomputed,
                enclosing: Lazy::Uncomputed,
            },
            AtmData::Executable { .. } => AtmData::Executable {
                type_vars: Lazy::Uncomputed,
                params: Lazy::Uncomputed,
                return_type: Lazy::Uncomputed,
                receiver: Lazy::Uncomputed,
                thrown: Lazy::Uncomputed,
            },
            AtmData::Array { .. } => AtmData::Array {
                component: Lazy::Uncomputed,
            },
            AtmData::TypeVariable { var, .. } => AtmData::TypeVariable {
                var: *var,
                upper: Lazy::Uncomputed,
                lower: Lazy::Uncomputed,
            },
            AtmData::Wildcard { type_param, .. } => AtmData::Wildcard {
                type_param: *type_param,
                extends: Lazy::Uncomputed,
                super_: Lazy::Uncomputed,
            },
            AtmData::Primitive(p) => AtmData::Primitive(*p),
            AtmData::Null => AtmData::Null,
            AtmData::NoType => AtmData::NoType,
            AtmData::Intersection { .. } => AtmData::Intersection {
                bounds: Lazy::Uncomputed,
            },
            AtmData::Union { .. } => AtmData::Union {
                alternatives: Lazy::Uncomputed,
            },
        }
    }

    /// Every computed child, in declaration order.
    pub fn computed_children(&self) -> Vec<AtmId> {
        let mut out = Vec::new();
        match self {
            AtmData::Declared { args, enclosing, .. } => {
                if let Some(Some(e)) = enclosing.get() {
                    out.push(*e);
                }
                out.extend(args.get().into_iter().flatten().copied());
            }
            AtmData::Executable {
                type_vars,
                params,
                return_type,
                receiver,
                thrown,
            } => {
                out.extend(type_vars.get().into_iter().flatten().copied());
                out.extend(receiver.get().copied().flatten());
                out.extend(params.get().into_iter().flatten().copied());
                out.extend(return_type.get().copied());
                out.extend(thrown.get().into_iter().flatten().copied());
            }
            AtmData::Array { component } => out.extend(component.get().copied()),
            AtmData::TypeVariable { upper, lower, .. } => {
                out.extend(upper.get().copied());
                out.extend(lower.get().copied());
            }
            AtmData::Wildcard { extends, super_, .. } => {
                out.extend(extends.get().copied());
                out.extend(super_.get().copied());
            }
            AtmData::Intersection { bounds } => {
                out.extend(bounds.get().into_iter().flatten().copied())
            }
            AtmData::Union { alternatives } => {
                out.extend(alternatives.get().into_iter().flatten().copied())
            }
            AtmData::Primitive(_) | AtmData::Null | AtmData::NoType => {}
        }
        out
    }

    /// Rewrite every computed child handle through `f`.
    pub fn map_children(&mut self, mut f: impl FnMut(AtmId) -> AtmId) {
        fn map_vec(slot: &mut Lazy<Vec<AtmId>>, f: &mut impl FnMut(AtmId) -> AtmId) {
            if let Lazy::Computed(ids) = slot {
                for id in ids.iter_mut() {
                    *id = f(*id);
                }
            }
        }
        fn map_one(slot: &mut Lazy<AtmId>, f: &mut impl FnMut(AtmId) -> AtmId) {
            if let Lazy::Computed(id) = slot {
                *id = f(*id);
            }
        }
        fn map_opt(slot: &mut Lazy<Option<AtmId>>, f: &mut impl FnMut(AtmId) -> AtmId) {
            if let Lazy::Computed(Some(id)) = slot {
                *id = f(*id);
            }
        }

        match self {
            AtmData::Declared { args, enclosing, .. } => {
                map_opt(enclosing, &mut f);
                map_vec(args, &mut f);
            }
            AtmData::Executable {
                type_vars,
                params,
                return_type,
                receiver,
                thrown,
            } => {
                map_vec(type_vars, &mut f);
                map_opt(receiver, &mut f);
                map_vec(params, &mut f);
                map_one(return_type, &mut f);
                map_vec(thrown, &mut f);
            }
            AtmData::Array { component } => map_one(component, &mut f),
            AtmData::TypeVariable { upper, lower, .. } => {
                map_one(upper, &mut f);
                map_one(lower, &mut f);
            }
            AtmData::Wildcard { extends, super_, .. } => {
                map_one(extends, &mut f);
                map_one(super_, &mut f);
            }
            AtmData::Intersection { bounds } => map_vec(bounds, &mut f),
            AtmData::Union { alternatives } => map_vec(alternatives, &mut f),
            AtmData::Primitive(_) | AtmData::Null | AtmData::NoType => {}
        }
    }
}

/// One annotated type.
#[derive(Clone, Debug)]
pub struct AtmNode {
    /// The host type with outer annotation wrappers removed.
    pub underlying: Type,
    /// Primary qualifiers, at most one per sub-hierarchy.
    pub annotations: AnnotationSet,
    pub flags: AtmFlags,
    pub data: AtmData,
}

impl AtmNode {
    pub fn new(underlying: Type, data: AtmData) -> Self {
        Self {
            underlying,
            annotations: AnnotationSet::new(),
            flags: AtmFlags::empty(),
            data,
        }
    }

    #[inline]
    pub fn kind(&self) -> AtmKind {
        self.data.kind()
    }

    pub fn is_declaration(&self) -> bool {
        self.flags.contains(AtmFlags::DECLARATION)
    }

    pub fn was_raw(&self) -> bool {
        self.flags.contains(AtmFlags::WAS_RAW)
    }

    pub fn is_uninferred(&self) -> bool {
        self.flags.contains(AtmFlags::UNINFERRED)
    }

    pub fn type_var(&self) -> Option<TypeVarId> {
        match self.data {
            AtmData::TypeVariable { var, .. } => Some(var),
            _ => None,
        }
    }
}
