//! Centralized limits and thresholds for the qualifier checker.
//!
//! Recursion limits for the solver's individual passes (subtyping, equality,
//! bounds initialization, copying) are expressed as
//! `tqual_solver::recursion::RecursionProfile` presets. The profiles read
//! their numbers from the constants below so that every limit lives in one
//! place.
//!
//! # Categories
//!
//! - **Recursion Depths**: stack-overflow protection for recursive algorithms
//! - **Iteration Budgets**: total work bounds for a single query
//! - **Capacity Hints**: inline sizes for small collections

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting depth for a single subtype query.
///
/// Each kind-pair dispatch adds one level. Recursive generic declarations
/// are cut short by the visit history long before this depth; hitting the
/// limit means a type was constructed with an unbounded, non-cyclic shape.
///
/// # Java example
///
/// ```java
/// // Every level of nesting is one dispatch:
/// List<List<List<List<String>>>> deep;
/// ```
pub const MAX_SUBTYPE_DEPTH: u32 = 200;

/// Maximum nesting depth for structural equality.
pub const MAX_EQUALITY_DEPTH: u32 = 200;

/// Maximum nesting depth while materializing a bound.
///
/// Bounds like `T extends Comparable<T>` terminate through the type
/// variable structure map; the limit only guards malformed declarations.
///
/// # Java example
///
/// ```java
/// class Node<T extends Node<T>> {}
/// class Pair<A extends Comparable<B>, B extends List<A>> {}
/// ```
pub const MAX_BOUND_DEPTH: u32 = 128;

/// Maximum nesting depth for deep copies and as-use conversion.
pub const MAX_COPY_DEPTH: u32 = 256;

/// Maximum nesting depth for as-super conversion.
pub const MAX_AS_SUPER_DEPTH: u32 = 128;

/// Maximum nesting depth for formatting and hashing.
///
/// Both only walk already-computed structure, so cycles are cut by the
/// visiting set; this guards very deep but finite types.
pub const MAX_FORMAT_DEPTH: u32 = 64;

// =============================================================================
// Capacity Hints
// =============================================================================

/// Inline capacity for annotation sets.
///
/// Most type systems have one or two sub-hierarchies, so a set of two
/// qualifiers avoids heap allocation in the common case.
pub const ANNOTATION_INLINE_CAPACITY: usize = 2;
