//! Depth limits for the solver's recursive passes.
//!
//! Every recursive walk in the solver (subtyping, equality, bounds
//! initialization, copying, as-super, formatting) is bounded by a
//! [`DepthCounter`] built from a named [`RecursionProfile`]. Hitting a limit
//! is never silently treated as a `false` answer: callers turn it into
//! [`FrameworkError::RecursionLimit`].
//!
//! ```ignore
//! let mut depth = DepthCounter::with_profile(RecursionProfile::SubtypeCheck);
//! depth.enter_or_fail(RecursionProfile::SubtypeCheck)?;
//! let result = visit(sub, sup);
//! depth.leave();
//! ```

use crate::error::{FrameworkError, TypeResult};
use tqual_common::limits;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
///
/// Each profile encodes the maximum depth of one kind of recursive
/// computation. The numbers live in [`tqual_common::limits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Kind-pair dispatch in the subtype engine.
    ///
    /// depth = 200
    SubtypeCheck,

    /// Structural equality.
    ///
    /// depth = 200
    Equality,

    /// Materializing type-variable and wildcard bounds.
    ///
    /// depth = 128
    BoundsInit,

    /// Deep copies and declaration-to-use conversion.
    ///
    /// depth = 256
    Copy,

    /// As-super conversion through supertype chains.
    ///
    /// depth = 128
    AsSuper,

    /// Formatting and hashing of computed structure.
    ///
    /// depth = 64
    Formatting,

    /// Custom limits for one-off or test scenarios.
    Custom { max_depth: u32 },
}

impl RecursionProfile {
    /// Maximum recursion depth for this profile.
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::SubtypeCheck => limits::MAX_SUBTYPE_DEPTH,
            Self::Equality => limits::MAX_EQUALITY_DEPTH,
            Self::BoundsInit => limits::MAX_BOUND_DEPTH,
            Self::Copy => limits::MAX_COPY_DEPTH,
            Self::AsSuper => limits::MAX_AS_SUPER_DEPTH,
            Self::Formatting => limits::MAX_FORMAT_DEPTH,
            Self::Custom { max_depth } => max_depth,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::SubtypeCheck => "subtype check",
            Self::Equality => "structural equality",
            Self::BoundsInit => "bounds initialization",
            Self::Copy => "copy",
            Self::AsSuper => "as-super",
            Self::Formatting => "formatting",
            Self::Custom { .. } => "custom",
        }
    }
}

// ---------------------------------------------------------------------------
// DepthCounter
// ---------------------------------------------------------------------------

/// Depth-only guard for walks that legitimately revisit the same node.
///
/// A fatal error may unwind past entered levels; the counter is discarded
/// together with the failed query, so there is no leak check on drop.
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
    exceeded: bool,
}

impl DepthCounter {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Try to enter a deeper level. On `false` the depth is not incremented
    /// and `leave()` must not be called.
    #[inline]
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return false;
        }
        self.depth += 1;
        true
    }

    /// [`enter`](Self::enter), reporting exhaustion as a fatal error.
    pub fn enter_or_fail(&mut self, profile: RecursionProfile) -> TypeResult<()> {
        if self.enter() {
            Ok(())
        } else {
            Err(FrameworkError::RecursionLimit {
                pass: profile.name(),
                depth: self.max_depth,
            })
        }
    }

    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() called at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn reset(&mut self) {
        self.depth = 0;
        self.exceeded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_limits_come_from_common_limits() {
        assert_eq!(
            RecursionProfile::SubtypeCheck.max_depth(),
            limits::MAX_SUBTYPE_DEPTH
        );
        assert_eq!(
            RecursionProfile::BoundsInit.max_depth(),
            limits::MAX_BOUND_DEPTH
        );
        let custom = RecursionProfile::Custom { max_depth: 7 };
        assert_eq!(custom.max_depth(), 7);
        assert_eq!(custom.name(), "custom");
    }

    #[test]
    fn depth_counter_reports_fatal_error() {
        let mut counter = DepthCounter::new(1);
        assert!(counter.enter_or_fail(RecursionProfile::Copy).is_ok());
        let err = counter.enter_or_fail(RecursionProfile::Copy);
        assert!(matches!(
            err,
            Err(FrameworkError::RecursionLimit { pass: "copy", depth: 1 })
        ));
        assert!(counter.is_exceeded());
        counter.leave();
        assert_eq!(counter.depth(), 0);
    }
}
