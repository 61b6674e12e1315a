//! Recursion guard for cycle detection and depth limiting in recursive type
//! computations.
//!
//! Subtype checks over interfaces can revisit the same pair of types (an
//! interface whose method returns the interface itself). The guard tracks
//! the pairs currently being compared so a revisit is reported as a cycle,
//! which the caller treats as success (coinductive semantics).

use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Structural comparison of interfaces, records and procs.
    ///
    /// depth = 100, iterations = 100,000
    SubtypeCheck,

    /// Substituting type arguments into a generic type.
    ///
    /// depth = 50, iterations = 100,000
    Instantiation,

    /// Walking a type for display or collection.
    ///
    /// depth = 50, iterations = 100,000
    Traversal,

    /// Custom limits for one-off or test scenarios.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::SubtypeCheck => 100,
            Self::Instantiation => 50,
            Self::Traversal => 50,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::SubtypeCheck | Self::Instantiation | Self::Traversal => 100_000,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// This key is already being visited.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

/// Tracks recursion state for cycle detection, depth limiting and iteration
/// bounding.
///
/// Every successful [`enter`](Self::enter) must be paired with a
/// [`leave`](Self::leave) for the same key.
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);
        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        if !self.visiting.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not being visited"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` inside a guarded scope, or return why entry was denied.
    pub fn scope<T>(&mut self, key: K, f: impl FnOnce() -> T) -> Result<T, RecursionResult> {
        match self.enter(key) {
            RecursionResult::Entered => {
                let result = f();
                self.leave(key);
                Ok(result)
            }
            denied => Err(denied),
        }
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.visiting.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether any limit was hit during the guard's lifetime.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revisiting_a_key_is_a_cycle() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::SubtypeCheck);
        assert!(guard.enter((1u32, 2u32)).is_entered());
        assert!(guard.enter((1, 2)).is_cycle());
        guard.leave((1, 2));
        assert!(guard.enter((1, 2)).is_entered());
        guard.leave((1, 2));
        assert_eq!(guard.depth(), 0);
    }

    #[test]
    fn depth_limit_is_reported() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::Custom {
            max_depth: 2,
            max_iterations: 100,
        });
        assert!(guard.enter(1u32).is_entered());
        assert!(guard.enter(2).is_entered());
        assert!(guard.enter(3).is_exceeded());
        assert!(guard.is_exceeded());
        guard.leave(2);
        guard.leave(1);
    }

    #[test]
    fn scope_leaves_on_completion() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::Traversal);
        assert_eq!(guard.scope(7u32, || 42), Ok(42));
        assert!(!guard.is_visiting(&7));
    }
}
