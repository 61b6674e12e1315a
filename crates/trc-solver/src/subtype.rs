//! Subtype and assignability checking.
//!
//! `is_subtype` is the type-algebra relation: reflexive, transitive, with
//! `Never` at the bottom and `Any` at the top. The checker uses the gradual
//! relation `is_assignable`, where `Any` is compatible in both directions at
//! every depth and, with `strict_nil` off, `nil` fits any slot.
//!
//! Classes are nominal (walk the ancestor chain, type arguments covariant);
//! interfaces are structural (member superset with compatible signatures);
//! records compare by width and depth. The checker needs declarations for
//! the nominal and structural parts; it supplies them through
//! [`TypeResolver`].

use tracing::debug;
use trc_common::interner::Atom;

use crate::intern::TypeInterner;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::{TypeId, TypeKey};

/// Declarations the subtype relation consults.
///
/// All methods have empty defaults, so a resolver that knows nothing treats
/// every class as a root and every interface as empty.
pub trait TypeResolver {
    /// Ancestors of `class` instantiated with `args`, nearest first:
    /// superclasses and included modules, as instance types.
    fn ancestors(&self, _class: Atom, _args: &[TypeId]) -> Vec<TypeId> {
        Vec::new()
    }

    /// Members an interface requires, as `(method name, function type)`.
    fn interface_members(&self, _name: Atom) -> Vec<(Atom, TypeId)> {
        Vec::new()
    }

    /// Signature (a function type) of method `name` on values of `receiver`.
    fn find_method(&self, _receiver: TypeId, _name: Atom) -> Option<TypeId> {
        None
    }
}

/// A resolver with no declarations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopResolver;

impl TypeResolver for NoopResolver {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubtypeResult {
    True,
    False,
    /// The comparison revisited a pair already in progress; assumed to hold.
    CycleDetected,
}

impl SubtypeResult {
    #[inline]
    pub fn is_true(self) -> bool {
        matches!(self, SubtypeResult::True | SubtypeResult::CycleDetected)
    }

    #[inline]
    pub fn is_false(self) -> bool {
        matches!(self, SubtypeResult::False)
    }

    #[inline]
    pub fn from_bool(value: bool) -> Self {
        if value {
            SubtypeResult::True
        } else {
            SubtypeResult::False
        }
    }
}

/// How `Any` participates in the relation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnyPropagationMode {
    /// `Any` is only a top type.
    TopOnly,
    /// `Any` is compatible with everything, in both directions, at any depth.
    Gradual,
}

pub struct SubtypeChecker<'a, R: TypeResolver> {
    pub(crate) interner: &'a TypeInterner,
    pub(crate) resolver: &'a R,
    pub(crate) any_mode: AnyPropagationMode,
    /// When off, `nil` is a subtype of every type.
    pub(crate) strict_nil: bool,
    pub(crate) guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a, R: TypeResolver> SubtypeChecker<'a, R> {
    pub fn new(interner: &'a TypeInterner, resolver: &'a R) -> Self {
        SubtypeChecker {
            interner,
            resolver,
            any_mode: AnyPropagationMode::TopOnly,
            strict_nil: true,
            guard: RecursionGuard::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    #[must_use]
    pub fn with_any_mode(mut self, mode: AnyPropagationMode) -> Self {
        self.any_mode = mode;
        self
    }

    #[must_use]
    pub fn with_strict_nil(mut self, strict_nil: bool) -> Self {
        self.strict_nil = strict_nil;
        self
    }

    pub fn is_subtype(&mut self, source: TypeId, target: TypeId) -> bool {
        self.check_subtype(source, target).is_true()
    }

    pub fn check_subtype(&mut self, source: TypeId, target: TypeId) -> SubtypeResult {
        if source == target || target.is_any_like() || source == TypeId::ERROR {
            return SubtypeResult::True;
        }
        if source == TypeId::ANY {
            return SubtypeResult::from_bool(self.any_mode == AnyPropagationMode::Gradual);
        }
        if source == TypeId::NEVER || target == TypeId::VOID {
            return SubtypeResult::True;
        }
        if target == TypeId::NEVER {
            return SubtypeResult::False;
        }
        if source == TypeId::NIL && !self.strict_nil {
            return SubtypeResult::True;
        }

        let source_key = self.interner.lookup(source);
        let target_key = self.interner.lookup(target);

        if let Some(TypeKey::Union(members)) = &source_key {
            return self.check_union_source(members, target);
        }
        match &target_key {
            Some(TypeKey::Union(members)) => {
                return self.check_union_target(source, source_key.as_ref(), members);
            }
            Some(TypeKey::Intersection(members)) => {
                return self.check_intersection_target(source, members);
            }
            _ => {}
        }
        if let Some(TypeKey::Intersection(members)) = &source_key {
            return self.check_intersection_source(source, members, target, target_key.as_ref());
        }

        if let Some(TypeKey::Literal(value)) = &source_key {
            let primitive = value.primitive();
            if primitive == target {
                return SubtypeResult::True;
            }
            if matches!(target_key, Some(TypeKey::Instance(..))) {
                return self.check_subtype(primitive, target);
            }
            return SubtypeResult::False;
        }

        match target_key {
            Some(TypeKey::Interface(name)) => self.guarded(source, target, |this| {
                this.check_interface(source, name)
            }),
            Some(TypeKey::Instance(name, args)) => self.check_instance(source, source_key.as_ref(), name, &args),
            Some(TypeKey::Singleton(name)) => self.check_singleton(source_key.as_ref(), name),
            Some(TypeKey::Record(fields)) => match source_key {
                Some(TypeKey::Record(source_fields)) => self.guarded(source, target, |this| {
                    this.check_record(&source_fields, &fields)
                }),
                _ => SubtypeResult::False,
            },
            Some(TypeKey::Function(target_shape)) => match source_key {
                Some(TypeKey::Function(source_shape)) => self.guarded(source, target, |this| {
                    this.check_function(source_shape, target_shape, false)
                }),
                _ => SubtypeResult::False,
            },
            _ => SubtypeResult::False,
        }
    }

    /// Mutual subtyping.
    pub fn types_equivalent(&mut self, a: TypeId, b: TypeId) -> bool {
        a == b || (self.check_subtype(a, b).is_true() && self.check_subtype(b, a).is_true())
    }

    /// Run a structural comparison under the cycle guard. A pair already in
    /// progress is assumed to hold; exceeding the depth limit fails.
    pub(crate) fn guarded(
        &mut self,
        source: TypeId,
        target: TypeId,
        f: impl FnOnce(&mut Self) -> SubtypeResult,
    ) -> SubtypeResult {
        match self.guard.enter((source, target)) {
            RecursionResult::Entered => {
                let result = f(self);
                self.guard.leave((source, target));
                result
            }
            RecursionResult::Cycle => SubtypeResult::CycleDetected,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                debug!(?source, ?target, "subtype recursion limit reached");
                SubtypeResult::False
            }
        }
    }
}

/// The type-algebra relation: `Any` is top only, `nil` is not special.
pub fn is_subtype_of<R: TypeResolver>(
    interner: &TypeInterner,
    resolver: &R,
    source: TypeId,
    target: TypeId,
) -> bool {
    SubtypeChecker::new(interner, resolver).is_subtype(source, target)
}

/// The gradual relation the checker uses for assignments, arguments and
/// returns.
pub fn is_assignable_to<R: TypeResolver>(
    interner: &TypeInterner,
    resolver: &R,
    source: TypeId,
    target: TypeId,
    strict_nil: bool,
) -> bool {
    SubtypeChecker::new(interner, resolver)
        .with_any_mode(AnyPropagationMode::Gradual)
        .with_strict_nil(strict_nil)
        .is_subtype(source, target)
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod subtype_tests;
