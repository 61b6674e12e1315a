//! Type operations behind flow narrowing and branch joins.

use crate::intern::TypeInterner;
use crate::subtype::{SubtypeChecker, TypeResolver};
use crate::types::{LiteralValue, TypeId, TypeKey};
use crate::visitor::union_members;

/// Join of two branch types.
pub fn widen(interner: &TypeInterner, a: TypeId, b: TypeId) -> TypeId {
    interner.union2(a, b)
}

/// Replace literal types with their primitive (`1 | 2` becomes `Integer`).
/// Used when a variable takes the type of its first assignment.
pub fn widen_literal(interner: &TypeInterner, ty: TypeId) -> TypeId {
    match interner.lookup(ty) {
        Some(TypeKey::Literal(value)) => value.primitive(),
        Some(TypeKey::Union(members)) => {
            let widened = members.into_iter().map(|m| widen_literal(interner, m)).collect();
            interner.union(widened)
        }
        _ => ty,
    }
}

/// `T?` to `T`.
pub fn remove_nil(interner: &TypeInterner, ty: TypeId) -> TypeId {
    if ty == TypeId::NIL {
        return TypeId::NEVER;
    }
    match interner.lookup(ty) {
        Some(TypeKey::Union(members)) => {
            interner.union(members.into_iter().filter(|m| *m != TypeId::NIL).collect())
        }
        _ => ty,
    }
}

fn is_false_literal(interner: &TypeInterner, ty: TypeId) -> bool {
    matches!(interner.lookup(ty), Some(TypeKey::Literal(LiteralValue::Bool(false))))
}

/// The part of `ty` that can be truthy: drops `nil` and `false`.
pub fn truthy_type(interner: &TypeInterner, ty: TypeId) -> TypeId {
    if ty.is_any_like() {
        return ty;
    }
    let members = union_members(interner, ty)
        .into_iter()
        .filter(|m| *m != TypeId::NIL && !is_false_literal(interner, *m))
        .map(|m| if m == TypeId::BOOLEAN { interner.literal_bool(true) } else { m })
        .collect();
    interner.union(members)
}

/// The part of `ty` that can be falsy: `nil` and `false`.
pub fn falsy_type(interner: &TypeInterner, ty: TypeId) -> TypeId {
    if ty.is_any_like() {
        return ty;
    }
    let members = union_members(interner, ty)
        .into_iter()
        .filter_map(|m| {
            if m == TypeId::NIL || is_false_literal(interner, m) {
                Some(m)
            } else if m == TypeId::BOOLEAN {
                Some(interner.literal_bool(false))
            } else {
                None
            }
        })
        .collect();
    interner.union(members)
}

/// Narrow `ty` by a positive `is_a?(target)` check.
///
/// Union members below `target` are kept. When none are, a member above
/// `target` (like `Object`) narrows to `target` itself.
pub fn narrow_to_type<R: TypeResolver>(
    interner: &TypeInterner,
    resolver: &R,
    ty: TypeId,
    target: TypeId,
) -> TypeId {
    if ty.is_any_like() {
        return target;
    }
    let mut checker = SubtypeChecker::new(interner, resolver);
    let members = union_members(interner, ty);
    let kept: Vec<TypeId> = members
        .iter()
        .copied()
        .filter(|m| checker.is_subtype(*m, target))
        .collect();
    if !kept.is_empty() {
        return interner.union(kept);
    }
    if members.iter().any(|m| checker.is_subtype(target, *m)) {
        return target;
    }
    TypeId::NEVER
}

/// Narrow `ty` by a negative `is_a?(target)` check: drop members below
/// `target`.
pub fn exclude_type<R: TypeResolver>(
    interner: &TypeInterner,
    resolver: &R,
    ty: TypeId,
    target: TypeId,
) -> TypeId {
    if ty.is_any_like() {
        return ty;
    }
    let mut checker = SubtypeChecker::new(interner, resolver);
    let kept = union_members(interner, ty)
        .into_iter()
        .filter(|m| !checker.is_subtype(*m, target))
        .collect();
    interner.union(kept)
}

#[cfg(test)]
#[path = "../tests/narrowing_tests.rs"]
mod narrowing_tests;
