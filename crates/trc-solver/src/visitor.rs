//! Type queries.
//!
//! Small helpers that classify a type or pull pieces out of it, so callers
//! never match on `TypeKey` for the common cases.

use std::sync::Arc;

use trc_common::interner::Atom;

use crate::intern::TypeInterner;
use crate::types::{FunctionShape, IntrinsicKind, LiteralValue, RecordField, TypeId, TypeKey};

/// Members of a union, or the type itself.
pub fn union_members(interner: &TypeInterner, ty: TypeId) -> Vec<TypeId> {
    match interner.lookup(ty) {
        Some(TypeKey::Union(members)) => members,
        _ => vec![ty],
    }
}

pub fn is_union_type(interner: &TypeInterner, ty: TypeId) -> bool {
    matches!(interner.lookup(ty), Some(TypeKey::Union(_)))
}

pub fn literal_value(interner: &TypeInterner, ty: TypeId) -> Option<LiteralValue> {
    match interner.lookup(ty)? {
        TypeKey::Literal(value) => Some(value),
        _ => None,
    }
}

pub fn is_literal_type(interner: &TypeInterner, ty: TypeId) -> bool {
    literal_value(interner, ty).is_some()
}

/// Whether `nil` is one of the values of `ty`.
pub fn contains_nil(interner: &TypeInterner, ty: TypeId) -> bool {
    ty == TypeId::NIL || union_members(interner, ty).contains(&TypeId::NIL)
}

/// Name of the class whose methods apply to values of `ty`.
///
/// Primitives and literals map to their core class, records to `Hash`,
/// procs to `Proc`; instances to their own class. Unions, interfaces and
/// type parameters have no single class.
pub fn class_name_of(interner: &TypeInterner, ty: TypeId) -> Option<Atom> {
    let name = match interner.lookup(ty)? {
        TypeKey::Intrinsic(kind) => kind.class_name()?,
        TypeKey::Literal(value) => return class_name_of(interner, value.primitive()),
        TypeKey::Instance(name, _) => return Some(name),
        TypeKey::Record(_) => "Hash",
        TypeKey::Function(_) => "Proc",
        TypeKey::Singleton(_) => "Class",
        _ => return None,
    };
    Some(interner.intern_string(name))
}

/// `(class name, type arguments)` of an instance type.
pub fn instance_parts(interner: &TypeInterner, ty: TypeId) -> Option<(Atom, Vec<TypeId>)> {
    match interner.lookup(ty)? {
        TypeKey::Instance(name, args) => Some((name, args)),
        _ => None,
    }
}

/// Element type of `Array<T>`.
pub fn array_element_type(interner: &TypeInterner, ty: TypeId) -> Option<TypeId> {
    let (name, args) = instance_parts(interner, ty)?;
    (&*interner.resolve_atom(name) == "Array").then(|| args.first().copied().unwrap_or(TypeId::ANY))
}

/// `(K, V)` of `Hash<K, V>`.
pub fn hash_key_value_types(interner: &TypeInterner, ty: TypeId) -> Option<(TypeId, TypeId)> {
    let (name, args) = instance_parts(interner, ty)?;
    if &*interner.resolve_atom(name) != "Hash" {
        return None;
    }
    Some((
        args.first().copied().unwrap_or(TypeId::ANY),
        args.get(1).copied().unwrap_or(TypeId::ANY),
    ))
}

pub fn record_fields(interner: &TypeInterner, ty: TypeId) -> Option<Vec<RecordField>> {
    match interner.lookup(ty)? {
        TypeKey::Record(fields) => Some(fields),
        _ => None,
    }
}

pub fn function_shape_of(interner: &TypeInterner, ty: TypeId) -> Option<Arc<FunctionShape>> {
    match interner.lookup(ty)? {
        TypeKey::Function(id) => interner.function_shape(id),
        _ => None,
    }
}

pub fn interface_name(interner: &TypeInterner, ty: TypeId) -> Option<Atom> {
    match interner.lookup(ty)? {
        TypeKey::Interface(name) => Some(name),
        _ => None,
    }
}

pub fn singleton_name(interner: &TypeInterner, ty: TypeId) -> Option<Atom> {
    match interner.lookup(ty)? {
        TypeKey::Singleton(name) => Some(name),
        _ => None,
    }
}

pub fn intrinsic_kind(interner: &TypeInterner, ty: TypeId) -> Option<IntrinsicKind> {
    match interner.lookup(ty)? {
        TypeKey::Intrinsic(kind) => Some(kind),
        _ => None,
    }
}

/// Visit the direct children of a type.
pub fn for_each_child(interner: &TypeInterner, ty: TypeId, f: &mut impl FnMut(TypeId)) {
    match interner.lookup(ty) {
        Some(TypeKey::Union(members) | TypeKey::Intersection(members)) => {
            members.into_iter().for_each(f)
        }
        Some(TypeKey::Instance(_, args)) => args.into_iter().for_each(f),
        Some(TypeKey::Record(fields)) => fields.into_iter().for_each(|field| f(field.ty)),
        Some(TypeKey::Function(id)) => {
            if let Some(shape) = interner.function_shape(id) {
                shape.params.iter().for_each(|p| f(p.ty));
                f(shape.return_type);
                if let Some(block) = shape.block {
                    f(block);
                }
            }
        }
        _ => {}
    }
}

/// Whether `predicate` holds for `ty` or any type nested inside it.
pub fn contains_type_matching(
    interner: &TypeInterner,
    ty: TypeId,
    predicate: &impl Fn(TypeId) -> bool,
) -> bool {
    if predicate(ty) {
        return true;
    }
    let mut found = false;
    for_each_child(interner, ty, &mut |child| {
        if !found && contains_type_matching(interner, child, predicate) {
            found = true;
        }
    });
    found
}

pub fn contains_type_parameters(interner: &TypeInterner, ty: TypeId) -> bool {
    contains_type_matching(interner, ty, &|t| {
        matches!(interner.lookup(t), Some(TypeKey::TypeParam(_)))
    })
}

pub fn contains_error_type(interner: &TypeInterner, ty: TypeId) -> bool {
    contains_type_matching(interner, ty, &|t| t == TypeId::ERROR)
}
