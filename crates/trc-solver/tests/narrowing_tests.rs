use super::*;
use crate::subtype::NoopResolver;

#[test]
fn remove_nil_strips_optional() {
    let interner = TypeInterner::new();
    let optional = interner.optional(TypeId::STRING);
    assert_eq!(remove_nil(&interner, optional), TypeId::STRING);
    assert_eq!(remove_nil(&interner, TypeId::STRING), TypeId::STRING);
    assert_eq!(remove_nil(&interner, TypeId::NIL), TypeId::NEVER);
}

#[test]
fn truthy_and_falsy_parts() {
    let interner = TypeInterner::new();
    let ty = interner.union(vec![TypeId::STRING, TypeId::NIL, TypeId::BOOLEAN]);
    let truthy = truthy_type(&interner, ty);
    assert_eq!(truthy, interner.union(vec![TypeId::STRING, interner.literal_bool(true)]));
    let falsy = falsy_type(&interner, ty);
    assert_eq!(falsy, interner.union(vec![TypeId::NIL, interner.literal_bool(false)]));
    assert_eq!(truthy_type(&interner, TypeId::ANY), TypeId::ANY);
}

#[test]
fn is_a_narrows_union_members() {
    let interner = TypeInterner::new();
    let ty = interner.union(vec![TypeId::STRING, TypeId::INTEGER, TypeId::NIL]);
    assert_eq!(narrow_to_type(&interner, &NoopResolver, ty, TypeId::STRING), TypeId::STRING);
    assert_eq!(
        exclude_type(&interner, &NoopResolver, ty, TypeId::STRING),
        interner.union(vec![TypeId::INTEGER, TypeId::NIL])
    );
}

#[test]
fn is_a_on_a_supertype_narrows_to_the_target() {
    let interner = TypeInterner::new();
    let object = interner.instance_named("Object", vec![]);
    assert_eq!(narrow_to_type(&interner, &NoopResolver, object, TypeId::STRING), TypeId::STRING);
    assert_eq!(narrow_to_type(&interner, &NoopResolver, TypeId::ANY, TypeId::STRING), TypeId::STRING);
    assert_eq!(narrow_to_type(&interner, &NoopResolver, TypeId::INTEGER, TypeId::STRING), TypeId::NEVER);
}

#[test]
fn widen_literal_keeps_structure() {
    let interner = TypeInterner::new();
    let lit = interner.union(vec![interner.literal_integer(1), interner.literal_string("a")]);
    assert_eq!(
        widen_literal(&interner, lit),
        interner.union(vec![TypeId::INTEGER, TypeId::STRING])
    );
    assert_eq!(widen(&interner, TypeId::INTEGER, TypeId::NIL), interner.optional(TypeId::INTEGER));
}
