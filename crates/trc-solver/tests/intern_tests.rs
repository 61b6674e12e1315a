use super::*;
use crate::types::{LiteralValue, TypeKey};

#[test]
fn intrinsics_are_preregistered() {
    let interner = TypeInterner::new();
    assert_eq!(interner.lookup(TypeId::STRING), Some(TypeKey::Intrinsic(IntrinsicKind::String)));
    assert_eq!(interner.lookup(TypeId::ANY), Some(TypeKey::Intrinsic(IntrinsicKind::Any)));
    assert_eq!(interner.intern(TypeKey::Intrinsic(IntrinsicKind::Nil)), TypeId::NIL);
}

#[test]
fn identical_keys_share_an_id() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("hello");
    let b = interner.literal_string("hello");
    let c = interner.literal_string("world");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.0 >= TypeId::FIRST_USER);
    match interner.lookup(a) {
        Some(TypeKey::Literal(LiteralValue::String(atom))) => {
            assert_eq!(&*interner.resolve_atom(atom), "hello");
        }
        other => panic!("expected string literal, got {other:?}"),
    }
}

#[test]
fn core_class_instances_are_primitives() {
    let interner = TypeInterner::new();
    assert_eq!(interner.instance_named("String", vec![]), TypeId::STRING);
    assert_eq!(interner.instance_named("NilClass", vec![]), TypeId::NIL);
    assert_ne!(interner.instance_named("User", vec![]), TypeId::ERROR);
}

#[test]
fn union_normalization() {
    let interner = TypeInterner::new();
    assert_eq!(interner.union(vec![TypeId::STRING]), TypeId::STRING);
    assert_eq!(interner.union(vec![TypeId::STRING, TypeId::ANY]), TypeId::ANY);
    assert_eq!(interner.union(vec![TypeId::STRING, TypeId::NEVER]), TypeId::STRING);
    assert_eq!(interner.union(vec![]), TypeId::NEVER);
    assert_eq!(interner.union(vec![TypeId::STRING, TypeId::STRING]), TypeId::STRING);
}

#[test]
fn union_flattens_nested_unions() {
    let interner = TypeInterner::new();
    let inner = interner.union(vec![TypeId::STRING, TypeId::INTEGER]);
    let outer = interner.union(vec![inner, TypeId::SYMBOL]);
    let flat = interner.union(vec![TypeId::SYMBOL, TypeId::INTEGER, TypeId::STRING]);
    assert_eq!(outer, flat);
    match interner.lookup(outer) {
        Some(TypeKey::Union(members)) => assert_eq!(members.len(), 3),
        other => panic!("expected union, got {other:?}"),
    }
}

#[test]
fn literals_are_absorbed_by_their_primitive() {
    let interner = TypeInterner::new();
    let a = interner.literal_string("a");
    assert_eq!(interner.union(vec![a, TypeId::STRING]), TypeId::STRING);

    let one = interner.literal_integer(1);
    let mixed = interner.union(vec![one, TypeId::STRING]);
    assert!(matches!(interner.lookup(mixed), Some(TypeKey::Union(m)) if m.contains(&one)));
}

#[test]
fn true_or_false_is_boolean() {
    let interner = TypeInterner::new();
    let t = interner.literal_bool(true);
    let f = interner.literal_bool(false);
    assert_eq!(interner.union(vec![t, f]), TypeId::BOOLEAN);
    assert_eq!(interner.union(vec![t, TypeId::BOOLEAN]), TypeId::BOOLEAN);
}

#[test]
fn optional_is_union_with_nil() {
    let interner = TypeInterner::new();
    let optional = interner.optional(TypeId::STRING);
    assert_eq!(optional, interner.union(vec![TypeId::NIL, TypeId::STRING]));
    assert_eq!(interner.optional(optional), optional);
}

#[test]
fn intersection_normalization() {
    let interner = TypeInterner::new();
    let user = interner.instance_named("User", vec![]);
    assert_eq!(interner.intersection(vec![user, TypeId::NEVER]), TypeId::NEVER);
    assert_eq!(interner.intersection(vec![user, user]), user);
    assert_eq!(interner.intersection(vec![TypeId::STRING, TypeId::INTEGER]), TypeId::NEVER);

    let a = interner.literal_string("a");
    assert_eq!(interner.intersection(vec![a, TypeId::STRING]), a);
    let b = interner.literal_string("b");
    assert_eq!(interner.intersection(vec![a, b]), TypeId::NEVER);
}

#[test]
fn function_shapes_are_interned() {
    let interner = TypeInterner::new();
    let a = interner.proc_type(vec![TypeId::INTEGER], TypeId::STRING);
    let b = interner.proc_type(vec![TypeId::INTEGER], TypeId::STRING);
    let c = interner.proc_type(vec![TypeId::STRING], TypeId::STRING);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn format_uses_annotation_syntax() {
    let interner = TypeInterner::new();
    let user = interner.instance_named("User", vec![]);
    let cases = [
        (interner.optional(user), "User?"),
        (interner.array(TypeId::INTEGER), "Array<Integer>"),
        (interner.hash(TypeId::SYMBOL, TypeId::ANY), "Hash<Symbol, untyped>"),
        (interner.union(vec![TypeId::STRING, TypeId::INTEGER]), "String | Integer"),
        (interner.literal_symbol("ok"), ":ok"),
        (interner.literal_string("a"), "\"a\""),
        (interner.proc_type(vec![TypeId::INTEGER], TypeId::STRING), "Proc<Integer, String>"),
        (interner.singleton(interner.intern_string("User")), "singleton(User)"),
    ];
    for (ty, expected) in cases {
        assert_eq!(crate::format_type(&interner, ty), expected);
    }
}
