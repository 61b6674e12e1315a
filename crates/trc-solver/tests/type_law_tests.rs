//! Algebraic laws of the type relation, checked over a representative set
//! of types.

use rayon::prelude::*;
use trc_solver::{NoopResolver, TypeId, TypeInterner, is_subtype_of};

fn sample_types(interner: &TypeInterner) -> Vec<TypeId> {
    let user = interner.instance_named("User", vec![]);
    let a = interner.literal_string("a");
    vec![
        TypeId::ANY,
        TypeId::NEVER,
        TypeId::NIL,
        TypeId::STRING,
        TypeId::INTEGER,
        TypeId::BOOLEAN,
        a,
        interner.literal_integer(1),
        interner.literal_bool(true),
        user,
        interner.optional(user),
        interner.optional(TypeId::STRING),
        interner.union(vec![TypeId::STRING, TypeId::INTEGER]),
        interner.union(vec![a, TypeId::INTEGER]),
        interner.array(TypeId::STRING),
        interner.array(a),
        interner.array(TypeId::ANY),
        interner.hash(TypeId::SYMBOL, TypeId::INTEGER),
        interner.proc_type(vec![TypeId::STRING], TypeId::INTEGER),
        interner.instance_named("Object", vec![]),
    ]
}

#[test]
fn subtyping_is_reflexive() {
    let interner = TypeInterner::new();
    for ty in sample_types(&interner) {
        assert!(is_subtype_of(&interner, &NoopResolver, ty, ty), "{ty:?}");
    }
}

#[test]
fn subtyping_is_transitive() {
    let interner = TypeInterner::new();
    let types = sample_types(&interner);
    for &a in &types {
        for &b in &types {
            if !is_subtype_of(&interner, &NoopResolver, a, b) {
                continue;
            }
            for &c in &types {
                if is_subtype_of(&interner, &NoopResolver, b, c) {
                    assert!(
                        is_subtype_of(&interner, &NoopResolver, a, c),
                        "{a:?} <: {b:?} <: {c:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn union_is_commutative_and_idempotent() {
    let interner = TypeInterner::new();
    let types = sample_types(&interner);
    for &a in &types {
        for &b in &types {
            let ab = interner.union(vec![a, b]);
            assert_eq!(ab, interner.union(vec![b, a]));
            assert_eq!(ab, interner.union(vec![a, b, a]));
        }
    }
}

#[test]
fn concurrent_interning_agrees() {
    let interner = TypeInterner::new();
    let ids: Vec<TypeId> = (0..64)
        .into_par_iter()
        .map(|i| {
            let name = format!("Class{}", i % 8);
            let class = interner.instance_named(&name, vec![]);
            interner.optional(interner.array(class))
        })
        .collect();
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(*id, ids[i % 8]);
    }
}
