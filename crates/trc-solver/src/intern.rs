//! Type interning.
//!
//! The interner hands out a stable [`TypeId`] for every distinct
//! [`TypeKey`]. Union and intersection constructors normalize their members
//! before interning, so structurally equal types always share a handle and
//! `TypeId` equality is type equality.
//!
//! The interner is shared by every checker thread; lookups take a read lock,
//! and inserts go through a `DashMap` entry so concurrent interning of the
//! same key yields one id.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use trc_common::interner::{Atom, ShardedInterner};

use crate::types::{
    FunctionShape, FunctionShapeId, IntrinsicKind, LiteralValue, ParamInfo, RecordField, TypeId,
    TypeKey,
};

pub struct TypeInterner {
    atoms: ShardedInterner,
    ids: DashMap<TypeKey, TypeId, FxBuildHasher>,
    keys: RwLock<Vec<TypeKey>>,
    shape_ids: DashMap<FunctionShape, FunctionShapeId, FxBuildHasher>,
    shapes: RwLock<Vec<Arc<FunctionShape>>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        let atoms = ShardedInterner::new();
        atoms.intern_common();
        let interner = TypeInterner {
            atoms,
            ids: DashMap::with_hasher(FxBuildHasher),
            keys: RwLock::new(Vec::with_capacity(1024)),
            shape_ids: DashMap::with_hasher(FxBuildHasher),
            shapes: RwLock::new(Vec::new()),
        };
        if let Ok(mut keys) = interner.keys.write() {
            // Slots below FIRST_USER are reserved for intrinsics; unused
            // slots hold the error key and are never handed out.
            keys.resize(TypeId::FIRST_USER as usize, TypeKey::Intrinsic(IntrinsicKind::Error));
            for kind in IntrinsicKind::ALL {
                let id = kind.type_id();
                keys[id.0 as usize] = TypeKey::Intrinsic(kind);
                interner.ids.insert(TypeKey::Intrinsic(kind), id);
            }
        }
        interner
    }

    // =========================================================================
    // Names
    // =========================================================================

    pub fn intern_string(&self, s: &str) -> Atom {
        self.atoms.intern(s)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.atoms.resolve(atom)
    }

    // =========================================================================
    // Core interning
    // =========================================================================

    pub fn intern(&self, key: TypeKey) -> TypeId {
        if let TypeKey::Intrinsic(kind) = key {
            return kind.type_id();
        }
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        *self
            .ids
            .entry(key.clone())
            .or_insert_with(|| {
                let Ok(mut keys) = self.keys.write() else {
                    return TypeId::ERROR;
                };
                let id = TypeId(keys.len() as u32);
                keys.push(key);
                id
            })
            .value()
    }

    pub fn lookup(&self, id: TypeId) -> Option<TypeKey> {
        self.keys.read().ok()?.get(id.0 as usize).cloned()
    }

    /// Number of interned types, intrinsics included.
    pub fn len(&self) -> usize {
        self.keys.read().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn intern_function_shape(&self, shape: FunctionShape) -> FunctionShapeId {
        if let Some(id) = self.shape_ids.get(&shape) {
            return *id;
        }
        *self
            .shape_ids
            .entry(shape.clone())
            .or_insert_with(|| {
                let Ok(mut shapes) = self.shapes.write() else {
                    return FunctionShapeId(u32::MAX);
                };
                let id = FunctionShapeId(shapes.len() as u32);
                shapes.push(Arc::new(shape));
                id
            })
            .value()
    }

    pub fn function_shape(&self, id: FunctionShapeId) -> Option<Arc<FunctionShape>> {
        self.shapes.read().ok()?.get(id.0 as usize).cloned()
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn literal_string(&self, value: &str) -> TypeId {
        let atom = self.intern_string(value);
        self.intern(TypeKey::Literal(LiteralValue::String(atom)))
    }

    pub fn literal_integer(&self, value: i64) -> TypeId {
        self.intern(TypeKey::Literal(LiteralValue::Integer(value)))
    }

    pub fn literal_float(&self, text: &str) -> TypeId {
        let atom = self.intern_string(text);
        self.intern(TypeKey::Literal(LiteralValue::Float(atom)))
    }

    pub fn literal_symbol(&self, name: &str) -> TypeId {
        let atom = self.intern_string(name);
        self.intern(TypeKey::Literal(LiteralValue::Symbol(atom)))
    }

    pub fn literal_bool(&self, value: bool) -> TypeId {
        self.intern(TypeKey::Literal(LiteralValue::Bool(value)))
    }

    /// Instance type of a class. Core primitives map to their intrinsic ids,
    /// so `instance("String", [])` is `TypeId::STRING`.
    pub fn instance(&self, name: Atom, args: Vec<TypeId>) -> TypeId {
        if args.is_empty() {
            if let Some(id) = self.primitive_for_class(name) {
                return id;
            }
        }
        self.intern(TypeKey::Instance(name, args))
    }

    pub fn instance_named(&self, name: &str, args: Vec<TypeId>) -> TypeId {
        let atom = self.intern_string(name);
        self.instance(atom, args)
    }

    pub fn array(&self, element: TypeId) -> TypeId {
        self.instance_named("Array", vec![element])
    }

    pub fn hash(&self, key: TypeId, value: TypeId) -> TypeId {
        self.instance_named("Hash", vec![key, value])
    }

    pub fn range(&self, element: TypeId) -> TypeId {
        self.instance_named("Range", vec![element])
    }

    pub fn singleton(&self, name: Atom) -> TypeId {
        self.intern(TypeKey::Singleton(name))
    }

    pub fn interface(&self, name: Atom) -> TypeId {
        self.intern(TypeKey::Interface(name))
    }

    pub fn type_param(&self, name: Atom) -> TypeId {
        self.intern(TypeKey::TypeParam(name))
    }

    pub fn record(&self, fields: Vec<RecordField>) -> TypeId {
        self.intern(TypeKey::Record(fields))
    }

    pub fn function(&self, shape: FunctionShape) -> TypeId {
        let id = self.intern_function_shape(shape);
        self.intern(TypeKey::Function(id))
    }

    /// `Proc<P1, ..., Pn, R>`
    pub fn proc_type(&self, params: Vec<TypeId>, return_type: TypeId) -> TypeId {
        let params = params.into_iter().map(ParamInfo::unnamed).collect();
        self.function(FunctionShape::new(params, return_type))
    }

    /// `T?`
    pub fn optional(&self, inner: TypeId) -> TypeId {
        self.union(vec![inner, TypeId::NIL])
    }

    pub fn union2(&self, a: TypeId, b: TypeId) -> TypeId {
        if a == b {
            return a;
        }
        self.union(vec![a, b])
    }

    /// Build a normalized union.
    ///
    /// Nested unions are flattened; `ERROR` or `ANY` absorb everything;
    /// `NEVER` members are dropped; literals are absorbed by their primitive;
    /// `true | false` is `Boolean`. Members are deduplicated and sorted, so
    /// the result is independent of member order and repetition.
    pub fn union(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat: SmallVec<[TypeId; 8]> = SmallVec::new();
        for member in members {
            match self.lookup(member) {
                Some(TypeKey::Union(inner)) => flat.extend(inner),
                _ => flat.push(member),
            }
        }
        if flat.contains(&TypeId::ERROR) {
            return TypeId::ERROR;
        }
        if flat.contains(&TypeId::ANY) {
            return TypeId::ANY;
        }
        flat.retain(|m| *m != TypeId::NEVER);
        flat.sort_unstable();
        flat.dedup();

        let has_true = flat.contains(&self.literal_bool(true));
        let has_false = flat.contains(&self.literal_bool(false));
        if has_true && has_false && !flat.contains(&TypeId::BOOLEAN) {
            flat.push(TypeId::BOOLEAN);
        }
        let primitives: SmallVec<[TypeId; 8]> =
            flat.iter().copied().filter(|m| m.is_primitive()).collect();
        flat.retain(|m| match self.lookup(*m) {
            Some(TypeKey::Literal(value)) => !primitives.contains(&value.primitive()),
            _ => true,
        });
        flat.sort_unstable();
        flat.dedup();

        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            _ => self.intern(TypeKey::Union(flat.into_vec())),
        }
    }

    /// Build a normalized intersection.
    ///
    /// `NEVER` absorbs everything; `ANY` and `ERROR` absorb the rest;
    /// disjoint primitives (or different literals) intersect to `NEVER`; a
    /// literal intersected with its own primitive is the literal.
    pub fn intersection(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat: SmallVec<[TypeId; 8]> = SmallVec::new();
        for member in members {
            match self.lookup(member) {
                Some(TypeKey::Intersection(inner)) => flat.extend(inner),
                _ => flat.push(member),
            }
        }
        if flat.contains(&TypeId::NEVER) {
            return TypeId::NEVER;
        }
        if flat.contains(&TypeId::ERROR) {
            return TypeId::ERROR;
        }
        if flat.contains(&TypeId::ANY) {
            return TypeId::ANY;
        }
        flat.sort_unstable();
        flat.dedup();

        let mut base: Option<TypeId> = None;
        let mut literal: Option<TypeId> = None;
        for member in &flat {
            let (member_base, is_literal) = match self.lookup(*member) {
                Some(TypeKey::Literal(value)) => (value.primitive(), true),
                _ if member.is_primitive() => (*member, false),
                _ => continue,
            };
            if base.is_some_and(|b| b != member_base) {
                return TypeId::NEVER;
            }
            base = Some(member_base);
            if is_literal {
                if literal.is_some_and(|l| l != *member) {
                    return TypeId::NEVER;
                }
                literal = Some(*member);
            }
        }
        if literal.is_some() {
            if let Some(base) = base {
                flat.retain(|m| *m != base);
            }
        }

        match flat.len() {
            0 => TypeId::ANY,
            1 => flat[0],
            _ => self.intern(TypeKey::Intersection(flat.into_vec())),
        }
    }

    fn primitive_for_class(&self, name: Atom) -> Option<TypeId> {
        let text = self.resolve_atom(name);
        IntrinsicKind::ALL
            .into_iter()
            .find(|kind| kind.class_name() == Some(&*text))
            .map(IntrinsicKind::type_id)
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod intern_tests;
