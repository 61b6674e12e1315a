//! Generic instantiation.
//!
//! Replaces type parameters (and optionally `self`) inside a type. Used when
//! a generic class's method is looked up on a concrete instance
//! (`Array<User>#first` returns `User?`) and when a generic method is called.

use rustc_hash::FxHashMap;
use trc_common::interner::Atom;

use crate::intern::TypeInterner;
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::types::{FunctionShape, ParamInfo, RecordField, TypeId, TypeKey};

/// Mapping from type parameter names to types.
#[derive(Clone, Debug, Default)]
pub struct TypeSubstitution {
    map: FxHashMap<Atom, TypeId>,
    self_type: Option<TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair parameters with arguments; missing arguments become `Any`.
    pub fn from_args(params: &[Atom], args: &[TypeId]) -> Self {
        let map = params
            .iter()
            .enumerate()
            .map(|(i, &param)| (param, args.get(i).copied().unwrap_or(TypeId::ANY)))
            .collect();
        TypeSubstitution { map, self_type: None }
    }

    #[must_use]
    pub fn with_self(mut self, self_type: TypeId) -> Self {
        self.self_type = Some(self_type);
        self
    }

    pub fn insert(&mut self, param: Atom, ty: TypeId) {
        self.map.insert(param, ty);
    }

    pub fn get(&self, param: Atom) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty() && self.self_type.is_none()
    }

    fn without(&self, params: &[Atom]) -> Self {
        let mut copy = self.clone();
        for param in params {
            copy.map.remove(param);
        }
        copy
    }
}

pub struct TypeInstantiator<'a> {
    interner: &'a TypeInterner,
    guard: RecursionGuard<TypeId>,
}

impl<'a> TypeInstantiator<'a> {
    pub fn new(interner: &'a TypeInterner) -> Self {
        TypeInstantiator {
            interner,
            guard: RecursionGuard::with_profile(RecursionProfile::Instantiation),
        }
    }

    pub fn instantiate(&mut self, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
        if subst.is_empty() {
            return ty;
        }
        if ty == TypeId::SELF {
            return subst.self_type.unwrap_or(ty);
        }
        if ty.is_intrinsic() {
            return ty;
        }
        if !self.guard.enter(ty).is_entered() {
            return ty;
        }
        let result = self.instantiate_key(ty, subst);
        self.guard.leave(ty);
        result
    }

    fn instantiate_key(&mut self, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
        let interner = self.interner;
        match interner.lookup(ty) {
            Some(TypeKey::TypeParam(name)) => subst.get(name).unwrap_or(ty),
            Some(TypeKey::Union(members)) => {
                let members = members.into_iter().map(|m| self.instantiate(m, subst)).collect();
                interner.union(members)
            }
            Some(TypeKey::Intersection(members)) => {
                let members = members.into_iter().map(|m| self.instantiate(m, subst)).collect();
                interner.intersection(members)
            }
            Some(TypeKey::Instance(name, args)) => {
                let args = args.into_iter().map(|a| self.instantiate(a, subst)).collect();
                interner.instance(name, args)
            }
            Some(TypeKey::Record(fields)) => {
                let fields = fields
                    .into_iter()
                    .map(|field| RecordField {
                        ty: self.instantiate(field.ty, subst),
                        ..field
                    })
                    .collect();
                interner.record(fields)
            }
            Some(TypeKey::Function(id)) => {
                let Some(shape) = interner.function_shape(id) else {
                    return ty;
                };
                let shadowed;
                let subst = if shape.type_params.is_empty() {
                    subst
                } else {
                    shadowed = subst.without(&shape.type_params);
                    &shadowed
                };
                let params = shape
                    .params
                    .iter()
                    .map(|p| ParamInfo {
                        ty: self.instantiate(p.ty, subst),
                        ..p.clone()
                    })
                    .collect();
                let return_type = self.instantiate(shape.return_type, subst);
                let block = shape.block.map(|b| self.instantiate(b, subst));
                interner.function(FunctionShape {
                    type_params: shape.type_params.clone(),
                    params,
                    return_type,
                    block,
                })
            }
            _ => ty,
        }
    }
}

pub fn instantiate_type(interner: &TypeInterner, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
    TypeInstantiator::new(interner).instantiate(ty, subst)
}

/// Replace `self` with a concrete receiver type.
pub fn substitute_self_type(interner: &TypeInterner, ty: TypeId, self_type: TypeId) -> TypeId {
    instantiate_type(interner, ty, &TypeSubstitution::new().with_self(self_type))
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod instantiate_tests;
