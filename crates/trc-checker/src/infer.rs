//! Return-type and type-argument inference.
//!
//! A method without a return annotation gets the type of its body. The body
//! may live in another file or later in this one, so inference checks it on
//! demand with a muted child checker and memoizes the result. Each method
//! moves through `Unchecked -> Checking -> Checked`; reaching a `Checking`
//! method again means its return type depends on itself, which yields `Any`
//! and is reported once where the method is declared.

use rustc_hash::{FxHashMap, FxHashSet};
use trc_binder::{ConstantId, MethodId, MethodKind};
use trc_common::interner::Atom;
use trc_parser::NodeKind;
use trc_solver::types::TypeKey;
use trc_solver::{TypeId, TypeSubstitution, instantiate_type, remove_nil, widen_literal};
use tracing::{debug, trace};

use crate::state::CheckerState;

/// Maximum chain of methods inferring each other before giving up with `Any`.
const MAX_INFERENCE_DEPTH: u32 = 48;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum DeclState {
    #[default]
    Unchecked,
    Checking,
    Checked(TypeId),
    /// Finished, but the result depends on a cycle and was degraded.
    CheckedWithErrors(TypeId),
}

#[derive(Debug, Default)]
pub(crate) struct InferenceState {
    methods: FxHashMap<MethodId, DeclState>,
    constants: FxHashMap<ConstantId, DeclState>,
    circular: FxHashSet<MethodId>,
    depth: u32,
}

impl InferenceState {
    pub(crate) fn method_state(&self, id: MethodId) -> DeclState {
        self.methods.get(&id).copied().unwrap_or_default()
    }

    pub(crate) fn set_method_state(&mut self, id: MethodId, state: DeclState) {
        self.methods.insert(id, state);
    }

    pub(crate) fn is_circular(&self, id: MethodId) -> bool {
        self.circular.contains(&id)
    }

    /// Finish a method: record its type, degraded if a cycle ran through it.
    pub(crate) fn complete_method(&mut self, id: MethodId, ty: TypeId) -> TypeId {
        if self.circular.contains(&id) {
            self.methods.insert(id, DeclState::CheckedWithErrors(TypeId::ANY));
            TypeId::ANY
        } else {
            self.methods.insert(id, DeclState::Checked(ty));
            ty
        }
    }
}

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Method return types
    // =========================================================================

    /// Return type of a method without a return annotation, in terms of its
    /// owner's type parameters (apply the lookup's substitution to it).
    pub(crate) fn infer_method_return(&mut self, id: MethodId) -> TypeId {
        let Some(info) = self.ctx.table.method(id) else {
            return TypeId::ANY;
        };
        if info.kind != MethodKind::Def || info.has_return_annotation {
            return self
                .ctx
                .table
                .signature_shape(info.signature)
                .map_or(TypeId::ANY, |shape| shape.return_type);
        }
        match self.ctx.inference.method_state(id) {
            DeclState::Checked(ty) | DeclState::CheckedWithErrors(ty) => ty,
            DeclState::Checking => {
                debug!(method = %self.ctx.interner.resolve_atom(info.name), "circular return type inference");
                self.ctx.inference.circular.insert(id);
                TypeId::ANY
            }
            DeclState::Unchecked => self.infer_in_child(id),
        }
    }

    /// Check a method's body with a muted checker in the method's own file
    /// and class, sharing this checker's inference state.
    fn infer_in_child(&mut self, id: MethodId) -> TypeId {
        let table = self.ctx.table;
        let Some(info) = table.method(id) else {
            return TypeId::ANY;
        };
        if self.ctx.inference.depth >= MAX_INFERENCE_DEPTH {
            return TypeId::ANY;
        }
        let Some(file) = table.file(info.site.file) else {
            return TypeId::ANY;
        };
        let Some(NodeKind::Method(decl)) = file.arena.kind(info.node) else {
            return TypeId::ANY;
        };
        trace!(method = %self.ctx.interner.resolve_atom(info.name), "inferring return type");

        let mut child = CheckerState::speculative(table, info.site.file, file, self.ctx.options);
        child.ctx.inference = std::mem::take(&mut self.ctx.inference);
        child.ctx.inference.depth += 1;
        if let Some(owner) = info.owner {
            child.enter_owner(owner);
        }
        let object = child.object_type();
        child.push_scope(trc_binder::ScopeKind::TopLevel, object);
        let ty = child.check_method(info.node, decl);
        child.pop_scope();
        child.ctx.inference.depth -= 1;
        self.ctx.inference = std::mem::take(&mut child.ctx.inference);
        ty
    }

    /// Put a muted checker inside the body of `owner`.
    fn enter_owner(&mut self, owner: Atom) {
        let table = self.ctx.table;
        self.ctx.namespace = self.ctx.interner.resolve_atom(owner).to_string();
        self.ctx.class_stack.push(owner);
        if let Some(class) = table.class(owner) {
            self.ctx.class_type_params = class.type_params.clone();
        }
    }

    // =========================================================================
    // Constants
    // =========================================================================

    /// Type of a value constant (`LIMIT = 10`), from its initializer.
    pub(crate) fn constant_type(&mut self, id: ConstantId) -> TypeId {
        match self.ctx.inference.constants.get(&id).copied().unwrap_or_default() {
            DeclState::Checked(ty) | DeclState::CheckedWithErrors(ty) => return ty,
            DeclState::Checking => {
                self.ctx.inference.constants.insert(id, DeclState::CheckedWithErrors(TypeId::ANY));
                return TypeId::ANY;
            }
            DeclState::Unchecked => {}
        }
        let table = self.ctx.table;
        let Some(info) = table.constant(id) else {
            return TypeId::ANY;
        };
        let ty = if info.site.file == self.ctx.file_id
            && let Some(ty) = self.ctx.types.node_type(info.value)
        {
            ty
        } else if let Some(file) = table.file(info.site.file) {
            self.ctx.inference.constants.insert(id, DeclState::Checking);
            let mut child = CheckerState::speculative(table, info.site.file, file, self.ctx.options);
            child.ctx.inference = std::mem::take(&mut self.ctx.inference);
            let object = child.object_type();
            child.push_scope(trc_binder::ScopeKind::TopLevel, object);
            let ty = child.check_expr(info.value);
            child.pop_scope();
            self.ctx.inference = std::mem::take(&mut child.ctx.inference);
            ty
        } else {
            TypeId::ANY
        };
        let ty = widen_literal(self.ctx.interner, ty);
        let state = match self.ctx.inference.constants.get(&id) {
            Some(DeclState::CheckedWithErrors(_)) => DeclState::CheckedWithErrors(TypeId::ANY),
            _ => DeclState::Checked(ty),
        };
        self.ctx.inference.constants.insert(id, state);
        match state {
            DeclState::Checked(ty) | DeclState::CheckedWithErrors(ty) => ty,
            _ => TypeId::ANY,
        }
    }

    // =========================================================================
    // Type arguments
    // =========================================================================

    /// Bind the type parameters in `params` that occur in `param_ty` by
    /// matching it against the argument type `arg_ty`. Repeated bindings
    /// widen to a union.
    pub(crate) fn unify(
        &self,
        param_ty: TypeId,
        arg_ty: TypeId,
        params: &[Atom],
        bindings: &mut FxHashMap<Atom, TypeId>,
    ) {
        if params.is_empty() {
            return;
        }
        let interner = self.ctx.interner;
        let Some(key) = interner.lookup(param_ty) else {
            return;
        };
        match key {
            TypeKey::TypeParam(name) if params.contains(&name) => {
                let arg_ty = widen_literal(interner, arg_ty);
                let bound = match bindings.get(&name) {
                    Some(&existing) if !existing.is_any_like() => interner.union2(existing, arg_ty),
                    _ => arg_ty,
                };
                bindings.insert(name, bound);
            }
            TypeKey::Instance(class, param_args) => {
                let Some((arg_class, arg_args)) = self.ctx.table.class_and_args(arg_ty) else {
                    return;
                };
                if arg_class != class {
                    return;
                }
                for (p, a) in param_args.into_iter().zip(arg_args) {
                    self.unify(p, a, params, bindings);
                }
            }
            TypeKey::Union(members) => {
                // `U?` against `String?` binds `U` to `String`.
                let generic: Vec<TypeId> = members
                    .into_iter()
                    .filter(|&m| m != TypeId::NIL)
                    .collect();
                if let [only] = generic.as_slice() {
                    let arg_ty = remove_nil(interner, arg_ty);
                    self.unify(*only, arg_ty, params, bindings);
                }
            }
            TypeKey::Function(_) => {
                let (Some(param_shape), Some(arg_shape)) = (
                    self.ctx.table.signature_shape(param_ty),
                    self.ctx.table.signature_shape(arg_ty),
                ) else {
                    return;
                };
                for (p, a) in param_shape.params.iter().zip(arg_shape.params.iter()) {
                    self.unify(p.ty, a.ty, params, bindings);
                }
                self.unify(param_shape.return_type, arg_shape.return_type, params, bindings);
            }
            _ => {}
        }
    }

    /// Substitution for a generic call: bound parameters take their binding,
    /// unbound ones `Any`.
    pub(crate) fn bindings_substitution(&self, params: &[Atom], bindings: &FxHashMap<Atom, TypeId>) -> TypeSubstitution {
        let mut subst = TypeSubstitution::new();
        for &param in params {
            subst.insert(param, bindings.get(&param).copied().unwrap_or(TypeId::ANY));
        }
        subst
    }

    pub(crate) fn instantiate(&self, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
        if subst.is_empty() {
            return ty;
        }
        instantiate_type(self.ctx.interner, ty, subst)
    }
}
