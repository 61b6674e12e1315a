//! Resolve phase: lower every collected annotation to an interned type.

use std::sync::Arc;

use trc_common::interner::Atom;
use trc_common::limits::MAX_ALIAS_CHAIN_DEPTH;
use trc_parser::{MethodDecl, NodeKind, ParamKind as SyntaxParamKind, TypeExpr};
use trc_solver::{FunctionShape, ParamInfo, ParamKind, TypeId, TypeInterner, class_name_of};
use tracing::{debug, debug_span};

use crate::declarations::{ClassKind, DeclSite, FileId, IvarInfo, MethodId};
use crate::errors::ResolveError;
use crate::resolve::{NameBinding, NameLookup, TypeScope, namespace_candidates, resolve_type_expr};
use crate::state::{AliasState, BinderState, ModuleRef, PendingIntersection};
use crate::state_collect::constant_path;

impl BinderState {
    pub fn resolve_all(&mut self) {
        let _span = debug_span!("resolve").entered();
        for index in 0..self.aliases.len() {
            self.resolve_alias(index);
        }
        for index in 0..self.classes.len() {
            self.resolve_class_header(index);
        }
        for index in 0..self.classes.len() {
            self.resolve_ivars(index);
        }
        for index in 0..self.methods.len() {
            self.resolve_method(MethodId(index as u32));
        }
        self.apply_visibility_overrides();
    }

    /// Resolve an annotation, reporting failures against `file` and using
    /// `Any` in place of the failed type.
    pub(crate) fn resolve_annotation(
        &mut self,
        file: FileId,
        expr: &TypeExpr,
        type_params: &[Atom],
        namespace: &str,
    ) -> TypeId {
        let saved = std::mem::replace(&mut self.current_file, file);
        let scope = TypeScope::new(type_params, namespace);
        let result = resolve_type_expr(self, expr, &scope);
        self.current_file = saved;
        match result {
            Ok(ty) => ty,
            Err(error) => {
                self.report(file, &error);
                TypeId::ANY
            }
        }
    }

    // =========================================================================
    // Aliases
    // =========================================================================

    /// Resolve alias `index`, detecting reference cycles. Every alias on a
    /// cycle is reported at its own declaration and resolves to `Any`.
    pub(crate) fn resolve_alias(&mut self, index: usize) -> TypeId {
        let Some(state) = self.aliases.get_index(index).map(|(_, entry)| entry.state) else {
            return TypeId::ANY;
        };
        match state {
            AliasState::Resolved(ty) => return ty,
            AliasState::Resolving => {
                if let Some(start) = self.alias_stack.iter().position(|&i| i == index) {
                    for &member in &self.alias_stack[start..] {
                        if let Some((_, alias)) = self.aliases.get_index_mut(member) {
                            alias.in_cycle = true;
                        }
                    }
                }
                return TypeId::ANY;
            }
            AliasState::Unresolved => {}
        }
        if self.alias_stack.len() >= MAX_ALIAS_CHAIN_DEPTH as usize {
            return TypeId::ANY;
        }

        let Some((_, alias)) = self.aliases.get_index_mut(index) else {
            return TypeId::ANY;
        };
        alias.state = AliasState::Resolving;
        let site = alias.site;
        let node = alias.node;
        let namespace = alias.namespace.clone();
        self.alias_stack.push(index);

        let parsed = Arc::clone(&self.files[site.file.0 as usize]);
        let ty = match parsed.arena.kind(node) {
            Some(NodeKind::TypeAlias { ty, .. }) => self.resolve_annotation(site.file, ty, &[], &namespace),
            _ => TypeId::ANY,
        };
        self.alias_stack.pop();

        let Some((&name, alias)) = self.aliases.get_index_mut(index) else {
            return TypeId::ANY;
        };
        let in_cycle = alias.in_cycle;
        let ty = if in_cycle { TypeId::ANY } else { ty };
        alias.state = AliasState::Resolved(ty);
        if in_cycle {
            let error = ResolveError::RecursiveAlias {
                name: self.interner.resolve_atom(name).to_string(),
                pos: site.pos,
                end: site.end,
            };
            self.report(site.file, &error);
        }
        ty
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn resolve_class_header(&mut self, index: usize) {
        let Some((&name, entry)) = self.classes.get_index(index) else {
            return;
        };
        let kind = entry.info.kind;
        let params = entry.info.type_params.clone();
        let outer_namespace = entry.outer_namespace.clone();
        let superclass_node = entry.superclass_node;

        let mut superclass = None;
        if let Some((file, node)) = superclass_node {
            let parsed = Arc::clone(&self.files[file.0 as usize]);
            if let Some(NodeKind::Class {
                superclass: Some(expr),
                ..
            }) = parsed.arena.kind(node)
            {
                let ty = self.resolve_annotation(file, expr, &params, &outer_namespace);
                if self.is_class_type(ty) {
                    superclass = Some(ty);
                }
            }
        }
        let class_name = self.interner.resolve_atom(name);
        let is_root = matches!(&*class_name, "Object" | "BasicObject");
        if superclass.is_none() && kind == ClassKind::Class && !is_root {
            let object = self.atom("Object");
            if self.classes.contains_key(&object) {
                superclass = Some(self.interner.instance(object, Vec::new()));
            }
        }

        let include_refs = self.classes.get_index_mut(index).map(|(_, e)| std::mem::take(&mut e.include_refs));
        let extend_refs = self.classes.get_index_mut(index).map(|(_, e)| std::mem::take(&mut e.extend_refs));
        let includes: Vec<TypeId> = include_refs
            .unwrap_or_default()
            .iter()
            .filter_map(|module| self.resolve_module_ref(module))
            .collect();
        let extends: Vec<TypeId> = extend_refs
            .unwrap_or_default()
            .iter()
            .filter_map(|module| self.resolve_module_ref(module))
            .collect();

        if let Some((_, entry)) = self.classes.get_index_mut(index) {
            entry.info.superclass = superclass;
            entry.info.includes = includes;
            entry.info.extends = extends;
        }
    }

    /// Whether `ty` names a class (not a module) usable as a superclass.
    fn is_class_type(&self, ty: TypeId) -> bool {
        class_name_of(&self.interner, ty)
            .and_then(|name| self.classes.get(&name))
            .is_some_and(|entry| entry.info.kind == ClassKind::Class)
    }

    /// The module named by an `include` / `extend` argument.
    fn resolve_module_ref(&mut self, module: &ModuleRef) -> Option<TypeId> {
        let parsed = Arc::clone(&self.files[module.file.0 as usize]);
        let path = constant_path(&parsed.arena, module.node)?;
        for candidate in namespace_candidates(&path, &module.namespace) {
            let atom = self.atom(&candidate);
            if let Some(entry) = self.classes.get(&atom) {
                let args = vec![TypeId::ANY; entry.info.type_params.len()];
                return Some(self.interner.instance(atom, args));
            }
        }
        let (pos, end) = parsed.arena.span(module.node);
        let error = ResolveError::UnresolvedType {
            name: path.trim_start_matches("::").to_string(),
            pos,
            end,
        };
        self.report(module.file, &error);
        None
    }

    fn resolve_ivars(&mut self, index: usize) {
        let Some((&class, entry)) = self.classes.get_index_mut(index) else {
            return;
        };
        let decls = std::mem::take(&mut entry.ivar_decls);
        let params = entry.info.type_params.clone();
        let namespace = self.interner.resolve_atom(class).to_string();
        for (file, node) in decls {
            let parsed = Arc::clone(&self.files[file.0 as usize]);
            let Some(NodeKind::IvarDecl { name, ty, .. }) = parsed.arena.kind(node) else {
                continue;
            };
            let (pos, end) = parsed.arena.span(node);
            let ty = self.resolve_annotation(file, ty, &params, &namespace);
            let ivar = IvarInfo {
                ty,
                declared: true,
                site: DeclSite { file, pos, end },
            };
            let name = self.atom(name);
            if let Some((_, entry)) = self.classes.get_index_mut(index) {
                entry.info.ivars.entry(name).or_insert(ivar);
            }
        }
    }

    // =========================================================================
    // Methods
    // =========================================================================

    fn resolve_method(&mut self, id: MethodId) {
        let Some(entry) = self.methods.get(id.0 as usize) else {
            return;
        };
        let file = entry.info.site.file;
        let node = entry.info.node;
        let owner = entry.info.owner;
        let attr = entry.attr;
        let namespace = entry.namespace.clone();
        let class_params = owner
            .and_then(|o| self.classes.get(&o))
            .map(|c| c.info.type_params.clone())
            .unwrap_or_default();

        let parsed = Arc::clone(&self.files[file.0 as usize]);
        let signature = match (attr, parsed.arena.kind(node)) {
            (Some(attr), Some(NodeKind::Attr { items, .. })) => {
                let Some(item) = items.get(attr.item) else {
                    return;
                };
                let ty = item
                    .ty
                    .as_ref()
                    .map_or(TypeId::ANY, |ty| self.resolve_annotation(file, ty, &class_params, &namespace));
                if let Some(owner) = owner
                    && !attr.writer
                {
                    self.declare_attr_ivar(owner, &item.name, ty, item.ty.is_some(), file, item.pos, item.end);
                }
                if attr.writer {
                    let value = ParamInfo {
                        name: Some(self.atom("value")),
                        ty,
                        kind: ParamKind::Required,
                    };
                    self.interner.function(FunctionShape::new(vec![value], ty))
                } else {
                    self.interner.function(FunctionShape::new(Vec::new(), ty))
                }
            }
            (None, Some(NodeKind::Method(decl))) => self.method_signature(file, decl, &class_params, &namespace),
            _ => TypeId::ANY,
        };
        if let Some(entry) = self.methods.get_mut(id.0 as usize) {
            entry.info.signature = signature;
        }
    }

    /// An attribute reader backs `@name`; explicit `@name: T` declarations
    /// take precedence.
    #[allow(clippy::too_many_arguments)]
    fn declare_attr_ivar(&mut self, owner: Atom, name: &str, ty: TypeId, declared: bool, file: FileId, pos: u32, end: u32) {
        let ivar = self.atom(&format!("@{name}"));
        if let Some(entry) = self.classes.get_mut(&owner) {
            entry.info.ivars.entry(ivar).or_insert(IvarInfo {
                ty,
                declared,
                site: DeclSite { file, pos, end },
            });
        }
    }

    /// Function type of a `def`. Unannotated parameters and returns are
    /// `Any`; `*rest` and `**opts` annotations name the element type.
    pub(crate) fn method_signature(
        &mut self,
        file: FileId,
        decl: &MethodDecl,
        class_params: &[Atom],
        namespace: &str,
    ) -> TypeId {
        let method_params: Vec<Atom> = decl.type_params.iter().map(|p| self.atom(&p.name)).collect();
        let mut scope_params = class_params.to_vec();
        scope_params.extend_from_slice(&method_params);

        let mut params = Vec::with_capacity(decl.params.len());
        let mut block = None;
        for param in &decl.params {
            let ty = param
                .ty
                .as_ref()
                .map_or(TypeId::ANY, |ty| self.resolve_annotation(file, ty, &scope_params, namespace));
            let kind = match param.kind {
                SyntaxParamKind::Positional if param.is_optional() => ParamKind::Optional,
                SyntaxParamKind::Positional => ParamKind::Required,
                SyntaxParamKind::Rest => ParamKind::Rest,
                SyntaxParamKind::KeywordRest => ParamKind::KeywordRest,
                SyntaxParamKind::Keyword if param.is_optional() => ParamKind::OptionalKeyword,
                SyntaxParamKind::Keyword => ParamKind::Keyword,
                SyntaxParamKind::Block => {
                    block = Some(if param.ty.is_some() { ty } else { untyped_proc(&self.interner) });
                    continue;
                }
            };
            params.push(ParamInfo {
                name: Some(self.atom(&param.name)),
                ty,
                kind,
            });
        }
        let return_type = decl
            .return_type
            .as_ref()
            .map_or(TypeId::ANY, |ty| self.resolve_annotation(file, ty, &scope_params, namespace));
        self.interner.function(FunctionShape {
            type_params: method_params,
            params,
            return_type,
            block,
        })
    }

    fn apply_visibility_overrides(&mut self) {
        for (owner, name, visibility) in std::mem::take(&mut self.visibility_overrides) {
            let Some(&id) = self
                .classes
                .get(&owner)
                .and_then(|entry| entry.info.instance_methods.get(&name))
            else {
                debug!(method = %self.interner.resolve_atom(name), "visibility change for unknown method");
                continue;
            };
            if let Some(entry) = self.methods.get_mut(id.0 as usize) {
                entry.info.visibility = visibility;
            }
        }
    }
}

/// `Proc` with no annotation: any arguments, any result.
fn untyped_proc(interner: &TypeInterner) -> TypeId {
    let rest = ParamInfo {
        name: None,
        ty: TypeId::ANY,
        kind: ParamKind::Rest,
    };
    interner.function(FunctionShape::new(vec![rest], TypeId::ANY))
}

impl NameLookup for BinderState {
    fn interner(&self) -> &TypeInterner {
        &self.interner
    }

    fn lookup_type_name(&mut self, name: &str, namespace: &str) -> NameBinding {
        for candidate in namespace_candidates(name, namespace) {
            let atom = self.atom(&candidate);
            if let Some(index) = self.aliases.get_index_of(&atom) {
                return NameBinding::Type(self.resolve_alias(index));
            }
            if self.interfaces.contains_key(&atom) {
                return NameBinding::Interface(atom);
            }
            if let Some(entry) = self.classes.get(&atom) {
                return NameBinding::Class {
                    name: atom,
                    arity: entry.info.type_params.len(),
                };
            }
        }
        NameBinding::Unknown
    }

    fn note_intersection(&mut self, members: &[TypeId], pos: u32, end: u32) {
        self.pending_intersections.push(PendingIntersection {
            file: self.current_file,
            members: members.to_vec(),
            pos,
            end,
        });
    }
}
