//! Method calls.
//!
//! Dispatch goes by receiver type: `Any` answers `Any`, unions dispatch per
//! member, class objects find singleton methods and `new`, everything else
//! looks the method up through its class. Arguments are typed once, before
//! dispatch; blocks are typed per signature because their parameter types
//! come from it.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use trc_binder::{MethodLookup, ScopeKind};
use trc_common::diagnostics::diagnostic_codes;
use trc_common::interner::Atom;
use trc_parser::{CallData, HashKey, NodeIndex, NodeKind, Param, ParamKind as SyntaxParamKind, Visibility};
use trc_solver::types::{FunctionShape, ParamInfo, ParamKind, TypeKey};
use trc_solver::visitor::singleton_name;
use trc_solver::{TypeId, TypeSubstitution, array_element_type, remove_nil};
use tracing::{debug_span, trace};

use crate::context::{Frame, FrameKind};
use crate::state::CheckerState;

/// Methods whose target is only known at run time.
const DYNAMIC_DISPATCH_METHODS: &[&str] = &[
    "send",
    "public_send",
    "__send__",
    "method_missing",
    "define_method",
    "instance_variable_get",
    "instance_variable_set",
];

/// One call being checked. `pos..end` is where call errors are reported.
pub(crate) struct CallSite<'n> {
    pub(crate) node: NodeIndex,
    /// `NONE` for a call on implicit `self`.
    pub(crate) receiver: NodeIndex,
    pub(crate) name: &'n str,
    pub(crate) pos: u32,
    pub(crate) end: u32,
    pub(crate) args: &'n [NodeIndex],
    pub(crate) block: NodeIndex,
    pub(crate) safe_nav: bool,
}

impl<'n> CallSite<'n> {
    pub(crate) fn receiverless(node: NodeIndex, name: &'n str, pos: u32, end: u32) -> Self {
        CallSite {
            node,
            receiver: NodeIndex::NONE,
            name,
            pos,
            end,
            args: &[],
            block: NodeIndex::NONE,
            safe_nav: false,
        }
    }

    fn is_bare_name(&self, has_parens: bool) -> bool {
        self.args.is_empty() && self.block.is_none() && !has_parens
    }
}

/// `"2"`, `"1-3"` or `"at least 1"`.
fn expected_arity(required: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == required => required.to_string(),
        Some(max) => format!("{required}-{max}"),
        None => format!("at least {required}"),
    }
}

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Entry points
    // =========================================================================

    pub(crate) fn check_call(&mut self, node: NodeIndex, call: &CallData) -> TypeId {
        let _span = debug_span!("call", method = %call.method).entered();
        let end = call.method_pos + call.method.len() as u32;
        let site = CallSite {
            node,
            receiver: call.receiver,
            name: &call.method,
            pos: call.method_pos,
            end,
            args: &call.args,
            block: call.block,
            safe_nav: call.safe_nav,
        };
        if call.receiver.is_none() {
            return self.check_receiverless_call(&site, call.has_parens);
        }
        let receiver_ty = self.check_expr(call.receiver);
        let arg_types = self.check_arguments(&call.args);
        self.call_on(&site, receiver_ty, &arg_types)
    }

    pub(crate) fn check_arguments(&mut self, args: &[NodeIndex]) -> Vec<TypeId> {
        args.iter().map(|&arg| self.check_expr(arg)).collect()
    }

    /// A call on implicit `self`: the class chain of `self` (which ends in
    /// `Object` and `Kernel`), then top-level methods.
    pub(crate) fn check_receiverless_call(&mut self, site: &CallSite<'_>, has_parens: bool) -> TypeId {
        let arg_types = self.check_arguments(site.args);
        if matches!(site.name, "lambda" | "proc")
            && let Some(NodeKind::Block { params, body, .. }) = self.ctx.file.arena.kind(site.block)
        {
            return self.check_lambda(site.block, params, body, None);
        }
        if DYNAMIC_DISPATCH_METHODS.contains(&site.name) {
            return self.dynamic_dispatch(site);
        }

        let name = self.atom(site.name);
        let self_ty = self.self_type();
        let table = self.ctx.table;
        let found = match singleton_name(self.ctx.interner, self_ty) {
            Some(class) => table.lookup_singleton_method(class, name),
            None => table.lookup_instance_method(self_ty, name),
        }
        .or_else(|| table.lookup_instance_method(self.object_type(), name))
        .or_else(|| {
            let id = table.function(name)?;
            Some(MethodLookup {
                id,
                owner: name,
                signature: table.method(id)?.signature,
                substitution: TypeSubstitution::new(),
            })
        });
        match found {
            Some(found) => self.apply_signature(site, &found, &arg_types),
            None => {
                if site.is_bare_name(has_parens) {
                    self.error_at_span(site.pos, site.end, diagnostic_codes::UNDEFINED_VARIABLE, &[site.name]);
                } else {
                    self.error_undefined_method(site.pos, site.end, site.name, self_ty);
                }
                self.check_untyped_block(site);
                TypeId::ANY
            }
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Call `site` on a receiver of type `receiver_ty`.
    pub(crate) fn call_on(&mut self, site: &CallSite<'_>, receiver_ty: TypeId, arg_types: &[TypeId]) -> TypeId {
        let interner = self.ctx.interner;
        if site.safe_nav {
            let present = remove_nil(interner, receiver_ty);
            if present == TypeId::NEVER {
                self.check_untyped_block(site);
                return TypeId::NIL;
            }
            let result = self.dispatch(site, present, arg_types);
            return if result.is_any_like() {
                result
            } else {
                interner.optional(result)
            };
        }
        self.dispatch(site, receiver_ty, arg_types)
    }

    fn dispatch(&mut self, site: &CallSite<'_>, receiver_ty: TypeId, arg_types: &[TypeId]) -> TypeId {
        if DYNAMIC_DISPATCH_METHODS.contains(&site.name) {
            return self.dynamic_dispatch(site);
        }
        if receiver_ty.is_any_like() {
            self.check_untyped_block(site);
            return receiver_ty;
        }
        if receiver_ty == TypeId::NEVER {
            self.check_untyped_block(site);
            return TypeId::NEVER;
        }
        let interner = self.ctx.interner;
        if site.name == "new"
            && let Some(class) = singleton_name(interner, receiver_ty)
        {
            return self.construct(site, class, arg_types);
        }
        match interner.lookup(receiver_ty) {
            Some(TypeKey::Union(members)) => self.dispatch_union(site, receiver_ty, &members, arg_types),
            Some(TypeKey::Intersection(members)) => {
                let name = self.atom(site.name);
                let table = self.ctx.table;
                match members
                    .iter()
                    .copied()
                    .find(|&m| table.lookup_instance_method(m, name).is_some())
                {
                    Some(member) => self.dispatch_single(site, member, arg_types),
                    None => {
                        self.error_undefined_method(site.pos, site.end, site.name, receiver_ty);
                        self.check_untyped_block(site);
                        TypeId::ANY
                    }
                }
            }
            Some(TypeKey::TypeParam(_)) => {
                // An unconstrained type parameter offers what `Object` does.
                let name = self.atom(site.name);
                match self.ctx.table.lookup_instance_method(self.object_type(), name) {
                    Some(found) => self.apply_signature(site, &found, arg_types),
                    None => {
                        self.error_undefined_method(site.pos, site.end, site.name, receiver_ty);
                        self.check_untyped_block(site);
                        TypeId::ANY
                    }
                }
            }
            _ => self.dispatch_single(site, receiver_ty, arg_types),
        }
    }

    /// Each member answers for itself; `nil` members that lack the method
    /// make the receiver possibly nil. Every member is checked, but reporting
    /// stops after the first member that fails, so one bad call gives one
    /// diagnostic.
    fn dispatch_union(
        &mut self,
        site: &CallSite<'_>,
        receiver_ty: TypeId,
        members: &[TypeId],
        arg_types: &[TypeId],
    ) -> TypeId {
        let name = self.atom(site.name);
        let reporting = self.ctx.reporter.is_enabled();
        let mut failed = false;
        let mut results: SmallVec<[TypeId; 4]> = SmallVec::new();
        for &member in members {
            if member == TypeId::NIL && self.ctx.table.lookup_instance_method(member, name).is_none() {
                self.error_possibly_nil_receiver(site.receiver, site.pos, site.end, site.name, receiver_ty);
                continue;
            }
            let errors_before = self.ctx.reporter.error_count();
            let previous = self.ctx.reporter.set_enabled(reporting && !failed);
            let result = self.dispatch(site, member, arg_types);
            self.ctx.reporter.set_enabled(previous);
            failed |= self.ctx.reporter.error_count() > errors_before;
            results.push(result);
        }
        if results.is_empty() {
            self.check_untyped_block(site);
            return TypeId::ANY;
        }
        self.ctx.interner.union(results.into_vec())
    }

    fn dispatch_single(&mut self, site: &CallSite<'_>, receiver_ty: TypeId, arg_types: &[TypeId]) -> TypeId {
        if self.is_function_type(receiver_ty) && matches!(site.name, "call" | "yield" | "[]" | "()") {
            return self.call_proc(site, receiver_ty, arg_types);
        }
        let name = self.atom(site.name);
        let Some(found) = self.ctx.table.lookup_instance_method(receiver_ty, name) else {
            self.error_undefined_method(site.pos, site.end, site.name, receiver_ty);
            self.check_untyped_block(site);
            return TypeId::ANY;
        };
        if self.is_private_call(site, &found) {
            self.error_undefined_method(site.pos, site.end, site.name, receiver_ty);
            self.check_untyped_block(site);
            return TypeId::ANY;
        }
        self.apply_signature(site, &found, arg_types)
    }

    /// Private methods take no explicit receiver other than `self`.
    fn is_private_call(&self, site: &CallSite<'_>, found: &MethodLookup) -> bool {
        if site.receiver.is_none() || site.name.ends_with('=') {
            return false;
        }
        if matches!(self.ctx.file.arena.kind(site.receiver), Some(NodeKind::SelfRef)) {
            return false;
        }
        self.ctx
            .table
            .method(found.id)
            .is_some_and(|info| info.visibility == Visibility::Private)
    }

    fn dynamic_dispatch(&mut self, site: &CallSite<'_>) -> TypeId {
        self.report_dynamic_dispatch(site.pos, site.end, site.name);
        self.check_untyped_block(site);
        TypeId::ANY
    }

    /// `proc.call(args)` on a typed proc.
    fn call_proc(&mut self, site: &CallSite<'_>, proc_ty: TypeId, arg_types: &[TypeId]) -> TypeId {
        let Some(shape) = self.ctx.table.signature_shape(proc_ty) else {
            return TypeId::ANY;
        };
        let mut bindings = FxHashMap::default();
        self.check_call_arguments(site, &shape, arg_types, &[], &mut bindings);
        shape.return_type
    }

    /// `Class.new(args)`: check the arguments against `initialize` and
    /// infer the class's type arguments from them.
    fn construct(&mut self, site: &CallSite<'_>, class: Atom, arg_types: &[TypeId]) -> TypeId {
        let interner = self.ctx.interner;
        let table = self.ctx.table;
        let Some(info) = table.class(class) else {
            return TypeId::ANY;
        };
        let class_params = info.type_params.clone();
        let self_ty = info.self_type(interner);
        let placeholder_args: Vec<TypeId> = class_params.iter().map(|&p| interner.type_param(p)).collect();
        let initialize = self.atom("initialize");
        let Some(found) = table.lookup_method_in_class(class, &placeholder_args, initialize, self_ty) else {
            self.check_untyped_block(site);
            return self_ty;
        };
        let Some(shape) = table.signature_shape(found.signature) else {
            return interner.instance(class, vec![TypeId::ANY; class_params.len()]);
        };
        let mut generics = class_params.clone();
        generics.extend(shape.type_params.iter().copied());
        let mut bindings = FxHashMap::default();
        self.check_call_arguments(site, &shape, arg_types, &generics, &mut bindings);
        self.check_call_block(site, &shape, &generics, &mut bindings);
        let subst = self.bindings_substitution(&class_params, &bindings);
        self.instantiate(self_ty, &subst)
    }

    // =========================================================================
    // Signatures
    // =========================================================================

    /// Check arguments and block against a found method and compute the
    /// call's type.
    pub(crate) fn apply_signature(
        &mut self,
        site: &CallSite<'_>,
        found: &MethodLookup,
        arg_types: &[TypeId],
    ) -> TypeId {
        let Some(shape) = self.ctx.table.signature_shape(found.signature) else {
            self.check_untyped_block(site);
            return TypeId::ANY;
        };
        let generics = shape.type_params.clone();
        let mut bindings = FxHashMap::default();
        self.check_call_arguments(site, &shape, arg_types, &generics, &mut bindings);
        self.check_call_block(site, &shape, &generics, &mut bindings);

        let needs_inference = self
            .ctx
            .table
            .method(found.id)
            .is_some_and(|info| info.needs_inference());
        let return_type = if needs_inference {
            let inferred = self.infer_method_return(found.id);
            self.instantiate(inferred, &found.substitution)
        } else {
            shape.return_type
        };
        let subst = self.bindings_substitution(&generics, &bindings);
        let result = self.instantiate(return_type, &subst);
        trace!(method = site.name, result = %self.format_type(result), "call resolved");
        result
    }

    /// Arity, positional and keyword arguments.
    fn check_call_arguments(
        &mut self,
        site: &CallSite<'_>,
        shape: &FunctionShape,
        arg_types: &[TypeId],
        generics: &[Atom],
        bindings: &mut FxHashMap<Atom, TypeId>,
    ) {
        let arena = &self.ctx.file.arena;
        let keyword_hash = match site.args.last() {
            Some(&last) if shape.has_keywords() => match arena.kind(last) {
                Some(NodeKind::Hash { braces: false, .. }) => Some(last),
                _ => None,
            },
            _ => None,
        };
        let positional = if keyword_hash.is_some() {
            &site.args[..site.args.len() - 1]
        } else {
            site.args
        };
        let has_splat = positional
            .iter()
            .any(|&arg| matches!(arena.kind(arg), Some(NodeKind::Splat { .. })));

        if !has_splat {
            let required = shape.required_positional();
            let max = shape.max_positional();
            let count = positional.len();
            if count < required || max.is_some_and(|max| count > max) {
                self.error_argument_count(site.pos, site.end, &expected_arity(required, max), count);
            }
        }

        let mut pairs: Vec<(NodeIndex, TypeId, ParamInfo)> = Vec::new();
        let positional_params: Vec<&ParamInfo> = shape.params.iter().filter(|p| p.kind.is_positional()).collect();
        let mut next = 0;
        for (i, &arg) in positional.iter().enumerate() {
            if matches!(arena.kind(arg), Some(NodeKind::Splat { .. })) {
                break;
            }
            let Some(param) = positional_params.get(next) else {
                break;
            };
            pairs.push((arg, arg_types.get(i).copied().unwrap_or(TypeId::ANY), (*param).clone()));
            if param.kind != ParamKind::Rest {
                next += 1;
            }
        }

        if shape.has_keywords() {
            self.collect_keyword_arguments(site, shape, keyword_hash, &mut pairs);
        }

        for (_, ty, param) in &pairs {
            self.unify(param.ty, *ty, generics, bindings);
        }
        let subst = self.bindings_substitution(generics, bindings);
        for (arg, ty, param) in pairs {
            let target = self.instantiate(param.ty, &subst);
            if !self.fits(arg, ty, target) {
                let name = param
                    .name
                    .map_or_else(|| "argument".to_string(), |n| self.ctx.interner.resolve_atom(n).to_string());
                self.error_argument_not_assignable(arg, ty, &name, target);
            }
        }
    }

    fn collect_keyword_arguments(
        &mut self,
        site: &CallSite<'_>,
        shape: &FunctionShape,
        hash: Option<NodeIndex>,
        pairs: &mut Vec<(NodeIndex, TypeId, ParamInfo)>,
    ) {
        let file = self.ctx.file;
        let rest = shape.params.iter().find(|p| p.kind == ParamKind::KeywordRest);
        let mut supplied: SmallVec<[Atom; 8]> = SmallVec::new();
        let mut forwarded = false;
        let entries = match hash.and_then(|h| file.arena.kind(h)) {
            Some(NodeKind::Hash { entries, .. }) => entries.as_slice(),
            _ => &[],
        };
        for entry in entries {
            let name = match &entry.key {
                HashKey::Label(name) | HashKey::Shorthand(name) => name,
                HashKey::DoubleSplat => {
                    forwarded = true;
                    continue;
                }
                HashKey::Expr(_) => continue,
            };
            let atom = self.atom(name);
            supplied.push(atom);
            let (node, ty) = if entry.value.is_some() {
                (entry.value, self.ctx.types.node_type(entry.value).unwrap_or(TypeId::ANY))
            } else {
                (hash.unwrap_or(site.node), self.check_name_reference(name, entry.pos))
            };
            let param = shape
                .params
                .iter()
                .find(|p| matches!(p.kind, ParamKind::Keyword | ParamKind::OptionalKeyword) && p.name == Some(atom))
                .or(rest);
            match param {
                Some(param) => pairs.push((node, ty, param.clone())),
                None => {
                    let end = entry.pos + name.len() as u32;
                    self.error_at_span(entry.pos, end, diagnostic_codes::UNKNOWN_KEYWORD_ARGUMENT, &[name.as_str()]);
                }
            }
        }
        if forwarded {
            return;
        }
        for param in &shape.params {
            if param.kind == ParamKind::Keyword
                && let Some(name) = param.name
                && !supplied.contains(&name)
            {
                let name = self.ctx.interner.resolve_atom(name);
                self.error_at_span(site.pos, site.end, diagnostic_codes::MISSING_KEYWORD_ARGUMENT, &[&*name]);
            }
        }
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Type the block of a call against the signature's block type, binding
    /// generic parameters that occur in the block's return.
    fn check_call_block(
        &mut self,
        site: &CallSite<'_>,
        shape: &FunctionShape,
        generics: &[Atom],
        bindings: &mut FxHashMap<Atom, TypeId>,
    ) {
        if site.block.is_none() {
            return;
        }
        let block_shape = shape.block.and_then(|b| self.ctx.table.signature_shape(b));
        let Some(block_shape) = block_shape else {
            self.check_untyped_block(site);
            return;
        };
        let subst = self.bindings_substitution(generics, bindings);
        let param_types: Vec<ParamInfo> = block_shape
            .params
            .iter()
            .map(|p| ParamInfo {
                ty: self.instantiate(p.ty, &subst),
                ..p.clone()
            })
            .collect();

        let file = self.ctx.file;
        let block_result = match file.arena.kind(site.block) {
            Some(NodeKind::Block { params, body, .. }) => Some(self.check_block(site.block, params, body, &param_types)),
            Some(NodeKind::BlockPass { value }) => self.check_block_pass(site.block, *value, &param_types),
            _ => None,
        };
        if let Some(result) = block_result {
            self.unify(block_shape.return_type, result, generics, bindings);
            let subst = self.bindings_substitution(generics, bindings);
            let expected = self.instantiate(block_shape.return_type, &subst);
            if !self.is_assignable(result, expected) {
                self.error_not_assignable(site.block, result, expected);
            }
        }
    }

    /// `&:name` calls `name` on the first block argument; `&callable`
    /// passes a proc.
    fn check_block_pass(&mut self, node: NodeIndex, value: NodeIndex, params: &[ParamInfo]) -> Option<TypeId> {
        let file = self.ctx.file;
        if let Some(NodeKind::Symbol { name }) = file.arena.kind(value) {
            self.check_expr(value);
            let receiver = params.first().map_or(TypeId::ANY, |p| p.ty);
            let (pos, end) = file.arena.span(value);
            let site = CallSite {
                node,
                receiver: NodeIndex::NONE,
                name,
                pos,
                end,
                args: &[],
                block: NodeIndex::NONE,
                safe_nav: false,
            };
            let result = self.call_on(&site, receiver, &[]);
            let proc_ty = self.ctx.interner.proc_type(vec![receiver], result);
            self.record_type(node, proc_ty);
            return Some(result);
        }
        let ty = self.check_expr(value);
        self.record_type(node, ty);
        self.ctx.table.signature_shape(ty).map(|shape| shape.return_type)
    }

    /// A block the callee does not describe: parameters are `Any`.
    pub(crate) fn check_untyped_block(&mut self, site: &CallSite<'_>) {
        let file = self.ctx.file;
        match file.arena.kind(site.block) {
            Some(NodeKind::Block { params, body, .. }) => {
                self.check_block(site.block, params, body, &[]);
            }
            Some(NodeKind::BlockPass { value }) => {
                let ty = self.check_expr(*value);
                self.record_type(site.block, ty);
            }
            _ => {}
        }
    }

    /// Type a `{ |params| body }` block given the types the callee passes,
    /// returning the type of the block's result.
    pub(crate) fn check_block(
        &mut self,
        node: NodeIndex,
        params: &[Param],
        body: &[NodeIndex],
        passed: &[ParamInfo],
    ) -> TypeId {
        self.push_frame(Frame::new(FrameKind::Block, "block"));
        let self_ty = self.self_type();
        self.push_scope(ScopeKind::Block, self_ty);
        let param_types = self.declare_block_params(params, passed);
        let before = self.ctx.facts.clone();
        let body_ty = self.check_statements(body);
        self.ctx.facts = before.join(&self.ctx.facts);
        self.pop_scope();
        let frame = self.pop_frame();

        let mut results = vec![body_ty];
        if let Some(frame) = frame {
            results.extend(frame.exits.iter().map(|(ty, _)| *ty));
        }
        let result = self.ctx.interner.union(results);
        let proc_ty = self.ctx.interner.proc_type(param_types, result);
        self.record_type(node, proc_ty);
        result
    }

    /// Declare block or lambda parameters. A single parameter receiving
    /// several values gets them as an array; several parameters receiving
    /// one array destructure it.
    fn declare_block_params(&mut self, params: &[Param], passed: &[ParamInfo]) -> Vec<TypeId> {
        let interner = self.ctx.interner;
        let positional: Vec<&Param> = params
            .iter()
            .filter(|p| matches!(p.kind, SyntaxParamKind::Positional))
            .collect();
        let passed_positional: Vec<&ParamInfo> = passed.iter().filter(|p| p.kind != ParamKind::Rest).collect();
        let passed_rest = passed.iter().find(|p| p.kind == ParamKind::Rest).map(|p| p.ty);

        let mut slots: Vec<TypeId> = passed_positional.iter().map(|p| p.ty).collect();
        if positional.len() == 1 && slots.len() > 1 {
            let element = interner.union(slots.clone());
            slots = vec![interner.array(element)];
        } else if positional.len() > 1
            && let [only] = slots.as_slice()
            && let Some(element) = array_element_type(interner, *only)
        {
            slots = vec![element; positional.len()];
        }

        let mut declared_types = Vec::with_capacity(params.len());
        let mut index = 0;
        for param in params {
            let annotated = param.ty.as_ref().map(|ty| self.resolve_annotation(ty));
            let slot = if param.kind == SyntaxParamKind::Positional {
                index += 1;
                slots.get(index - 1).copied().or(passed_rest)
            } else {
                None
            };
            let base = annotated.or(slot).unwrap_or(TypeId::ANY);
            let ty = match param.kind {
                SyntaxParamKind::Rest => interner.array(base),
                SyntaxParamKind::KeywordRest => interner.hash(TypeId::SYMBOL, base),
                _ => base,
            };
            if param.default.is_some() {
                let default_ty = self.check_expr_expected(param.default, Some(ty));
                if !self.fits(param.default, default_ty, ty) {
                    self.error_not_assignable(param.default, default_ty, ty);
                }
            }
            self.declare_local(&param.name, annotated, ty, (param.pos, param.end), true);
            if param.kind == SyntaxParamKind::Positional {
                declared_types.push(ty);
            }
        }
        declared_types
    }

    /// `->(x) { ... }` and `lambda { |x| ... }`. `return` inside leaves the
    /// lambda.
    pub(crate) fn check_lambda(
        &mut self,
        node: NodeIndex,
        params: &[Param],
        body: &[NodeIndex],
        expected: Option<TypeId>,
    ) -> TypeId {
        let passed: Vec<ParamInfo> = expected
            .and_then(|ty| self.ctx.table.signature_shape(ty))
            .map(|shape| shape.params.clone())
            .unwrap_or_default();
        self.push_frame(Frame::new(FrameKind::Lambda, "lambda"));
        let self_ty = self.self_type();
        self.push_scope(ScopeKind::Block, self_ty);
        let param_types = self.declare_block_params(params, &passed);
        let before = self.ctx.facts.clone();
        let body_ty = self.check_statements(body);
        self.ctx.facts = before.join(&self.ctx.facts);
        self.pop_scope();
        let frame = self.pop_frame();
        let mut results = vec![body_ty];
        if let Some(frame) = frame {
            results.extend(frame.exits.iter().map(|(ty, _)| *ty));
        }
        let result = self.ctx.interner.union(results);
        let result = trc_solver::widen_literal(self.ctx.interner, result);
        let proc_ty = self.ctx.interner.proc_type(param_types, result);
        self.record_type(node, proc_ty)
    }

    // =========================================================================
    // yield and super
    // =========================================================================

    pub(crate) fn check_yield(&mut self, args: &[NodeIndex]) -> TypeId {
        let arg_types = self.check_arguments(args);
        if let Some(id) = self.method_frame().and_then(|frame| frame.block_param) {
            self.ctx.scopes.mark_read(id);
        }
        let block = self.method_frame().and_then(|frame| frame.block);
        let Some(shape) = block.and_then(|b| self.ctx.table.signature_shape(b)) else {
            return TypeId::ANY;
        };
        for (i, (&arg, &ty)) in args.iter().zip(arg_types.iter()).enumerate() {
            let Some(param) = shape.params.get(i) else {
                break;
            };
            if param.kind == ParamKind::Rest {
                break;
            }
            if !self.fits(arg, ty, param.ty) {
                self.error_argument_not_assignable(arg, ty, "block", param.ty);
            }
        }
        shape.return_type
    }

    /// `super` calls the same method one step up the superclass chain.
    /// A bare `super` forwards the method's own arguments unchanged.
    pub(crate) fn check_super(
        &mut self,
        node: NodeIndex,
        args: &[NodeIndex],
        has_parens: bool,
        block: NodeIndex,
    ) -> TypeId {
        let arg_types = self.check_arguments(args);
        let table = self.ctx.table;
        let Some(method) = self.method_frame().and_then(|frame| frame.method) else {
            return TypeId::ANY;
        };
        let Some(info) = table.method(method) else {
            return TypeId::ANY;
        };
        let Some(owner) = info.owner else {
            return TypeId::ANY;
        };
        let superclass = table
            .class(owner)
            .and_then(|class| class.superclass)
            .and_then(|sup| table.class_and_args(sup));
        let self_ty = self.self_type();
        let found = superclass.and_then(|(sup, sup_args)| {
            if info.singleton {
                table.lookup_singleton_method(sup, info.name)
            } else {
                table.lookup_method_in_class(sup, &sup_args, info.name, self_ty)
            }
        });
        let name = self.ctx.interner.resolve_atom(info.name);
        let (pos, end) = self.ctx.file.arena.span(node);
        let site = CallSite {
            node,
            receiver: NodeIndex::NONE,
            name: &name,
            pos,
            end,
            args,
            block,
            safe_nav: false,
        };
        match found {
            Some(found) if has_parens || !args.is_empty() => self.apply_signature(&site, &found, &arg_types),
            Some(found) => {
                let Some(shape) = table.signature_shape(found.signature) else {
                    return TypeId::ANY;
                };
                self.check_untyped_block(&site);
                if table.method(found.id).is_some_and(|m| m.needs_inference()) {
                    let inferred = self.infer_method_return(found.id);
                    self.instantiate(inferred, &found.substitution)
                } else {
                    shape.return_type
                }
            }
            None => {
                self.check_untyped_block(&site);
                TypeId::ANY
            }
        }
    }
}
