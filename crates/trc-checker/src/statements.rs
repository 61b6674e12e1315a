//! Declarations and statements: class bodies, method bodies, assignments
//! and control flow.

use trc_binder::{DeclarationTable, ScopeKind};
use trc_common::diagnostics::diagnostic_codes;
use trc_common::options::CheckName;
use trc_parser::{
    AssignOp, AttrItem, IfForm, MethodDecl, NodeIndex, NodeKind, ParamKind as SyntaxParamKind, RescueClause,
    TypeExpr, Visibility, WhenClause,
};
use trc_solver::types::ParamKind;
use trc_solver::{
    TypeId, array_element_type, contains_nil, falsy_type, remove_nil, substitute_self_type, truthy_type,
    widen_literal,
};
use tracing::{debug, debug_span};

use crate::calls::CallSite;
use crate::context::{Frame, FrameKind};
use crate::flow::FlowFacts;
use crate::infer::DeclState;
use crate::state::CheckerState;

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Classes and modules
    // =========================================================================

    pub(crate) fn check_class_body(&mut self, name: &str, body: &[NodeIndex]) -> TypeId {
        let qualified = DeclarationTable::qualify(&self.ctx.namespace, name);
        let class = self.atom(&qualified);
        let type_params = self
            .ctx
            .table
            .class(class)
            .map(|info| info.type_params.clone())
            .unwrap_or_default();

        let namespace = std::mem::replace(&mut self.ctx.namespace, qualified);
        let class_type_params = std::mem::replace(&mut self.ctx.class_type_params, type_params);
        let facts = std::mem::take(&mut self.ctx.facts);
        self.ctx.class_stack.push(class);
        self.push_scope(ScopeKind::Class, self.ctx.interner.singleton(class));

        self.check_statements(body);

        self.pop_scope();
        self.ctx.class_stack.pop();
        self.ctx.facts = facts;
        self.ctx.class_type_params = class_type_params;
        self.ctx.namespace = namespace;
        TypeId::NIL
    }

    /// `@name: Type = value` in a class body.
    pub(crate) fn check_ivar_decl(&mut self, name: &str, value: NodeIndex) -> TypeId {
        if value.is_none() {
            return TypeId::NIL;
        }
        let declared = self
            .ctx
            .current_class()
            .and_then(|class| self.ctx.table.ivar(class, self.atom(name)))
            .map(|info| info.ty);
        let value_ty = self.check_expr_expected(value, declared);
        if let Some(declared) = declared
            && !self.fits(value, value_ty, declared)
        {
            self.error_not_assignable(value, value_ty, declared);
        }
        TypeId::NIL
    }

    pub(crate) fn check_attr(&mut self, items: &[AttrItem]) -> TypeId {
        if self.ctx.file_id.is_prelude() {
            return TypeId::NIL;
        }
        for item in items.iter().filter(|item| item.ty.is_none()) {
            self.report_check(
                CheckName::NoImplicitAny,
                item.pos,
                item.end,
                diagnostic_codes::IMPLICIT_ANY_ATTRIBUTE,
                &[&item.name],
            );
        }
        TypeId::NIL
    }

    // =========================================================================
    // Methods
    // =========================================================================

    /// Check a method body and its returns. For a method without a return
    /// annotation, the result is its inferred return type.
    pub(crate) fn check_method(&mut self, node: NodeIndex, decl: &MethodDecl) -> TypeId {
        let _span = debug_span!("method", name = %decl.name).entered();
        let table = self.ctx.table;
        let interner = self.ctx.interner;
        let id = table.method_for_node(self.ctx.file_id, node);
        let info = id.and_then(|id| table.method(id));
        let shape = info.and_then(|info| table.signature_shape(info.signature));

        let owner = info.and_then(|info| info.owner).or_else(|| self.ctx.current_class());
        let instance_self = owner
            .and_then(|owner| table.class(owner))
            .map_or_else(|| self.object_type(), |class| class.self_type(interner));
        let self_ty = match owner {
            Some(owner) if decl.singleton => interner.singleton(owner),
            _ => instance_self,
        };

        let needs_inference = info.is_some_and(|info| info.needs_inference());
        let owns_inference = match id {
            Some(id) if needs_inference && self.ctx.inference.method_state(id) == DeclState::Unchecked => {
                self.ctx.inference.set_method_state(id, DeclState::Checking);
                true
            }
            _ => false,
        };

        let mut frame = Frame::new(FrameKind::Method, decl.name.clone());
        frame.method = id;
        frame.block = shape.as_ref().and_then(|shape| shape.block);
        frame.type_params = decl.type_params.iter().map(|p| self.atom(&p.name)).collect();
        self.push_frame(frame);
        self.push_scope(ScopeKind::Method, self_ty);
        let facts = std::mem::take(&mut self.ctx.facts);

        let name_end = decl.name_pos + decl.name.len() as u32;
        if !decl.signature_only {
            self.declare_method_params(decl, shape.as_ref().map(|shape| shape.params.as_slice()));
        }
        let body_ty = if decl.signature_only {
            TypeId::NIL
        } else {
            self.check_statements(&decl.body)
        };

        let frame = self.pop_frame();
        let mut exits = frame.map(|frame| frame.exits).unwrap_or_default();
        if !decl.signature_only && body_ty != TypeId::NEVER {
            let last = decl.body.last().copied().unwrap_or(NodeIndex::NONE);
            exits.push((body_ty, last));
        }

        let mut result = shape.as_ref().map_or(TypeId::ANY, |shape| shape.return_type);
        if info.is_some_and(|info| info.has_return_annotation) {
            let declared = substitute_self_type(interner, result, instance_self);
            if !decl.signature_only {
                self.check_method_returns(decl, declared, &exits, name_end);
            }
        } else if let Some(id) = id
            && needs_inference
        {
            let inferred = if exits.is_empty() {
                TypeId::NIL
            } else {
                widen_literal(interner, interner.union(exits.iter().map(|(ty, _)| *ty).collect()))
            };
            result = if owns_inference {
                self.ctx.inference.complete_method(id, inferred)
            } else {
                match self.ctx.inference.method_state(id) {
                    DeclState::Checked(ty) | DeclState::CheckedWithErrors(ty) => ty,
                    _ => inferred,
                }
            };
            self.ctx.types.method_returns.insert(id, result);
            if self.ctx.inference.is_circular(id) {
                self.error_at_span(decl.name_pos, name_end, diagnostic_codes::CIRCULAR_INFERENCE, &[&decl.name]);
            }
        }

        let visibility = info.map_or(decl.visibility, |info| info.visibility);
        if decl.return_type.is_none()
            && visibility == Visibility::Public
            && decl.name != "initialize"
            && !decl.signature_only
            && !self.ctx.file_id.is_prelude()
        {
            self.report_check(
                CheckName::RequireReturnTypes,
                decl.name_pos,
                name_end,
                diagnostic_codes::MISSING_RETURN_TYPE,
                &[&decl.name],
            );
        }

        self.ctx.facts = facts;
        self.pop_scope();
        debug!(result = %self.format_type(result), "method checked");
        result
    }

    fn declare_method_params(&mut self, decl: &MethodDecl, params: Option<&[trc_solver::ParamInfo]>) {
        let interner = self.ctx.interner;
        let block = self.method_frame().and_then(|frame| frame.block);
        let report_implicit_any = !self.ctx.file_id.is_prelude();
        let mut typed = params.unwrap_or_default().iter();
        for param in &decl.params {
            let ty = if param.kind == SyntaxParamKind::Block {
                block.unwrap_or(TypeId::ANY)
            } else {
                let info = typed.next();
                let element = info.map_or(TypeId::ANY, |info| info.ty);
                match info.map(|info| info.kind) {
                    Some(ParamKind::Rest) => interner.array(element),
                    Some(ParamKind::KeywordRest) => interner.hash(TypeId::SYMBOL, element),
                    _ => element,
                }
            };
            if param.default.is_some() {
                let default_ty = self.check_expr_expected(param.default, Some(ty));
                if !self.fits(param.default, default_ty, ty) {
                    self.error_not_assignable(param.default, default_ty, ty);
                }
            }
            if param.ty.is_none() && param.kind != SyntaxParamKind::Block && report_implicit_any {
                self.report_check(
                    CheckName::NoImplicitAny,
                    param.pos,
                    param.end,
                    diagnostic_codes::IMPLICIT_ANY_PARAMETER,
                    &[&param.name],
                );
            }
            let declared = param.ty.as_ref().map(|_| ty);
            let id = self.declare_local(&param.name, declared, ty, (param.pos, param.end), true);
            if param.kind == SyntaxParamKind::Block
                && let Some(frame) = self.ctx.frames.iter_mut().rev().find(|f| f.kind == FrameKind::Method)
            {
                frame.block_param = Some(id);
            }
        }
    }

    /// Check every way out of a method against its declared return type.
    ///
    /// Under `strict_nil` a body that may produce `nil` for a non-nil
    /// return type is reported once, at the method name; the non-nil part
    /// of each exit is then checked on its own.
    fn check_method_returns(&mut self, decl: &MethodDecl, declared: TypeId, exits: &[(TypeId, NodeIndex)], name_end: u32) {
        if decl.name == "initialize" || declared == TypeId::VOID || declared.is_any_like() {
            return;
        }
        let interner = self.ctx.interner;
        let guard_nil = self.ctx.strict_nil && !contains_nil(interner, declared);
        if guard_nil
            && exits
                .iter()
                .any(|&(ty, node)| contains_nil(interner, ty) && !self.is_unchecked_index(node))
        {
            let declared_text = self.format_type(declared);
            self.report_check(
                CheckName::StrictNil,
                decl.name_pos,
                name_end,
                diagnostic_codes::NIL_NOT_IN_RETURN_TYPE,
                &[&decl.name, &declared_text],
            );
        }
        for &(ty, node) in exits {
            if node.is_some() && self.is_unchecked_index(node) && contains_nil(interner, ty) {
                if !self.fits(node, ty, declared) {
                    self.error_not_assignable(node, ty, declared);
                }
                continue;
            }
            let ty = if guard_nil { remove_nil(interner, ty) } else { ty };
            if ty == TypeId::NEVER || self.is_assignable(ty, declared) {
                continue;
            }
            let source = self.format_type(ty);
            let target = self.format_type(declared);
            let args: [&str; 3] = [&decl.name, &source, &target];
            if node.is_some() {
                self.error_at_node(node, diagnostic_codes::RETURN_TYPE_MISMATCH, &args);
            } else {
                self.error_at_span(decl.name_pos, name_end, diagnostic_codes::RETURN_TYPE_MISMATCH, &args);
            }
        }
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    pub(crate) fn check_typed_local(&mut self, node: NodeIndex, name: &str, ty: &TypeExpr, value: NodeIndex) -> TypeId {
        let declared = self.resolve_annotation(ty);
        let (pos, _) = self.ctx.file.arena.span(node);
        let value_ty = if value.is_some() {
            let value_ty = self.check_expr_expected(value, Some(declared));
            if !self.fits(value, value_ty, declared) {
                self.error_not_assignable(value, value_ty, declared);
            }
            Some(value_ty)
        } else {
            None
        };
        self.ctx.facts.kill(name);
        self.declare_local(name, Some(declared), declared, (pos, pos + name.len() as u32), false);
        let interner = self.ctx.interner;
        if let Some(value_ty) = value_ty
            && contains_nil(interner, declared)
            && !contains_nil(interner, value_ty)
            && !value_ty.is_any_like()
        {
            self.ctx.facts.set(name.to_string(), remove_nil(interner, declared));
        }
        declared
    }

    pub(crate) fn check_assign(&mut self, target: NodeIndex, value: NodeIndex) -> TypeId {
        let expected = self.declared_target_type(target);
        let value_ty = self.check_expr_expected(value, expected);
        self.assign_to(target, value, value_ty);
        value_ty
    }

    /// The declared type of an assignment target, which types the value.
    fn declared_target_type(&self, target: NodeIndex) -> Option<TypeId> {
        match self.ctx.file.arena.kind(target)? {
            NodeKind::Identifier { name } => {
                let id = self.ctx.scopes.lookup(name)?;
                self.ctx.scopes.get(id)?.declared
            }
            NodeKind::InstanceVar { name } => {
                let class = self.ctx.current_class()?;
                let info = self.ctx.table.ivar(class, self.atom(name))?;
                info.declared.then_some(info.ty)
            }
            _ => None,
        }
    }

    /// Store a value of type `ty` (computed from `value`) into `target`.
    fn assign_to(&mut self, target: NodeIndex, value: NodeIndex, ty: TypeId) {
        let file = self.ctx.file;
        match file.arena.kind(target) {
            Some(NodeKind::Identifier { name }) => self.assign_local(target, name, value, ty),
            Some(NodeKind::InstanceVar { name }) => self.assign_ivar(name, value, ty),
            Some(NodeKind::Index { receiver, args }) => {
                let receiver_ty = self.check_expr(*receiver);
                let mut arg_types = self.check_arguments(args);
                arg_types.push(ty);
                let all: Vec<NodeIndex> = args.iter().copied().chain([value]).collect();
                let (pos, end) = file.arena.span(target);
                let site = CallSite {
                    node: target,
                    receiver: *receiver,
                    name: "[]=",
                    pos,
                    end,
                    args: &all,
                    block: NodeIndex::NONE,
                    safe_nav: false,
                };
                self.call_on(&site, receiver_ty, &arg_types);
                self.kill_facts_for_target(target);
            }
            Some(NodeKind::Call(call)) if call.receiver.is_some() => {
                let receiver_ty = self.check_expr(call.receiver);
                let setter = format!("{}=", call.method);
                let args = [value];
                let site = CallSite {
                    node: target,
                    receiver: call.receiver,
                    name: &setter,
                    pos: call.method_pos,
                    end: call.method_pos + call.method.len() as u32,
                    args: &args,
                    block: NodeIndex::NONE,
                    safe_nav: call.safe_nav,
                };
                self.call_on(&site, receiver_ty, &[ty]);
                self.kill_facts_for_target(target);
            }
            Some(NodeKind::Splat { value: inner }) => {
                let array = self.ctx.interner.array(ty);
                self.assign_to(*inner, value, array);
            }
            _ => self.kill_facts_for_target(target),
        }
        self.record_type(target, ty);
    }

    fn assign_local(&mut self, target: NodeIndex, name: &str, value: NodeIndex, ty: TypeId) {
        let interner = self.ctx.interner;
        let Some(id) = self.ctx.scopes.lookup(name) else {
            let span = self.ctx.file.arena.span(target);
            self.declare_local(name, None, widen_literal(interner, ty), span, false);
            return;
        };
        self.ctx.facts.kill(name);
        // An unannotated local keeps the type of its first assignment.
        let Some(slot) = self
            .ctx
            .scopes
            .get(id)
            .map(|symbol| symbol.declared.unwrap_or(symbol.ty))
        else {
            return;
        };
        if !self.fits(value, ty, slot) {
            self.error_not_assignable(value, ty, slot);
        } else if contains_nil(interner, slot) && !contains_nil(interner, ty) && !ty.is_any_like() {
            self.ctx.facts.set(name.to_string(), remove_nil(interner, slot));
        }
    }

    /// Declared ivars check the value; undeclared ones accumulate the
    /// union of everything assigned to them.
    fn assign_ivar(&mut self, name: &str, value: NodeIndex, ty: TypeId) {
        self.ctx.facts.kill(name);
        let Some(class) = self.ctx.current_class() else {
            return;
        };
        let atom = self.atom(name);
        if let Some(info) = self.ctx.table.ivar(class, atom)
            && info.declared
        {
            if !self.fits(value, ty, info.ty) {
                self.error_not_assignable(value, ty, info.ty);
            }
            return;
        }
        let interner = self.ctx.interner;
        let widened = widen_literal(interner, ty);
        self.ctx
            .types
            .ivar_types
            .entry((class, atom))
            .and_modify(|existing| *existing = interner.union2(*existing, widened))
            .or_insert(widened);
    }

    /// `x ||= v`, `x &&= v` and `x op= v`.
    pub(crate) fn check_op_assign(&mut self, node: NodeIndex, target: NodeIndex, op: AssignOp, value: NodeIndex) -> TypeId {
        let interner = self.ctx.interner;
        let current = self.read_target(target);
        let result = match op {
            AssignOp::Or => {
                let value_ty = self.check_expr(value);
                interner.union2(truthy_type(interner, current), value_ty)
            }
            AssignOp::And => {
                let value_ty = self.check_expr(value);
                interner.union2(falsy_type(interner, current), value_ty)
            }
            _ => {
                let value_ty = self.check_expr(value);
                self.binary_result(node, target, current, op.binary(), value, value_ty)
            }
        };
        self.assign_to(target, value, result);
        result
    }

    /// Current value of an op-assign target. An unassigned local reads as
    /// `nil`.
    fn read_target(&mut self, target: NodeIndex) -> TypeId {
        let file = self.ctx.file;
        match file.arena.kind(target) {
            Some(NodeKind::Identifier { name }) => match self.ctx.scopes.lookup(name) {
                Some(id) => {
                    self.ctx.scopes.mark_read(id);
                    let ty = self.ctx.scopes.get(id).map_or(TypeId::ANY, |symbol| symbol.ty);
                    self.ctx.facts.get(name).unwrap_or(ty)
                }
                None => TypeId::NIL,
            },
            _ => self.check_expr(target),
        }
    }

    pub(crate) fn check_multi_assign(&mut self, targets: &[NodeIndex], value: NodeIndex) -> TypeId {
        let value_ty = self.check_expr(value);
        let file = self.ctx.file;
        let interner = self.ctx.interner;
        let literal: Option<Vec<TypeId>> = match file.arena.kind(value) {
            Some(NodeKind::Array { elements })
                if !elements
                    .iter()
                    .any(|&e| matches!(file.arena.kind(e), Some(NodeKind::Splat { .. }))) =>
            {
                Some(
                    elements
                        .iter()
                        .map(|&e| self.ctx.types.node_type(e).unwrap_or(TypeId::ANY))
                        .collect(),
                )
            }
            _ => None,
        };
        let element = array_element_type(interner, value_ty);

        for (i, &target) in targets.iter().enumerate() {
            let ty = if let Some(NodeKind::Splat { value: inner }) = file.arena.kind(target) {
                let rest = match &literal {
                    Some(types) => interner.union(types.iter().skip(i).copied().collect()),
                    None => element.unwrap_or(TypeId::ANY),
                };
                let array = interner.array(rest);
                self.assign_to(*inner, value, array);
                self.record_type(target, array);
                continue;
            } else {
                match (&literal, element) {
                    (Some(types), _) => types.get(i).copied().unwrap_or(TypeId::NIL),
                    (None, Some(element)) => element,
                    (None, None) if i == 0 => value_ty,
                    (None, None) => TypeId::NIL,
                }
            };
            self.assign_to(target, value, ty);
        }
        value_ty
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    pub(crate) fn check_if(
        &mut self,
        condition: NodeIndex,
        then_branch: &[NodeIndex],
        else_branch: &[NodeIndex],
        form: IfForm,
    ) -> TypeId {
        self.check_expr(condition);
        let holds = !matches!(form, IfForm::Unless | IfForm::UnlessModifier);
        let before = self.ctx.facts.clone();

        self.assume_condition(condition, holds);
        let then_ty = self.check_statements(then_branch);
        let then_facts = std::mem::replace(&mut self.ctx.facts, before.clone());

        self.assume_condition(condition, !holds);
        let else_ty = self.check_statements(else_branch);
        let else_facts = std::mem::take(&mut self.ctx.facts);

        self.ctx.facts = merge_branch_facts(before, [(then_ty, then_facts), (else_ty, else_facts)]);
        self.ctx.interner.union2(then_ty, else_ty)
    }

    pub(crate) fn check_while(&mut self, condition: NodeIndex, body: &[NodeIndex], until: bool) -> TypeId {
        self.check_expr(condition);
        let before = self.ctx.facts.clone();
        self.assume_condition(condition, !until);
        self.check_statements(body);
        self.ctx.facts = before.join(&self.ctx.facts);
        TypeId::NIL
    }

    pub(crate) fn check_case(
        &mut self,
        subject: NodeIndex,
        whens: &[WhenClause],
        else_branch: Option<&[NodeIndex]>,
    ) -> TypeId {
        if subject.is_some() {
            self.check_expr(subject);
        }
        let before = self.ctx.facts.clone();
        let mut branches = Vec::with_capacity(whens.len() + 1);
        for when in whens {
            self.ctx.facts = before.clone();
            for &value in &when.values {
                self.check_expr(value);
            }
            if subject.is_some() {
                self.assume_when_classes(subject, &when.values);
            } else if let [condition] = when.values.as_slice() {
                self.assume_condition(*condition, true);
            }
            let ty = self.check_statements(&when.body);
            branches.push((ty, std::mem::take(&mut self.ctx.facts)));
        }
        self.ctx.facts = before.clone();
        let else_ty = match else_branch {
            Some(body) => self.check_statements(body),
            None => TypeId::NIL,
        };
        branches.push((else_ty, std::mem::take(&mut self.ctx.facts)));

        let ty = self.ctx.interner.union(branches.iter().map(|(ty, _)| *ty).collect());
        self.ctx.facts = merge_branch_facts(before, branches);
        ty
    }

    pub(crate) fn check_begin(
        &mut self,
        body: &[NodeIndex],
        rescues: &[RescueClause],
        else_branch: Option<&[NodeIndex]>,
        ensure: Option<&[NodeIndex]>,
    ) -> TypeId {
        let before = self.ctx.facts.clone();
        let body_ty = self.check_statements(body);
        let main_ty = match else_branch {
            Some(else_branch) => self.check_statements(else_branch),
            None => body_ty,
        };
        let mut types = vec![main_ty];
        for rescue in rescues {
            self.ctx.facts = before.clone();
            let exception = self.rescued_type(rescue);
            if let Some(binding) = &rescue.binding {
                self.bind_rescue(binding, exception, rescue.pos);
            }
            types.push(self.check_statements(&rescue.body));
        }
        if !rescues.is_empty() {
            self.ctx.facts = before.join(&self.ctx.facts);
        }
        if let Some(ensure) = ensure {
            self.check_statements(ensure);
        }
        self.ctx.interner.union(types)
    }

    /// Exception type a rescue clause binds: its classes, or
    /// `StandardError` when it names none.
    fn rescued_type(&mut self, rescue: &RescueClause) -> TypeId {
        let mut classes = Vec::with_capacity(rescue.classes.len());
        for &class in &rescue.classes {
            self.check_expr(class);
            if let Some(instance) = self.class_instance_for_constant(class) {
                classes.push(instance);
            }
        }
        if classes.is_empty() {
            return self.ctx.interner.instance_named("StandardError", Vec::new());
        }
        self.ctx.interner.union(classes)
    }

    fn bind_rescue(&mut self, name: &str, exception: TypeId, pos: u32) {
        self.ctx.facts.kill(name);
        match self.ctx.scopes.lookup(name) {
            Some(id) => {
                let interner = self.ctx.interner;
                if let Some(symbol) = self.ctx.scopes.get_mut(id)
                    && symbol.declared.is_none()
                {
                    symbol.ty = interner.union2(symbol.ty, exception);
                }
                self.ctx.facts.set(name.to_string(), exception);
            }
            None => {
                self.declare_local(name, None, exception, (pos, pos + "rescue".len() as u32), false);
            }
        }
    }

    pub(crate) fn check_return(&mut self, node: NodeIndex, value: NodeIndex) -> TypeId {
        let expected = self.return_frame().and_then(|frame| frame.method).and_then(|id| {
            let info = self.ctx.table.method(id)?;
            if !info.has_return_annotation {
                return None;
            }
            self.ctx
                .table
                .signature_shape(info.signature)
                .map(|shape| shape.return_type)
        });
        let ty = self.check_expr_expected(value, expected);
        let exit = if value.is_some() { value } else { node };
        if let Some(frame) = self.return_frame() {
            frame.exits.push((ty, exit));
        }
        TypeId::NEVER
    }

    pub(crate) fn check_next(&mut self, node: NodeIndex, value: NodeIndex) -> TypeId {
        let ty = self.check_expr(value);
        let exit = if value.is_some() { value } else { node };
        if let Some(frame) = self.next_frame() {
            frame.exits.push((ty, exit));
        }
        TypeId::NEVER
    }
}

/// Facts after a branching construct. Branches that always exit contribute
/// nothing; when every branch exits, what held before still holds.
pub(crate) fn merge_branch_facts(
    before: FlowFacts,
    branches: impl IntoIterator<Item = (TypeId, FlowFacts)>,
) -> FlowFacts {
    branches
        .into_iter()
        .filter(|(ty, _)| *ty != TypeId::NEVER)
        .map(|(_, facts)| facts)
        .reduce(|joined, facts| joined.join(&facts))
        .unwrap_or(before)
}
