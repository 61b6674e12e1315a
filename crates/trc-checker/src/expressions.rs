//! Expression typing.
//!
//! `check_expr` is the single entry point for every node: declarations and
//! statements dispatch to `statements.rs`, calls to `calls.rs`. Each visited
//! node gets its type recorded in the type cache, after any narrowing fact
//! for the node's reference key has been applied.

use trc_binder::constant_path;
use trc_common::diagnostics::diagnostic_codes;
use trc_common::limits::MAX_EXPR_CHECK_DEPTH;
use trc_parser::{BinaryOp, HashEntry, HashKey, NodeIndex, NodeKind, StringPart, UnaryOp};
use trc_solver::types::{RecordField, TypeKey};
use trc_solver::{
    TypeId, array_element_type, falsy_type, hash_key_value_types, record_fields, remove_nil,
    truthy_type, union_members, widen_literal,
};
use tracing::trace;

use crate::calls::CallSite;
use crate::state::CheckerState;

impl<'a> CheckerState<'a> {
    pub(crate) fn check_expr(&mut self, node: NodeIndex) -> TypeId {
        self.check_expr_expected(node, None)
    }

    /// Type a node, with `expected` guiding literals that carry no element
    /// type of their own (`[]`, `{}`, lambdas).
    pub(crate) fn check_expr_expected(&mut self, node: NodeIndex, expected: Option<TypeId>) -> TypeId {
        if node.is_none() {
            return TypeId::NIL;
        }
        if self.ctx.depth >= MAX_EXPR_CHECK_DEPTH {
            trace!(node = node.0, "expression nesting limit reached");
            return self.record_type(node, TypeId::ERROR);
        }
        self.ctx.depth += 1;
        let computed = self.compute_type(node, expected);
        self.ctx.depth -= 1;

        let ty = match self.fact_for(node) {
            Some(narrowed) => {
                self.ctx.unchecked_index_nodes.remove(&node);
                narrowed
            }
            None => computed,
        };
        self.record_type(node, ty)
    }

    /// Type of a statement list: the last statement's type, or `never` when
    /// some statement always exits.
    pub(crate) fn check_statements(&mut self, statements: &[NodeIndex]) -> TypeId {
        let mut last = TypeId::NIL;
        let mut exits = false;
        for &statement in statements {
            last = self.check_expr(statement);
            if last == TypeId::NEVER {
                exits = true;
            }
        }
        if exits { TypeId::NEVER } else { last }
    }

    fn compute_type(&mut self, node: NodeIndex, expected: Option<TypeId>) -> TypeId {
        let file = self.ctx.file;
        let Some(kind) = file.arena.kind(node) else {
            return TypeId::ANY;
        };
        let interner = self.ctx.interner;
        match kind {
            NodeKind::SourceFile { statements } => self.check_statements(statements),

            // Declarations
            NodeKind::TypeAlias { .. } | NodeKind::Interface { .. } | NodeKind::VisibilityMarker(_) => {
                TypeId::NIL
            }
            NodeKind::Class { name, body, .. } => self.check_class_body(name, body),
            NodeKind::Module { name, body } => self.check_class_body(name, body),
            NodeKind::Method(decl) => {
                self.check_method(node, decl);
                interner.literal_symbol(&decl.name)
            }
            NodeKind::IvarDecl { name, value, .. } => self.check_ivar_decl(name, *value),
            NodeKind::Attr { items, .. } => self.check_attr(items),

            // Statements
            NodeKind::TypedLocal { name, ty, value } => self.check_typed_local(node, name, ty, *value),
            NodeKind::Assign { target, value } => self.check_assign(*target, *value),
            NodeKind::OpAssign { target, op, value } => self.check_op_assign(node, *target, *op, *value),
            NodeKind::MultiAssign { targets, value } => self.check_multi_assign(targets, *value),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
                form,
            } => self.check_if(*condition, then_branch, else_branch, *form),
            NodeKind::While {
                condition,
                body,
                until,
                ..
            } => self.check_while(*condition, body, *until),
            NodeKind::Case {
                subject,
                whens,
                else_branch,
            } => self.check_case(*subject, whens, else_branch.as_deref()),
            NodeKind::CaseIn {
                subject,
                clauses,
                else_branch,
            } => self.check_case_in(*subject, clauses, else_branch.as_deref()),
            NodeKind::Begin {
                body,
                rescues,
                else_branch,
                ensure,
                ..
            } => self.check_begin(body, rescues, else_branch.as_deref(), ensure.as_deref()),
            NodeKind::Return { value } => self.check_return(node, *value),
            NodeKind::Next { value } => self.check_next(node, *value),
            NodeKind::Break { value } => {
                self.check_expr(*value);
                TypeId::NEVER
            }
            NodeKind::Yield { args, .. } => self.check_yield(args),

            // Literals
            NodeKind::Nil => TypeId::NIL,
            NodeKind::True => interner.literal_bool(true),
            NodeKind::False => interner.literal_bool(false),
            NodeKind::SelfRef => self.self_type(),
            NodeKind::Integer { value } => interner.literal_integer(*value),
            NodeKind::Float { .. } => interner.literal_float(file.node_text(node)),
            NodeKind::Str { parts, .. } => self.check_string(parts),
            NodeKind::Symbol { name } => interner.literal_symbol(name),
            NodeKind::Regex => interner.instance_named("Regexp", Vec::new()),
            NodeKind::Array { elements } => self.check_array_literal(elements, expected),
            NodeKind::Hash { entries, .. } => self.check_hash_literal(node, entries, expected),
            NodeKind::Range { start, end, .. } => {
                let mut bounds = Vec::with_capacity(2);
                for bound in [*start, *end] {
                    if bound.is_some() {
                        let ty = self.check_expr(bound);
                        bounds.push(widen_literal(interner, ty));
                    }
                }
                interner.range(interner.union(bounds))
            }

            // Names
            NodeKind::Identifier { name } => self.check_identifier(node, name),
            NodeKind::InstanceVar { name } => self.check_ivar_read(name),
            NodeKind::ClassVar { .. } | NodeKind::GlobalVar { .. } => TypeId::ANY,
            NodeKind::Constant { .. } => self.check_constant(node),

            // Calls
            NodeKind::Call(call) => self.check_call(node, call),
            NodeKind::Index { receiver, args } => self.check_index(node, *receiver, args),
            NodeKind::Super { args, has_parens, block } => self.check_super(node, args, *has_parens, *block),
            NodeKind::Block { .. } => TypeId::ANY,
            NodeKind::BlockPass { value } => self.check_expr(*value),
            NodeKind::Lambda { params, body, .. } => self.check_lambda(node, params, body, expected),

            // Operators
            NodeKind::Binary { op, left, right } => self.check_binary(node, *op, *left, *right),
            NodeKind::Unary { op, operand } => self.check_unary(node, *op, *operand),
            NodeKind::Paren { statements } => self.check_statements(statements),
            NodeKind::Splat { value } | NodeKind::DoubleSplat { value } => self.check_expr(*value),
            NodeKind::Error => TypeId::ANY,
        }
    }

    // =========================================================================
    // Literals
    // =========================================================================

    fn check_string(&mut self, parts: &[StringPart]) -> TypeId {
        let mut text = String::new();
        let mut interpolated = false;
        for part in parts {
            match part {
                StringPart::Text(chunk) => text.push_str(chunk),
                StringPart::Code(code) => {
                    self.check_expr(*code);
                    interpolated = true;
                }
            }
        }
        if interpolated {
            TypeId::STRING
        } else {
            self.ctx.interner.literal_string(&text)
        }
    }

    fn check_array_literal(&mut self, elements: &[NodeIndex], expected: Option<TypeId>) -> TypeId {
        let interner = self.ctx.interner;
        let expected_element = expected.and_then(|ty| array_element_type(interner, ty));
        if elements.is_empty() {
            return interner.array(expected_element.unwrap_or(TypeId::ANY));
        }
        let file = self.ctx.file;
        let mut members = Vec::with_capacity(elements.len());
        for &element in elements {
            let ty = self.check_expr_expected(element, expected_element);
            let ty = match file.arena.kind(element) {
                Some(NodeKind::Splat { .. }) => array_element_type(interner, ty).unwrap_or(TypeId::ANY),
                _ => ty,
            };
            members.push(widen_literal(interner, ty));
        }
        interner.array(interner.union(members))
    }

    /// `{ name: "x" }` is a record; keys that are not labels make a `Hash`.
    fn check_hash_literal(&mut self, node: NodeIndex, entries: &[HashEntry], expected: Option<TypeId>) -> TypeId {
        let interner = self.ctx.interner;
        if entries.is_empty() {
            let (key, value) = expected
                .and_then(|ty| hash_key_value_types(interner, ty))
                .unwrap_or((TypeId::ANY, TypeId::ANY));
            return interner.hash(key, value);
        }
        let expected_fields = expected.and_then(|ty| record_fields(interner, ty));
        let expected_value = expected.and_then(|ty| hash_key_value_types(interner, ty)).map(|(_, v)| v);

        let mut fields: Vec<RecordField> = Vec::new();
        let mut keys = Vec::new();
        let mut values = Vec::new();
        let mut is_record = true;
        for entry in entries {
            match &entry.key {
                HashKey::Label(name) | HashKey::Shorthand(name) => {
                    let atom = self.atom(name);
                    let field_expected = expected_fields
                        .as_ref()
                        .and_then(|fields| fields.iter().find(|f| f.name == atom))
                        .map(|f| f.ty)
                        .or(expected_value);
                    let ty = if matches!(entry.key, HashKey::Shorthand(_)) {
                        self.check_name_reference(name, entry.pos)
                    } else {
                        self.check_expr_expected(entry.value, field_expected)
                    };
                    let ty = widen_literal(interner, ty);
                    fields.retain(|f| f.name != atom);
                    fields.push(RecordField {
                        name: atom,
                        ty,
                        optional: false,
                    });
                    keys.push(TypeId::SYMBOL);
                    values.push(ty);
                }
                HashKey::Expr(key) => {
                    is_record = false;
                    let key_ty = self.check_expr(*key);
                    keys.push(widen_literal(interner, key_ty));
                    let value_ty = self.check_expr_expected(entry.value, expected_value);
                    values.push(widen_literal(interner, value_ty));
                }
                HashKey::DoubleSplat => {
                    let splatted = self.check_expr(entry.value);
                    if let Some(splat_fields) = record_fields(interner, splatted) {
                        for field in splat_fields {
                            keys.push(TypeId::SYMBOL);
                            values.push(field.ty);
                            fields.retain(|f| f.name != field.name);
                            fields.push(field);
                        }
                    } else {
                        is_record = false;
                        let (key, value) = self
                            .ctx
                            .table
                            .class_and_args(splatted)
                            .filter(|(_, args)| args.len() == 2)
                            .map_or((TypeId::ANY, TypeId::ANY), |(_, args)| (args[0], args[1]));
                        keys.push(key);
                        values.push(value);
                    }
                }
            }
        }
        trace!(node = node.0, record = is_record, "hash literal");
        if is_record {
            interner.record(fields)
        } else {
            interner.hash(interner.union(keys), interner.union(values))
        }
    }

    // =========================================================================
    // Names
    // =========================================================================

    fn check_identifier(&mut self, node: NodeIndex, name: &str) -> TypeId {
        if let Some(id) = self.ctx.scopes.lookup(name) {
            self.ctx.scopes.mark_read(id);
            return self.ctx.scopes.get(id).map_or(TypeId::ANY, |symbol| symbol.ty);
        }
        let (pos, end) = self.ctx.file.arena.span(node);
        let site = CallSite::receiverless(node, name, pos, end);
        self.check_receiverless_call(&site, false)
    }

    /// A bare name written at `pos` without its own node (hash shorthand
    /// `{ name: }`): a local if one is visible, else a call on `self`.
    pub(crate) fn check_name_reference(&mut self, name: &str, pos: u32) -> TypeId {
        if let Some(id) = self.ctx.scopes.lookup(name) {
            self.ctx.scopes.mark_read(id);
            return self.ctx.scopes.get(id).map_or(TypeId::ANY, |symbol| symbol.ty);
        }
        let end = pos + name.len() as u32;
        let site = CallSite::receiverless(NodeIndex::NONE, name, pos, end);
        self.check_receiverless_call(&site, false)
    }

    pub(crate) fn check_ivar_read(&mut self, name: &str) -> TypeId {
        let Some(class) = self.ctx.current_class() else {
            return TypeId::ANY;
        };
        let atom = self.atom(name);
        if let Some(info) = self.ctx.table.ivar(class, atom)
            && (info.declared || !self.ctx.types.ivar_types.contains_key(&(class, atom)))
        {
            return info.ty;
        }
        self.ctx
            .types
            .ivar_types
            .get(&(class, atom))
            .copied()
            .unwrap_or(TypeId::ANY)
    }

    fn check_constant(&mut self, node: NodeIndex) -> TypeId {
        let Some(path) = constant_path(&self.ctx.file.arena, node) else {
            if let Some(NodeKind::Constant { scope, .. }) = self.ctx.file.arena.kind(node) {
                self.check_expr(*scope);
            }
            return TypeId::ANY;
        };
        match self.ctx.table.lookup_constant(&path, &self.ctx.namespace) {
            Some(Ok(class)) => self.ctx.interner.singleton(class),
            Some(Err(id)) => self.constant_type(id),
            None => {
                self.error_at_node(node, diagnostic_codes::UNDEFINED_CONSTANT, &[&path]);
                TypeId::ANY
            }
        }
    }

    // =========================================================================
    // Index
    // =========================================================================

    fn check_index(&mut self, node: NodeIndex, receiver: NodeIndex, args: &[NodeIndex]) -> TypeId {
        let interner = self.ctx.interner;
        let receiver_ty = self.check_expr(receiver);

        if let Some(fields) = record_fields(interner, receiver_ty)
            && let [key] = args
            && let Some(NodeKind::Symbol { name }) = self.ctx.file.arena.kind(*key)
        {
            self.check_expr(*key);
            let atom = self.atom(name);
            return match fields.iter().find(|f| f.name == atom) {
                Some(field) if field.optional => interner.optional(field.ty),
                Some(field) => field.ty,
                None => {
                    let record = self.format_type(receiver_ty);
                    self.error_at_node(*key, diagnostic_codes::UNKNOWN_RECORD_KEY, &[name, &record]);
                    TypeId::ANY
                }
            };
        }

        let (pos, end) = self.ctx.file.arena.span(node);
        let arg_types = self.check_arguments(args);
        let site = CallSite {
            node,
            receiver,
            name: "[]",
            pos,
            end,
            args,
            block: NodeIndex::NONE,
            safe_nav: false,
        };
        let result = self.call_on(&site, receiver_ty, &arg_types);
        if self.ctx.unchecked_index && !result.is_any_like() && self.is_collection(receiver_ty) {
            self.ctx.unchecked_index_nodes.insert(node);
            return interner.optional(result);
        }
        result
    }

    /// `Array` and `Hash` receivers (records included), whose `[]` may miss.
    fn is_collection(&self, ty: TypeId) -> bool {
        let Some((class, _)) = self.ctx.table.class_and_args(ty) else {
            return false;
        };
        let name = self.ctx.interner.resolve_atom(class);
        matches!(&*name, "Array" | "Hash")
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn check_binary(&mut self, node: NodeIndex, op: BinaryOp, left: NodeIndex, right: NodeIndex) -> TypeId {
        let interner = self.ctx.interner;
        match op {
            BinaryOp::And | BinaryOp::AndWord | BinaryOp::Or | BinaryOp::OrWord => {
                let and = matches!(op, BinaryOp::And | BinaryOp::AndWord);
                let left_ty = self.check_expr(left);
                let before = self.ctx.facts.clone();
                self.assume_condition(left, and);
                let right_ty = self.check_expr(right);
                self.ctx.facts = before;
                let short_circuit = if and {
                    falsy_type(interner, left_ty)
                } else {
                    truthy_type(interner, left_ty)
                };
                interner.union2(short_circuit, right_ty)
            }
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::CaseEq | BinaryOp::NotMatch => {
                self.check_expr(left);
                self.check_expr(right);
                TypeId::BOOLEAN
            }
            _ => {
                let left_ty = self.check_expr(left);
                let right_ty = self.check_expr(right);
                self.binary_result(node, left, left_ty, op, right, right_ty)
            }
        }
    }

    /// Result of `left op right` with both operands already typed.
    pub(crate) fn binary_result(
        &mut self,
        node: NodeIndex,
        left: NodeIndex,
        left_ty: TypeId,
        op: BinaryOp,
        right: NodeIndex,
        right_ty: TypeId,
    ) -> TypeId {
        if let Some(ty) = self.numeric_result(op, left_ty, right_ty) {
            return ty;
        }
        let (pos, end) = self.ctx.file.arena.span(node);
        // A possibly-nil number reports the nil once and keeps its numeric type.
        let present = remove_nil(self.ctx.interner, left_ty);
        if present != left_ty
            && present != TypeId::NEVER
            && let Some(ty) = self.numeric_result(op, present, right_ty)
        {
            self.error_possibly_nil_receiver(left, pos, end, op.as_str(), left_ty);
            return ty;
        }
        let args = [right];
        let site = CallSite {
            node,
            receiver: left,
            name: op.as_str(),
            pos,
            end,
            args: &args,
            block: NodeIndex::NONE,
            safe_nav: false,
        };
        self.call_on(&site, left_ty, &[right_ty])
    }

    /// `Integer op Integer` stays `Integer`; a `Float` operand makes `Float`.
    /// Unions are taken member by member. An untyped right operand gives
    /// `Any`.
    fn numeric_result(&self, op: BinaryOp, left: TypeId, right: TypeId) -> Option<TypeId> {
        if !matches!(
            op,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow
        ) {
            return None;
        }
        let interner = self.ctx.interner;
        let numeric_members = |ty: TypeId| -> Option<Vec<TypeId>> {
            let members: Vec<TypeId> = union_members(interner, ty)
                .into_iter()
                .map(|member| widen_literal(interner, member))
                .collect();
            members
                .iter()
                .all(|m| matches!(*m, TypeId::INTEGER | TypeId::FLOAT))
                .then_some(members)
        };
        let lefts = numeric_members(left)?;
        if right.is_any_like() {
            return Some(right);
        }
        let rights = numeric_members(right)?;
        let mut results = Vec::with_capacity(2);
        for &l in &lefts {
            for &r in &rights {
                let ty = if l == TypeId::INTEGER && r == TypeId::INTEGER {
                    TypeId::INTEGER
                } else {
                    TypeId::FLOAT
                };
                if !results.contains(&ty) {
                    results.push(ty);
                }
            }
        }
        Some(interner.union(results))
    }

    fn check_unary(&mut self, node: NodeIndex, op: UnaryOp, operand: NodeIndex) -> TypeId {
        let operand_ty = self.check_expr(operand);
        match op {
            UnaryOp::Not | UnaryOp::NotWord => TypeId::BOOLEAN,
            UnaryOp::Neg | UnaryOp::Pos => {
                let widened = widen_literal(self.ctx.interner, operand_ty);
                match widened {
                    TypeId::INTEGER | TypeId::FLOAT => widened,
                    _ if widened.is_any_like() => widened,
                    _ => TypeId::ANY,
                }
            }
            UnaryOp::BitNot => {
                let (pos, end) = self.ctx.file.arena.span(node);
                let site = CallSite {
                    node,
                    receiver: operand,
                    name: "~",
                    pos,
                    end,
                    args: &[],
                    block: NodeIndex::NONE,
                    safe_nav: false,
                };
                self.call_on(&site, operand_ty, &[])
            }
        }
    }

    /// Whether `ty` is a proc or method type.
    pub(crate) fn is_function_type(&self, ty: TypeId) -> bool {
        matches!(self.ctx.interner.lookup(ty), Some(TypeKey::Function(_)))
    }
}
