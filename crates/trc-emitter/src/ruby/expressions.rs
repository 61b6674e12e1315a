//! Expressions, calls, blocks and literals.

use trc_parser::{CallData, HashEntry, HashKey, NodeIndex, NodeKind, Param};
use tracing::trace;

use super::RubyPrinter;

impl<'a> RubyPrinter<'a> {
    pub(crate) fn emit_expression(&mut self, node: NodeIndex) {
        let Some(kind) = self.arena.kind(node) else {
            return;
        };
        let end = self.arena.span(node).1;
        match kind {
            NodeKind::SourceFile { statements } => self.emit_statements(statements),

            // Declarations
            NodeKind::TypeAlias { .. } | NodeKind::Interface { .. } | NodeKind::Error => {}
            NodeKind::Class {
                name,
                superclass,
                body,
                ..
            } => self.emit_class(name, superclass.as_ref(), body, end),
            NodeKind::Module { name, body } => self.emit_module(name, body, end),
            NodeKind::Method(decl) => {
                if !decl.signature_only {
                    self.emit_method(decl, end);
                }
            }
            NodeKind::IvarDecl { name, value, .. } => {
                let synthesizes = self
                    .ivar_prologues
                    .last()
                    .is_some_and(|prologue| prologue.constructor_at == Some(node));
                if synthesizes {
                    self.emit_synthesized_initialize();
                } else if value.is_some() {
                    self.writer.write(name);
                    self.writer.write(" = ");
                    self.emit_expression(*value);
                }
            }
            NodeKind::Attr { kind, items } => self.emit_attr(*kind, items),
            NodeKind::VisibilityMarker(visibility) => self.writer.write(visibility.as_str()),

            // Statements
            NodeKind::TypedLocal { name, value, .. } => {
                self.writer.write(name);
                self.writer.write(" = ");
                if value.is_some() {
                    self.emit_expression(*value);
                } else {
                    self.writer.write("nil");
                }
            }
            NodeKind::Assign { target, value } => {
                self.emit_expression(*target);
                self.writer.write(" = ");
                self.emit_expression(*value);
            }
            NodeKind::OpAssign { target, op, value } => {
                self.emit_expression(*target);
                self.writer.write_space();
                self.writer.write(op.as_str());
                self.writer.write_space();
                self.emit_expression(*value);
            }
            NodeKind::MultiAssign { targets, value } => {
                self.emit_comma_list(targets);
                self.writer.write(" = ");
                self.emit_expression(*value);
            }
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
                form,
            } => self.emit_if(node, *condition, then_branch, else_branch, *form),
            NodeKind::While {
                condition,
                body,
                until,
                modifier,
            } => self.emit_while(node, *condition, body, *until, *modifier),
            NodeKind::Case {
                subject,
                whens,
                else_branch,
            } => self.emit_case(node, *subject, whens, else_branch.as_deref()),
            NodeKind::CaseIn {
                subject,
                clauses,
                else_branch,
            } => {
                if self.native_pattern_matching {
                    self.emit_native_case_in(*subject, clauses, else_branch.as_deref(), end);
                } else {
                    self.emit_lowered_case_in(*subject, clauses, else_branch.as_deref(), end, false);
                }
            }
            NodeKind::Begin {
                body,
                rescues,
                else_branch,
                ensure,
                implicit,
            } => self.emit_begin(
                node,
                body,
                rescues,
                else_branch.as_deref(),
                ensure.as_deref(),
                *implicit,
            ),
            NodeKind::Return { value } => self.emit_jump("return", *value),
            NodeKind::Break { value } => self.emit_jump("break", *value),
            NodeKind::Next { value } => self.emit_jump("next", *value),
            NodeKind::Yield { args, has_parens } => self.emit_yield(args, *has_parens),

            // Literals copied from source
            NodeKind::Integer { .. }
            | NodeKind::Float { .. }
            | NodeKind::Str { .. }
            | NodeKind::Symbol { .. }
            | NodeKind::Regex => self.writer.write(self.node_text(node)),
            NodeKind::Nil => self.writer.write("nil"),
            NodeKind::True => self.writer.write("true"),
            NodeKind::False => self.writer.write("false"),
            NodeKind::SelfRef => self.writer.write("self"),
            NodeKind::Array { elements } => {
                let text = self.node_text(node);
                if text.starts_with('%') {
                    self.writer.write(text);
                } else {
                    self.writer.write("[");
                    self.emit_comma_list(elements);
                    self.writer.write("]");
                }
            }
            NodeKind::Hash { entries, braces } => self.emit_hash(entries, *braces),
            NodeKind::Range {
                start,
                end: range_end,
                exclusive,
            } => {
                if start.is_some() {
                    self.emit_expression(*start);
                }
                self.writer.write(if *exclusive { "..." } else { ".." });
                if range_end.is_some() {
                    self.emit_expression(*range_end);
                }
            }

            // Names
            NodeKind::Identifier { name }
            | NodeKind::InstanceVar { name }
            | NodeKind::ClassVar { name }
            | NodeKind::GlobalVar { name } => self.writer.write(name),
            NodeKind::Constant {
                scope,
                name,
                top_level,
            } => {
                if scope.is_some() {
                    self.emit_expression(*scope);
                    self.writer.write("::");
                } else if *top_level {
                    self.writer.write("::");
                }
                self.writer.write(name);
            }

            // Calls
            NodeKind::Call(call) => self.emit_call(call),
            NodeKind::Index { receiver, args } => {
                self.emit_expression(*receiver);
                self.writer.write("[");
                self.emit_comma_list(args);
                self.writer.write("]");
            }
            NodeKind::Super {
                args,
                has_parens,
                block,
            } => {
                self.writer.write("super");
                let args = self.with_block_pass(args, *block);
                self.emit_arguments(&args, *has_parens);
                self.emit_attached_block(*block);
            }
            NodeKind::Block { params, body, brace } => self.emit_block(node, params, body, *brace),
            NodeKind::BlockPass { value } => {
                self.writer.write("&");
                if value.is_some() {
                    self.emit_expression(*value);
                }
            }
            NodeKind::Lambda {
                params,
                has_parens,
                body,
                brace,
            } => self.emit_lambda(node, params, *has_parens, body, *brace),

            // Operators
            NodeKind::Binary { op, left, right } => {
                self.emit_expression(*left);
                self.writer.write_space();
                self.writer.write(op.as_str());
                self.writer.write_space();
                self.emit_expression(*right);
            }
            NodeKind::Unary { op, operand } => {
                self.writer.write(op.as_str());
                self.emit_expression(*operand);
            }
            NodeKind::Paren { statements } => {
                self.writer.write("(");
                self.emit_inline_statements(statements);
                self.writer.write(")");
            }
            NodeKind::Splat { value } => {
                self.writer.write("*");
                self.emit_expression(*value);
            }
            NodeKind::DoubleSplat { value } => {
                self.writer.write("**");
                self.emit_expression(*value);
            }
        }
    }

    pub(crate) fn emit_comma_list(&mut self, nodes: &[NodeIndex]) {
        for (i, &node) in nodes.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            self.emit_expression(node);
        }
    }

    /// `(a, b)`, ` a, b` or nothing.
    pub(crate) fn emit_arguments(&mut self, args: &[NodeIndex], has_parens: bool) {
        if has_parens {
            self.writer.write("(");
            self.emit_comma_list(args);
            self.writer.write(")");
        } else if !args.is_empty() {
            self.writer.write_space();
            self.emit_comma_list(args);
        }
    }

    fn emit_call(&mut self, call: &CallData) {
        if call.receiver.is_some() {
            self.emit_expression(call.receiver);
            self.writer.write(if call.safe_nav { "&." } else { "." });
        }
        self.writer.write(&call.method);
        let args = self.with_block_pass(&call.args, call.block);
        self.emit_arguments(&args, call.has_parens);
        self.emit_attached_block(call.block);
    }

    /// A `&blk` argument is stored as the call's block but printed last in
    /// the argument list.
    fn with_block_pass(&self, args: &[NodeIndex], block: NodeIndex) -> Vec<NodeIndex> {
        let mut all = args.to_vec();
        if matches!(self.arena.kind(block), Some(NodeKind::BlockPass { .. })) {
            all.push(block);
        }
        all
    }

    fn emit_attached_block(&mut self, block: NodeIndex) {
        if matches!(self.arena.kind(block), Some(NodeKind::Block { .. })) {
            self.writer.write_space();
            self.emit_expression(block);
        }
    }

    fn emit_block(&mut self, node: NodeIndex, params: &[Param], body: &[NodeIndex], brace: bool) {
        let end = self.arena.span(node).1;
        if brace && self.is_single_line(node) {
            self.writer.write("{");
            self.emit_block_params(params);
            if !body.is_empty() {
                self.writer.write_space();
                self.emit_inline_statements(body);
            }
            self.writer.write(" }");
            return;
        }
        self.writer.write(if brace { "{" } else { "do" });
        self.emit_block_params(params);
        self.emit_body(body, end);
        self.writer.write(if brace { "}" } else { "end" });
    }

    fn emit_block_params(&mut self, params: &[Param]) {
        if params.is_empty() {
            return;
        }
        self.writer.write(" |");
        self.emit_parameters(params);
        self.writer.write("|");
    }

    fn emit_lambda(&mut self, node: NodeIndex, params: &[Param], has_parens: bool, body: &[NodeIndex], brace: bool) {
        let end = self.arena.span(node).1;
        self.writer.write("->");
        if has_parens || !params.is_empty() {
            self.writer.write("(");
            self.emit_parameters(params);
            self.writer.write(")");
        }
        if brace && self.is_single_line(node) {
            self.writer.write(" {");
            if !body.is_empty() {
                self.writer.write_space();
                self.emit_inline_statements(body);
            }
            self.writer.write(" }");
            return;
        }
        self.writer.write(if brace { " {" } else { " do" });
        self.emit_body(body, end);
        self.writer.write(if brace { "}" } else { "end" });
    }

    fn emit_hash(&mut self, entries: &[HashEntry], braces: bool) {
        if entries.is_empty() {
            self.writer.write("{}");
            return;
        }
        if braces {
            self.writer.write("{ ");
        }
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            match &entry.key {
                HashKey::Label(name) => {
                    self.writer.write(name);
                    self.writer.write(": ");
                    self.emit_expression(entry.value);
                }
                HashKey::Shorthand(name) => {
                    self.writer.write(name);
                    self.writer.write(":");
                    if !self.target.supports_hash_shorthand() {
                        trace!(key = %name, "expanding hash shorthand");
                        self.writer.write_space();
                        self.writer.write(name);
                    }
                }
                HashKey::Expr(key) => {
                    self.emit_expression(*key);
                    self.writer.write(" => ");
                    self.emit_expression(entry.value);
                }
                HashKey::DoubleSplat => {
                    self.writer.write("**");
                    self.emit_expression(entry.value);
                }
            }
        }
        if braces {
            self.writer.write(" }");
        }
    }
}
