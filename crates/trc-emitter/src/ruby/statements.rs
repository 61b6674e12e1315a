//! Declarations and control flow.

use trc_common::options::RubyVersion;
use trc_parser::{
    AttrItem, AttrKind, IfForm, MethodDecl, NodeArena, NodeIndex, NodeKind, Param, ParamKind, RescueClause,
    TypeExpr, TypeExprKind, WhenClause,
};
use tracing::trace;

use super::RubyPrinter;

/// Ivar declarations with initializers in a class body. Ruby runs a class
/// body once, on the class object, so the assignments move into the
/// instance constructor.
#[derive(Debug, Default)]
pub(crate) struct IvarPrologue {
    pub(crate) initializers: Vec<NodeIndex>,
    /// The declaration printed as a new `initialize`, when the class has none.
    pub(crate) constructor_at: Option<NodeIndex>,
    /// The class has a superclass whose constructor must still run.
    pub(crate) inherits: bool,
}

impl IvarPrologue {
    pub(crate) fn collect(arena: &NodeArena, body: &[NodeIndex], inherits: bool) -> Self {
        let mut initializers = Vec::new();
        let mut has_initialize = false;
        for &node in body {
            match arena.kind(node) {
                Some(NodeKind::IvarDecl { value, .. }) if value.is_some() => initializers.push(node),
                Some(NodeKind::Method(decl)) if decl.name == "initialize" && !decl.singleton && !decl.signature_only => {
                    has_initialize = true;
                }
                _ => {}
            }
        }
        let constructor_at = if has_initialize {
            None
        } else {
            initializers.first().copied()
        };
        IvarPrologue {
            initializers,
            constructor_at,
            inherits,
        }
    }

    /// Whether `node` is printed elsewhere rather than where it stands.
    pub(crate) fn moves(&self, node: NodeIndex) -> bool {
        self.initializers.contains(&node) && self.constructor_at != Some(node)
    }
}

impl<'a> RubyPrinter<'a> {
    /// A statement in a statement list. Only `case/in` lowering cares about
    /// the difference from an expression.
    pub(crate) fn emit_statement(&mut self, node: NodeIndex) {
        match self.arena.kind(node) {
            Some(NodeKind::CaseIn {
                subject,
                clauses,
                else_branch,
            }) if !self.native_pattern_matching => {
                let end = self.arena.span(node).1;
                self.emit_lowered_case_in(*subject, clauses, else_branch.as_deref(), end, true);
            }
            _ => self.emit_expression(node),
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    pub(crate) fn emit_class(&mut self, name: &str, superclass: Option<&TypeExpr>, body: &[NodeIndex], end: u32) {
        self.writer.write("class ");
        self.writer.write(name);
        if let Some(superclass) = superclass {
            self.writer.write(" < ");
            self.emit_erased_type_name(superclass);
        }
        let prologue = IvarPrologue::collect(self.arena, body, superclass.is_some());
        self.ivar_prologues.push(prologue);
        self.emit_body(body, end);
        self.ivar_prologues.pop();
        self.writer.write("end");
    }

    pub(crate) fn emit_module(&mut self, name: &str, body: &[NodeIndex], end: u32) {
        self.writer.write("module ");
        self.writer.write(name);
        self.ivar_prologues.push(IvarPrologue::default());
        self.emit_body(body, end);
        self.ivar_prologues.pop();
        self.writer.write("end");
    }

    /// Whether `decl` is the constructor that runs the enclosing class's
    /// ivar initializers.
    fn takes_ivar_prologue(&self, decl: &MethodDecl) -> bool {
        decl.name == "initialize"
            && !decl.singleton
            && self
                .ivar_prologues
                .last()
                .is_some_and(|prologue| !prologue.initializers.is_empty())
    }

    /// `@x = v` for every class-body ivar initializer, one per line.
    fn emit_ivar_initializers(&mut self) {
        let Some(prologue) = self.ivar_prologues.last() else {
            return;
        };
        let initializers = prologue.initializers.clone();
        for decl in initializers {
            if let Some(NodeKind::IvarDecl { name, value, .. }) = self.arena.kind(decl) {
                self.writer.ensure_line();
                self.writer.write(name);
                self.writer.write(" = ");
                self.emit_expression(*value);
                self.writer.ensure_line();
            }
        }
    }

    /// A class with ivar initializers but no `initialize` gets one that
    /// forwards to the superclass first.
    pub(crate) fn emit_synthesized_initialize(&mut self) {
        let inherits = self.ivar_prologues.last().is_some_and(|prologue| prologue.inherits);
        trace!("synthesizing initialize for ivar initializers");
        self.writer.write("def initialize");
        if inherits {
            if self.target >= RubyVersion::V3_0 {
                self.writer.write("(*args, **kwargs, &block)");
            } else {
                self.writer.write("(*args, &block)");
            }
        }
        self.writer.ensure_line();
        self.writer.increase_indent();
        if inherits {
            self.writer.write("super");
            self.writer.ensure_line();
        }
        self.emit_ivar_initializers();
        self.writer.decrease_indent();
        self.writer.ensure_line();
        self.writer.write("end");
    }

    /// `Base<T>` in a superclass position is just `Base` at runtime.
    fn emit_erased_type_name(&mut self, ty: &TypeExpr) {
        match &ty.kind {
            TypeExprKind::Name { name, .. } => self.writer.write(name),
            _ => self.writer.write(self.file.slice(ty.pos, ty.end)),
        }
    }

    pub(crate) fn emit_method(&mut self, decl: &MethodDecl, end: u32) {
        self.writer.write("def ");
        if decl.singleton {
            self.writer.write("self.");
        }
        self.writer.write(&decl.name);
        if decl.has_parens || !decl.params.is_empty() {
            self.writer.write("(");
            self.emit_parameters(&decl.params);
            self.writer.write(")");
        }

        if self.takes_ivar_prologue(decl) {
            self.writer.ensure_line();
            self.writer.increase_indent();
            self.emit_ivar_initializers();
            self.writer.decrease_indent();
            self.emit_body(&decl.body, end);
            self.writer.write("end");
            return;
        }

        if decl.endless {
            let Some(&expression) = decl.body.first() else {
                self.writer.write("; end");
                return;
            };
            if self.target.supports_endless_methods() {
                self.writer.write(" = ");
                self.emit_expression(expression);
                return;
            }
            trace!(method = %decl.name, "lowering endless method");
            self.emit_body(&decl.body, end);
            self.writer.write("end");
            return;
        }

        self.emit_body(&decl.body, end);
        self.writer.write("end");
    }

    /// Parameter list without types, for `def`, blocks and lambdas.
    pub(crate) fn emit_parameters(&mut self, params: &[Param]) {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            match param.kind {
                ParamKind::Positional => {
                    self.writer.write(&param.name);
                    if param.default.is_some() {
                        self.writer.write(" = ");
                        self.emit_expression(param.default);
                    }
                }
                ParamKind::Rest => {
                    self.writer.write("*");
                    self.writer.write(&param.name);
                }
                ParamKind::KeywordRest => {
                    self.writer.write("**");
                    self.writer.write(&param.name);
                }
                ParamKind::Block => {
                    self.writer.write("&");
                    self.writer.write(&param.name);
                }
                ParamKind::Keyword => {
                    self.writer.write(&param.name);
                    self.writer.write(":");
                    if param.default.is_some() {
                        self.writer.write_space();
                        self.emit_expression(param.default);
                    }
                }
            }
        }
    }

    pub(crate) fn emit_attr(&mut self, kind: AttrKind, items: &[AttrItem]) {
        self.writer.write(kind.keyword());
        for (i, item) in items.iter().enumerate() {
            self.writer.write(if i == 0 { " :" } else { ", :" });
            self.writer.write(&item.name);
        }
    }

    // =========================================================================
    // Control flow
    // =========================================================================

    pub(crate) fn emit_if(
        &mut self,
        node: NodeIndex,
        condition: NodeIndex,
        then_branch: &[NodeIndex],
        else_branch: &[NodeIndex],
        form: IfForm,
    ) {
        match form {
            IfForm::Modifier | IfForm::UnlessModifier => {
                self.emit_inline_statements(then_branch);
                self.writer
                    .write(if form == IfForm::Modifier { " if " } else { " unless " });
                self.emit_expression(condition);
            }
            IfForm::Ternary => {
                self.emit_expression(condition);
                self.writer.write(" ? ");
                self.emit_inline_statements(then_branch);
                self.writer.write(" : ");
                self.emit_inline_statements(else_branch);
            }
            IfForm::If | IfForm::Unless | IfForm::Elsif => {
                self.writer
                    .write(if form == IfForm::Unless { "unless " } else { "if " });
                self.emit_expression(condition);
                let end = self.arena.span(node).1;
                self.emit_if_tail(then_branch, else_branch, end);
                self.writer.write("end");
            }
        }
    }

    fn emit_if_tail(&mut self, then_branch: &[NodeIndex], else_branch: &[NodeIndex], end: u32) {
        let else_pos = else_branch.first().map_or(end, |&e| self.arena.span(e).0);
        self.emit_body(then_branch, else_pos);

        if let [single] = else_branch
            && let Some(NodeKind::If {
                condition,
                then_branch,
                else_branch,
                form: IfForm::Elsif,
            }) = self.arena.kind(*single)
        {
            self.writer.write("elsif ");
            self.emit_expression(*condition);
            self.emit_if_tail(then_branch, else_branch, end);
            return;
        }
        if !else_branch.is_empty() {
            self.writer.write("else");
            self.emit_body(else_branch, end);
        }
    }

    pub(crate) fn emit_while(&mut self, node: NodeIndex, condition: NodeIndex, body: &[NodeIndex], until: bool, modifier: bool) {
        let keyword = if until { "until" } else { "while" };
        if modifier {
            self.emit_inline_statements(body);
            self.writer.write_space();
            self.writer.write(keyword);
            self.writer.write_space();
            self.emit_expression(condition);
            return;
        }
        self.writer.write(keyword);
        self.writer.write_space();
        self.emit_expression(condition);
        self.emit_body(body, self.arena.span(node).1);
        self.writer.write("end");
    }

    pub(crate) fn emit_case(
        &mut self,
        node: NodeIndex,
        subject: NodeIndex,
        whens: &[WhenClause],
        else_branch: Option<&[NodeIndex]>,
    ) {
        let end = self.arena.span(node).1;
        self.writer.write("case");
        if subject.is_some() {
            self.writer.write_space();
            self.emit_expression(subject);
        }
        self.writer.ensure_line();
        for (i, when) in whens.iter().enumerate() {
            let next = whens
                .get(i + 1)
                .map(|w| w.pos)
                .or_else(|| else_branch.and_then(|b| b.first()).map(|&e| self.arena.span(e).0))
                .unwrap_or(end);
            self.writer.write("when ");
            self.emit_comma_list(&when.values);
            self.emit_body(&when.body, next);
        }
        if let Some(else_branch) = else_branch {
            self.writer.write("else");
            self.emit_body(else_branch, end);
        }
        self.writer.write("end");
    }

    pub(crate) fn emit_begin(
        &mut self,
        node: NodeIndex,
        body: &[NodeIndex],
        rescues: &[RescueClause],
        else_branch: Option<&[NodeIndex]>,
        ensure: Option<&[NodeIndex]>,
        implicit: bool,
    ) {
        let end = self.arena.span(node).1;
        if implicit {
            // Already inside the owning body's indentation.
            self.emit_statements(body);
            self.writer.decrease_indent();
            self.emit_rescue_tail(rescues, else_branch, ensure, end);
            self.writer.increase_indent();
            return;
        }
        if self.is_rescue_modifier(node, rescues, else_branch, ensure) {
            self.emit_inline_statements(body);
            self.writer.write(" rescue ");
            self.emit_inline_statements(&rescues[0].body);
            return;
        }
        self.writer.write("begin");
        let body_end = rescues.first().map_or(end, |r| r.pos);
        self.emit_body(body, body_end);
        self.emit_rescue_tail(rescues, else_branch, ensure, end);
        self.writer.write("end");
    }

    /// `stmt rescue value` parses as a `Begin` that does not start with the
    /// `begin` keyword.
    fn is_rescue_modifier(
        &self,
        node: NodeIndex,
        rescues: &[RescueClause],
        else_branch: Option<&[NodeIndex]>,
        ensure: Option<&[NodeIndex]>,
    ) -> bool {
        rescues.len() == 1
            && rescues[0].classes.is_empty()
            && rescues[0].binding.is_none()
            && else_branch.is_none()
            && ensure.is_none()
            && !self.node_text(node).starts_with("begin")
    }

    fn emit_rescue_tail(
        &mut self,
        rescues: &[RescueClause],
        else_branch: Option<&[NodeIndex]>,
        ensure: Option<&[NodeIndex]>,
        end: u32,
    ) {
        for (i, rescue) in rescues.iter().enumerate() {
            self.writer.ensure_line();
            self.writer.write("rescue");
            if !rescue.classes.is_empty() {
                self.writer.write_space();
                self.emit_comma_list(&rescue.classes);
            }
            if let Some(binding) = &rescue.binding {
                self.writer.write(" => ");
                self.writer.write(binding);
            }
            let next = rescues.get(i + 1).map_or(end, |r| r.pos);
            self.emit_body(&rescue.body, next);
        }
        if let Some(else_branch) = else_branch {
            self.writer.write("else");
            self.emit_body(else_branch, end);
        }
        if let Some(ensure) = ensure {
            self.writer.write("ensure");
            self.emit_body(ensure, end);
        }
    }

    /// `return`, `break` and `next`.
    pub(crate) fn emit_jump(&mut self, keyword: &str, value: NodeIndex) {
        self.writer.write(keyword);
        if value.is_some() {
            self.writer.write_space();
            self.emit_expression(value);
        }
    }

    pub(crate) fn emit_yield(&mut self, args: &[NodeIndex], has_parens: bool) {
        self.writer.write("yield");
        self.emit_arguments(args, has_parens);
    }
}
