//! Checker state.
//!
//! `impl CheckerState` is split across files:
//! - `state.rs`: construction, shared helpers, the per-file entry point
//! - `statements.rs`: declarations and statements
//! - `expressions.rs`: literals, names and operators
//! - `calls.rs`: method calls, blocks and constructors
//! - `patterns.rs`: `case/in` patterns
//! - `flow.rs`: narrowing facts
//! - `infer.rs`: return-type and type-argument inference
//! - `error_reporter.rs`: diagnostics

use trc_binder::{DeclarationTable, FileId, ResolveError, ScopeKind, Symbol, SymbolId, TypeScope, constant_path};
use trc_common::diagnostics::Diagnostic;
use trc_common::interner::Atom;
use trc_common::options::CompilationContext;
use trc_parser::{NodeIndex, NodeKind, ParsedFile, TypeExpr};
use trc_solver::{TypeId, contains_nil, format_type, is_assignable_to};
use tracing::{debug, info_span};

use crate::context::{CheckerContext, Frame, FrameKind, TypeCache};

/// Outcome of checking one file.
#[derive(Clone, Debug, Default)]
pub struct CheckResult {
    pub types: TypeCache,
    /// Located diagnostics, at most `max_errors` of them errors.
    pub diagnostics: Vec<Diagnostic>,
    /// Every error found, including those past the reporting limit.
    pub error_count: usize,
}

pub struct CheckerState<'a> {
    pub ctx: CheckerContext<'a>,
}

impl<'a> CheckerState<'a> {
    pub fn new(
        table: &'a DeclarationTable,
        file_id: FileId,
        file: &'a ParsedFile,
        options: &'a CompilationContext,
    ) -> Self {
        CheckerState {
            ctx: CheckerContext::new(table, file_id, file, options, true),
        }
    }

    /// A checker whose diagnostics are discarded, for inferring types in
    /// code that is checked for real elsewhere.
    pub(crate) fn speculative(
        table: &'a DeclarationTable,
        file_id: FileId,
        file: &'a ParsedFile,
        options: &'a CompilationContext,
    ) -> Self {
        CheckerState {
            ctx: CheckerContext::new(table, file_id, file, options, false),
        }
    }

    pub fn finish(self) -> CheckResult {
        let error_count = self.ctx.reporter.error_count();
        CheckResult {
            types: self.ctx.types,
            diagnostics: self.ctx.reporter.into_diagnostics(),
            error_count,
        }
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub(crate) fn format_type(&self, ty: TypeId) -> String {
        format_type(self.ctx.interner, ty)
    }

    /// The gradual relation: `Any` both ways, `nil` anywhere unless
    /// `strict_nil` is on.
    pub(crate) fn is_assignable(&self, source: TypeId, target: TypeId) -> bool {
        is_assignable_to(self.ctx.interner, self.ctx.table, source, target, self.ctx.strict_nil)
    }

    /// Whether `value`, of type `source`, may flow into a `target` slot.
    /// An unguarded indexed access keeps its `nil` even without `strict_nil`.
    pub(crate) fn fits(&self, value: NodeIndex, source: TypeId, target: TypeId) -> bool {
        if self.is_unchecked_index(value) && contains_nil(self.ctx.interner, source) {
            return is_assignable_to(self.ctx.interner, self.ctx.table, source, target, true);
        }
        self.is_assignable(source, target)
    }

    pub(crate) fn atom(&self, name: &str) -> Atom {
        self.ctx.interner.intern_string(name)
    }

    pub(crate) fn object_type(&self) -> TypeId {
        self.ctx.interner.instance_named("Object", Vec::new())
    }

    pub(crate) fn record_type(&mut self, node: NodeIndex, ty: TypeId) -> TypeId {
        self.ctx.types.node_types.insert(node, ty);
        ty
    }

    pub(crate) fn is_unchecked_index(&self, node: NodeIndex) -> bool {
        let node = self.skip_parens(node);
        self.ctx.unchecked_index_nodes.contains(&node)
    }

    pub(crate) fn skip_parens(&self, mut node: NodeIndex) -> NodeIndex {
        while let Some(NodeKind::Paren { statements }) = self.ctx.file.arena.kind(node) {
            match statements.as_slice() {
                [inner] => node = *inner,
                _ => break,
            }
        }
        node
    }

    /// Resolve an annotation written in a body (typed locals, block and
    /// lambda parameters). Failures are reported and give `Any`.
    pub(crate) fn resolve_annotation(&mut self, expr: &TypeExpr) -> TypeId {
        let type_params = self.visible_type_params();
        let namespace = self.ctx.namespace.clone();
        let scope = TypeScope::new(&type_params, &namespace);
        match self.ctx.table.resolve_type_expr(expr, &scope) {
            Ok(ty) => ty,
            Err(error) => {
                self.report_resolve_error(&error);
                TypeId::ANY
            }
        }
    }

    fn report_resolve_error(&mut self, error: &ResolveError) {
        let diagnostic = error.to_diagnostic(self.ctx.reporter.file_name(), &self.ctx.file.line_map);
        self.push_diagnostic(diagnostic);
    }

    fn visible_type_params(&self) -> Vec<Atom> {
        let mut params = self.ctx.class_type_params.clone();
        if let Some(frame) = self.ctx.frames.iter().rev().find(|f| f.kind == FrameKind::Method) {
            for &param in &frame.type_params {
                if !params.contains(&param) {
                    params.push(param);
                }
            }
        }
        params
    }

    /// Instance type of the class a constant expression names, with `Any`
    /// for its type arguments.
    pub(crate) fn class_instance_for_constant(&self, node: NodeIndex) -> Option<TypeId> {
        let path = constant_path(&self.ctx.file.arena, node)?;
        let class = self.ctx.table.lookup_constant(&path, &self.ctx.namespace)?.ok()?;
        let arity = self.ctx.table.class(class).map_or(0, |info| info.type_params.len());
        Some(self.ctx.interner.instance(class, vec![TypeId::ANY; arity]))
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub(crate) fn push_scope(&mut self, kind: ScopeKind, self_type: TypeId) {
        self.ctx.scopes.push(kind, self_type);
    }

    /// Close a scope, warning about locals that were never read.
    pub(crate) fn pop_scope(&mut self) {
        let Some(scope) = self.ctx.scopes.pop() else {
            return;
        };
        let mut unused = Vec::new();
        for id in scope.symbols() {
            if let Some(symbol) = self.ctx.scopes.get(id)
                && !symbol.read
                && !symbol.name.starts_with('_')
            {
                unused.push((symbol.name.clone(), symbol.pos, symbol.end));
            }
        }
        for (name, pos, end) in unused {
            self.report_check(
                trc_common::options::CheckName::NoUnusedVars,
                pos,
                end,
                trc_common::diagnostics::diagnostic_codes::UNUSED_VARIABLE,
                &[&name],
            );
        }
    }

    pub(crate) fn declare_local(
        &mut self,
        name: &str,
        declared: Option<TypeId>,
        ty: TypeId,
        span: (u32, u32),
        is_param: bool,
    ) -> SymbolId {
        self.ctx.scopes.declare(Symbol {
            name: name.to_string(),
            declared,
            ty,
            pos: span.0,
            end: span.1,
            is_param,
            read: false,
        })
    }

    pub(crate) fn self_type(&self) -> TypeId {
        self.ctx.scopes.self_type()
    }

    pub(crate) fn push_frame(&mut self, frame: Frame) {
        self.ctx.frames.push(frame);
    }

    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        self.ctx.frames.pop()
    }

    /// The frame a `return` leaves: the innermost method or lambda.
    pub(crate) fn return_frame(&mut self) -> Option<&mut Frame> {
        self.ctx
            .frames
            .iter_mut()
            .rev()
            .find(|f| matches!(f.kind, FrameKind::Method | FrameKind::Lambda))
    }

    /// The frame a `next` leaves: the innermost block or lambda, else the
    /// method.
    pub(crate) fn next_frame(&mut self) -> Option<&mut Frame> {
        self.ctx.frames.last_mut()
    }

    pub(crate) fn method_frame(&self) -> Option<&Frame> {
        self.ctx.frames.iter().rev().find(|f| f.kind == FrameKind::Method)
    }

    // =========================================================================
    // Entry point
    // =========================================================================

    pub fn check_source_file(&mut self) {
        let file = self.ctx.file;
        let _span = info_span!("check_file", file = %file.file_name).entered();
        let object = self.object_type();
        self.push_scope(ScopeKind::TopLevel, object);
        self.check_statements(file.statements());
        self.pop_scope();
        debug!(
            nodes = self.ctx.types.node_types.len(),
            errors = self.ctx.reporter.error_count(),
            "file checked"
        );
    }
}

/// Check one bound file.
pub fn check_file(table: &DeclarationTable, file_id: FileId, options: &CompilationContext) -> CheckResult {
    let Some(file) = table.file(file_id) else {
        return CheckResult::default();
    };
    let mut state = CheckerState::new(table, file_id, file, options);
    state.check_source_file();
    state.finish()
}
